use crate::amf::Amf0Value;
use crate::connection::{Session, SessionState};
use crate::handlers::CommandHandler;
use crate::{Error, Result, RtmpCommand, MEDIA_STREAM_ID};

/// Answers createStream with the single media stream id every session uses
pub struct CreateStreamHandler;

#[async_trait::async_trait]
impl CommandHandler for CreateStreamHandler {
    fn command_name(&self) -> &str {
        "createStream"
    }

    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        if !session.state().can_create_stream() {
            return Err(Error::invalid_state(format!("createStream in state {:?}", session.state())));
        }

        let response = RtmpCommand::result(
            command.transaction_id,
            Amf0Value::Null,
            Amf0Value::Number(MEDIA_STREAM_ID as f64),
        );
        session.send_command(response, 0).await?;
        session.set_state(SessionState::StreamCreated);
        Ok(())
    }
}
