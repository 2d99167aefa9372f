use crate::connection::{Session, SessionState};
use crate::handlers::{clean_name, CommandHandler};
use crate::protocol::control::{self, UserControlEvent};
use crate::{Error, Result, RtmpCommand, MEDIA_STREAM_ID};

pub struct PublishHandler;

#[async_trait::async_trait]
impl CommandHandler for PublishHandler {
    fn command_name(&self) -> &str {
        "publish"
    }

    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        if !session.state().can_start_stream() {
            return Err(Error::invalid_state(format!("publish in state {:?}", session.state())));
        }

        let stream_name = command.stream_name()
            .map(clean_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::protocol("publish without stream name"))?
            .to_string();
        let publish_type = command.arguments.get(1)
            .and_then(|v| v.as_str())
            .unwrap_or("live");

        let app_name = session.app().unwrap_or_default().to_string();
        let Some(app) = session.registry().app(&app_name) else {
            log::warn!("Session {}: publish to unknown app '{}'", session.id(), app_name);
            return Ok(());
        };

        log::info!(
            "Session {}: publishing {}/{} ({})",
            session.id(),
            app_name,
            stream_name,
            publish_type
        );
        let room = app.get_or_create(&stream_name).await;
        session.attach_publisher(room).await;

        session.send(control::user_control(UserControlEvent::StreamBegin(MEDIA_STREAM_ID))).await?;
        let status = RtmpCommand::on_status(
            "NetStream.Publish.Start",
            &format!("{} is now published.", stream_name),
        );
        session.send_command(status, MEDIA_STREAM_ID).await?;

        session.set_state(SessionState::Publishing);
        Ok(())
    }
}
