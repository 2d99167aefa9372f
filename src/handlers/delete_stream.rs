use crate::connection::{Session, SessionState};
use crate::handlers::CommandHandler;
use crate::{Result, RtmpCommand};

/// deleteStream / closeStream: leave the room and fall back to a created
/// stream. No reply is sent.
pub struct DeleteStreamHandler {
    name: &'static str,
}

impl DeleteStreamHandler {
    pub fn new(name: &'static str) -> Self {
        DeleteStreamHandler { name }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DeleteStreamHandler {
    fn command_name(&self) -> &str {
        self.name
    }

    async fn handle(&self, _command: RtmpCommand, session: &mut Session) -> Result<()> {
        session.detach().await;
        if session.state().has_stream() {
            session.set_state(SessionState::StreamCreated);
        }
        Ok(())
    }
}

/// Commands accepted without a reply or any state change
pub struct IgnoredCommandHandler {
    name: &'static str,
}

impl IgnoredCommandHandler {
    pub fn new(name: &'static str) -> Self {
        IgnoredCommandHandler { name }
    }
}

#[async_trait::async_trait]
impl CommandHandler for IgnoredCommandHandler {
    fn command_name(&self) -> &str {
        self.name
    }

    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        log::debug!(
            "Session {}: {} {:?} accepted",
            session.id(),
            command.name,
            command.stream_name()
        );
        Ok(())
    }
}
