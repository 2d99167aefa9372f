mod connect;
mod create_stream;
mod publish;
mod play;
mod delete_stream;

use std::collections::HashMap;
use std::sync::Arc;
use crate::Result;
use crate::connection::Session;
use crate::protocol::RtmpCommand;

pub use connect::ConnectHandler;
pub use create_stream::CreateStreamHandler;
pub use publish::PublishHandler;
pub use play::PlayHandler;
pub use delete_stream::{DeleteStreamHandler, IgnoredCommandHandler};

#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Get command name this handler processes
    fn command_name(&self) -> &str;

    /// Handle the command, sending any replies through the session
    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()>;
}

/// Command handler registry
pub struct CommandHandlerRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl Default for CommandHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandlerRegistry {
    pub fn new() -> Self {
        let mut registry = CommandHandlerRegistry {
            handlers: HashMap::new(),
        };

        registry.register(Arc::new(ConnectHandler));
        registry.register(Arc::new(CreateStreamHandler));
        registry.register(Arc::new(PublishHandler));
        registry.register(Arc::new(PlayHandler));
        registry.register(Arc::new(DeleteStreamHandler::new("deleteStream")));
        registry.register(Arc::new(DeleteStreamHandler::new("closeStream")));
        for name in ["releaseStream", "FCPublish", "FCUnpublish", "_result", "_error"] {
            registry.register(Arc::new(IgnoredCommandHandler::new(name)));
        }

        registry
    }

    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(handler.command_name().to_string(), handler);
    }

    /// Run the handler for `command`. Unknown commands are not an error.
    pub async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        match self.handlers.get(&command.name) {
            Some(handler) => handler.handle(command, session).await,
            None => {
                log::debug!("Session {}: ignoring unknown command '{}'", session.id(), command.name);
                Ok(())
            }
        }
    }
}

/// Strip a query string (`cam?token=..`) and surrounding slashes from an
/// app or stream name.
pub(crate) fn clean_name(raw: &str) -> &str {
    raw.split('?').next().unwrap_or_default().trim_matches('/')
}
