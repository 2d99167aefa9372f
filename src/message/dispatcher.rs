use crate::connection::Session;
use crate::flv::FlvTag;
use crate::handlers::CommandHandlerRegistry;
use crate::message::Message;
use crate::protocol::control::{self, UserControlEvent};
use crate::protocol::RtmpPacket;
use crate::Result;

/// Classifies reassembled messages and applies them to a session.
pub struct MessageDispatcher {
    commands: CommandHandlerRegistry,
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDispatcher {
    pub fn new() -> Self {
        MessageDispatcher {
            commands: CommandHandlerRegistry::new(),
        }
    }

    pub fn with_commands(commands: CommandHandlerRegistry) -> Self {
        MessageDispatcher { commands }
    }

    pub async fn dispatch(&self, session: &mut Session, packet: RtmpPacket) -> Result<()> {
        let message = Message::parse(&packet)?;
        self.apply(session, message).await
    }

    async fn apply(&self, session: &mut Session, message: Message) -> Result<()> {
        match message {
            Message::SetChunkSize(size) => {
                session.chunk_reader().set_chunk_size(size)?;
                log::debug!("Session {}: peer chunk size {}", session.id(), size);
            }
            Message::Abort(cs_id) => session.chunk_reader().abort(cs_id),
            Message::Acknowledgement(sequence) => {
                log::debug!("Session {}: acknowledgement {}", session.id(), sequence);
            }
            Message::WindowAckSize(size) => {
                log::debug!("Session {}: peer window ack size {}", session.id(), size);
            }
            Message::SetPeerBandwidth { size, limit } => {
                log::debug!("Session {}: peer bandwidth {} {:?}", session.id(), size, limit);
            }
            Message::UserControl(UserControlEvent::PingRequest(timestamp)) => {
                session.send(control::user_control(UserControlEvent::PingResponse(timestamp))).await?;
            }
            Message::UserControl(event) => {
                log::debug!("Session {}: user control {:?}", session.id(), event);
            }
            Message::Media(tag) => self.ingest(session, tag).await,
            Message::Data { timestamp, data } => match data.into_metadata() {
                Some(metadata) => {
                    let tag = FlvTag::script(timestamp, metadata.encode()?.into());
                    self.ingest(session, tag).await;
                }
                None => log::debug!("Session {}: ignoring data message", session.id()),
            },
            Message::Command(command) => self.commands.handle(command, session).await?,
            Message::Unsupported(message_type) => {
                log::debug!("Session {}: ignoring message type {}", session.id(), message_type);
            }
        }
        Ok(())
    }

    async fn ingest(&self, session: &Session, tag: FlvTag) {
        match session.publishing_room() {
            Some(room) => room.ingest(session.id(), tag).await,
            None => log::debug!("Session {}: {:?} tag outside publish", session.id(), tag.kind),
        }
    }
}
