use crate::chunk::ChunkReader;
use crate::connection::SessionState;
use crate::protocol::{RtmpCommand, RtmpPacket};
use crate::server::{Registry, ServerConfig};
use crate::stream::Room;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// What the session is doing with a room
pub enum Attachment {
    Publisher(Arc<Room>),
    Player { room: Arc<Room>, pump: JoinHandle<()> },
}

/// Per-connection state driven by the read loop.
pub struct Session {
    id: String,
    state: SessionState,

    /// Application named in connect
    app: Option<String>,
    tc_url: Option<Url>,

    registry: Arc<Registry>,
    config: Arc<ServerConfig>,

    /// Inbound chunk state, updated by the peer's SetChunkSize and Abort
    chunk_reader: ChunkReader,

    /// Outgoing packets, consumed by the connection's writer task
    packet_sender: mpsc::Sender<RtmpPacket>,

    attachment: Option<Attachment>,
}

impl Session {
    pub fn new(
        registry: Arc<Registry>,
        config: Arc<ServerConfig>,
        packet_sender: mpsc::Sender<RtmpPacket>,
    ) -> Self {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Initial,
            app: None,
            tc_url: None,
            registry,
            config,
            chunk_reader: ChunkReader::new(),
            packet_sender,
            attachment: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        log::debug!("Session {}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    pub fn tc_url(&self) -> Option<&Url> {
        self.tc_url.as_ref()
    }

    pub fn set_app(&mut self, app: impl Into<String>, tc_url: Option<Url>) {
        self.app = Some(app.into());
        self.tc_url = tc_url;
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn chunk_reader(&mut self) -> &mut ChunkReader {
        &mut self.chunk_reader
    }

    /// Handle for tasks that write to this connection
    pub fn sender(&self) -> mpsc::Sender<RtmpPacket> {
        self.packet_sender.clone()
    }

    /// Queue a packet for the writer task. Fails once the writer is gone.
    pub async fn send(&self, packet: RtmpPacket) -> Result<()> {
        self.packet_sender.send(packet).await
            .map_err(|_| Error::connection("Outbound queue closed"))
    }

    pub async fn send_command(&self, command: RtmpCommand, stream_id: u32) -> Result<()> {
        self.send(command.to_packet(stream_id)?).await
    }

    /// Room this session currently publishes to
    pub fn publishing_room(&self) -> Option<&Arc<Room>> {
        match &self.attachment {
            Some(Attachment::Publisher(room)) => Some(room),
            _ => None,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub async fn attach_publisher(&mut self, room: Arc<Room>) {
        self.detach().await;
        room.attach_publisher(&self.id).await;
        self.attachment = Some(Attachment::Publisher(room));
    }

    pub async fn attach_player(&mut self, room: Arc<Room>, pump: JoinHandle<()>) {
        self.detach().await;
        self.attachment = Some(Attachment::Player { room, pump });
    }

    /// Leave the current room: a publisher ends the room's buffer, a player
    /// stops its pump. The room is dropped from the registry once unused.
    pub async fn detach(&mut self) {
        let room = match self.attachment.take() {
            Some(Attachment::Publisher(room)) => {
                room.detach_publisher(&self.id).await;
                room
            }
            Some(Attachment::Player { room, pump }) => {
                pump.abort();
                // wait for the task to drop its reader
                let _ = pump.await;
                room
            }
            None => return,
        };

        let app = self.registry.app(room.app());
        let name = room.name().to_string();
        drop(room);
        if let Some(app) = app {
            app.remove_if_idle(&name).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::control;

    fn session() -> (Session, mpsc::Receiver<RtmpPacket>) {
        let (tx, rx) = mpsc::channel(8);
        let registry = Arc::new(Registry::new(["live"]));
        (Session::new(registry, Arc::new(ServerConfig::default()), tx), rx)
    }

    #[tokio::test]
    async fn test_send_fails_after_writer_gone() {
        let (session, rx) = session();
        assert!(session.send(control::set_chunk_size(4096)).await.is_ok());
        drop(rx);

        let err = session.send(control::set_chunk_size(4096)).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_publisher_detach_removes_room() {
        let (mut session, _rx) = session();
        let app = session.registry().app("live").unwrap();
        let room = app.get_or_create("cam").await;

        session.attach_publisher(room.clone()).await;
        assert_eq!(room.publisher().await.as_deref(), Some(session.id()));
        assert!(session.publishing_room().is_some());
        drop(room);

        session.detach().await;
        assert!(session.publishing_room().is_none());
        assert!(app.get("cam").await.is_none());
    }

    #[tokio::test]
    async fn test_player_detach_stops_pump() {
        let (mut session, _rx) = session();
        let app = session.registry().app("live").unwrap();
        let room = app.get_or_create("cam").await;

        let mut reader = room.join().await;
        let pump = tokio::spawn(async move {
            while reader.read().await.is_some() {}
        });
        session.attach_player(room, pump).await;

        session.detach().await;
        assert!(app.get("cam").await.is_none());
    }
}
