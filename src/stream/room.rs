use crate::flv::{FlvTag, TagKind};
use crate::stream::{Broadcast, BroadcastReader, GopBuffer, MetaSlot};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A live stream inside an application: one publisher feeding any number
/// of readers through a GOP-caching buffer.
pub struct Room {
    app: String,
    name: String,

    /// Session id of the current publisher. The last one to attach wins.
    publisher: RwLock<Option<String>>,

    /// Replaced with a fresh buffer when a publisher attaches to an ended room
    buffer: RwLock<Arc<dyn Broadcast<FlvTag>>>,
}

impl Room {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Room {
            app: app.into(),
            name: name.into(),
            publisher: RwLock::new(None),
            buffer: RwLock::new(Arc::new(GopBuffer::new())),
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn publisher(&self) -> Option<String> {
        self.publisher.read().await.clone()
    }

    /// Make `session_id` the publisher, replacing any previous one
    pub async fn attach_publisher(&self, session_id: &str) {
        let mut publisher = self.publisher.write().await;
        if let Some(previous) = publisher.as_deref() {
            if previous != session_id {
                log::warn!("{}/{}: publisher {} replaced by {}", self.app, self.name, previous, session_id);
            }
        }
        *publisher = Some(session_id.to_string());

        let mut buffer = self.buffer.write().await;
        if buffer.is_ended().await {
            *buffer = Arc::new(GopBuffer::new());
        }
        log::info!("{}/{}: publisher {} attached", self.app, self.name, session_id);
    }

    /// Detach `session_id` if it is still the publisher, ending the buffer
    pub async fn detach_publisher(&self, session_id: &str) {
        let mut publisher = self.publisher.write().await;
        if publisher.as_deref() != Some(session_id) {
            return;
        }
        *publisher = None;
        self.buffer.read().await.end().await;
        log::info!("{}/{}: publisher {} detached", self.app, self.name, session_id);
    }

    /// Route a publisher's tag into the buffer: codec configuration and
    /// script data go to the meta slots, a key frame starts a new GOP.
    /// Tags from anyone but the current publisher are dropped.
    pub async fn ingest(&self, session_id: &str, tag: FlvTag) {
        if self.publisher.read().await.as_deref() != Some(session_id) {
            log::debug!("{}/{}: dropping tag from stale publisher {}", self.app, self.name, session_id);
            return;
        }

        match tag.kind {
            TagKind::Script => self.write_meta(MetaSlot::Metadata, tag).await,
            TagKind::Video if tag.is_sequence_header() => self.write_meta(MetaSlot::VideoSequence, tag).await,
            TagKind::Audio if tag.is_sequence_header() => self.write_meta(MetaSlot::AudioSequence, tag).await,
            TagKind::Video if tag.is_keyframe() => {
                let buffer = self.buffer.read().await;
                buffer.reset().await;
                buffer.write(tag).await;
            }
            _ => self.write(tag).await,
        }
    }

    pub async fn write_meta(&self, slot: MetaSlot, tag: FlvTag) {
        self.buffer.read().await.write_meta(slot, tag).await;
    }

    pub async fn write(&self, tag: FlvTag) {
        self.buffer.read().await.write(tag).await;
    }

    /// Subscribe at the start of the current GOP. Joining a room whose
    /// publisher has left starts a fresh buffer for the next publisher.
    pub async fn join(&self) -> Box<dyn BroadcastReader<FlvTag>> {
        let mut buffer = self.buffer.write().await;
        if buffer.is_ended().await {
            *buffer = Arc::new(GopBuffer::new());
        }
        buffer.reader().await
    }

    /// No publisher and no readers
    pub async fn is_idle(&self) -> bool {
        self.publisher.read().await.is_none() && self.buffer.read().await.reader_count() == 0
    }
}
