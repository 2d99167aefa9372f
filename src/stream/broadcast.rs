use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Entries kept in the live log before the oldest are dropped. A stream
/// without key frames (audio only) never resets, so the log needs a bound.
const MAX_LOG_ENTRIES: usize = 4096;

/// Cached items every reader receives before live data, in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSlot {
    Metadata = 0,
    VideoSequence = 1,
    AudioSequence = 2,
}

impl MetaSlot {
    pub const ALL: [MetaSlot; 3] = [MetaSlot::Metadata, MetaSlot::VideoSequence, MetaSlot::AudioSequence];

    fn index(self) -> usize {
        self as usize
    }
}

/// Single-writer, multi-reader live buffer.
#[async_trait]
pub trait Broadcast<T>: Send + Sync {
    /// Append a live item
    async fn write(&self, item: T);

    /// Replace a cached slot; readers that already joined get the new value
    /// once, in order with live items
    async fn write_meta(&self, slot: MetaSlot, item: T);

    /// Drop the live log, keeping the meta slots
    async fn reset(&self);

    /// Stop the buffer; readers return `None` once drained
    async fn end(&self);

    async fn is_ended(&self) -> bool;

    /// Join at the current position: meta slots first, then the live log
    async fn reader(&self) -> Box<dyn BroadcastReader<T>>;

    /// Readers currently attached
    fn reader_count(&self) -> usize;
}

#[async_trait]
pub trait BroadcastReader<T>: Send {
    /// Next item, waiting for one if needed. `None` once the buffer ended.
    async fn read(&mut self) -> Option<T>;
}

enum Entry<T> {
    Live(T),
    Meta { slot: MetaSlot, version: u64, item: T },
}

struct State<T> {
    /// Sequence number of `log[0]`
    base: u64,
    log: VecDeque<Entry<T>>,
    meta: [Option<(u64, T)>; 3],
    next_version: u64,
    ended: bool,
}

struct Shared<T> {
    state: RwLock<State<T>>,
    changes: watch::Sender<u64>,
    readers: AtomicUsize,
}

impl<T> Shared<T> {
    fn notify(&self) {
        self.changes.send_modify(|seq| *seq = seq.wrapping_add(1));
    }
}

/// In-memory `Broadcast` holding the current GOP behind a lock, with
/// readers woken through a watch channel.
pub struct GopBuffer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Default for GopBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GopBuffer<T> {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        GopBuffer {
            shared: Arc::new(Shared {
                state: RwLock::new(State {
                    base: 0,
                    log: VecDeque::new(),
                    meta: [None, None, None],
                    next_version: 1,
                    ended: false,
                }),
                changes,
                readers: AtomicUsize::new(0),
            }),
        }
    }

    fn push(state: &mut State<T>, entry: Entry<T>) {
        state.log.push_back(entry);
        if state.log.len() > MAX_LOG_ENTRIES {
            state.log.pop_front();
            state.base += 1;
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Broadcast<T> for GopBuffer<T> {
    async fn write(&self, item: T) {
        {
            let mut state = self.shared.state.write().await;
            if state.ended {
                return;
            }
            Self::push(&mut state, Entry::Live(item));
        }
        self.shared.notify();
    }

    async fn write_meta(&self, slot: MetaSlot, item: T) {
        {
            let mut state = self.shared.state.write().await;
            if state.ended {
                return;
            }
            let version = state.next_version;
            state.next_version += 1;
            state.meta[slot.index()] = Some((version, item.clone()));
            Self::push(&mut state, Entry::Meta { slot, version, item });
        }
        self.shared.notify();
    }

    async fn reset(&self) {
        let mut state = self.shared.state.write().await;
        state.base += state.log.len() as u64;
        state.log.clear();
    }

    async fn end(&self) {
        self.shared.state.write().await.ended = true;
        self.shared.notify();
    }

    async fn is_ended(&self) -> bool {
        self.shared.state.read().await.ended
    }

    async fn reader(&self) -> Box<dyn BroadcastReader<T>> {
        let state = self.shared.state.read().await;
        let mut reader = GopReader {
            shared: self.shared.clone(),
            changes: self.shared.changes.subscribe(),
            cursor: state.base,
            seen: [0; 3],
            pending: VecDeque::new(),
        };
        reader.catch_up_meta(&state);
        self.shared.readers.fetch_add(1, Ordering::SeqCst);
        Box::new(reader)
    }

    fn reader_count(&self) -> usize {
        self.shared.readers.load(Ordering::SeqCst)
    }
}

struct GopReader<T> {
    shared: Arc<Shared<T>>,
    changes: watch::Receiver<u64>,
    /// Sequence number of the next log entry to deliver
    cursor: u64,
    /// Highest meta version delivered per slot
    seen: [u64; 3],
    pending: VecDeque<T>,
}

impl<T: Clone> GopReader<T> {
    /// Queue every slot newer than what this reader has delivered
    fn catch_up_meta(&mut self, state: &State<T>) {
        for slot in MetaSlot::ALL {
            if let Some((version, item)) = &state.meta[slot.index()] {
                if *version > self.seen[slot.index()] {
                    self.seen[slot.index()] = *version;
                    self.pending.push_back(item.clone());
                }
            }
        }
    }

    /// Next item available without waiting. `Err(())` once ended and drained.
    fn poll_state(&mut self, state: &State<T>) -> Result<Option<T>, ()> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(Some(item));
            }

            if self.cursor < state.base {
                // The log was reset or trimmed past us
                self.cursor = state.base;
                self.catch_up_meta(state);
                continue;
            }

            let index = (self.cursor - state.base) as usize;
            match state.log.get(index) {
                Some(Entry::Live(item)) => {
                    self.cursor += 1;
                    return Ok(Some(item.clone()));
                }
                Some(Entry::Meta { slot, version, item }) => {
                    self.cursor += 1;
                    if *version > self.seen[slot.index()] {
                        self.seen[slot.index()] = *version;
                        return Ok(Some(item.clone()));
                    }
                }
                None if state.ended => return Err(()),
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> BroadcastReader<T> for GopReader<T> {
    async fn read(&mut self) -> Option<T> {
        loop {
            self.changes.borrow_and_update();
            {
                let shared = self.shared.clone();
                let state = shared.state.read().await;
                match self.poll_state(&state) {
                    Ok(Some(item)) => return Some(item),
                    Ok(None) => {}
                    Err(()) => return None,
                }
            }
            if self.changes.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl<T> Drop for GopReader<T> {
    fn drop(&mut self) {
        self.shared.readers.fetch_sub(1, Ordering::SeqCst);
    }
}
