use bytes::{Bytes, BytesMut};
use crate::protocol::{RtmpHeader, RtmpPacket};

/// Per-csid decoder state: the last header seen on the lane and the
/// message currently being reassembled on it.
#[derive(Debug, Clone, Default)]
pub struct ChunkStreamContext {
    /// Header of the most recent chunk, inherited by fmt 1/2/3
    pub prev_header: Option<RtmpHeader>,

    /// Timestamp delta re-applied by a fmt 3 chunk starting a new message
    pub timestamp_delta: u32,

    /// Whether the last fmt 0/1/2 header used the extended timestamp
    pub extended_timestamp: bool,

    /// Partial payload of the message in flight
    pub message_buffer: BytesMut,
}

impl ChunkStreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A message has been started and not yet completed
    pub fn is_assembling(&self) -> bool {
        !self.message_buffer.is_empty()
    }

    /// Bytes still missing from the message in flight
    pub fn bytes_remaining(&self) -> usize {
        let expected = self.prev_header.map_or(0, |h| h.message_length as usize);
        expected.saturating_sub(self.message_buffer.len())
    }

    /// Append chunk data; returns the message once all bytes have arrived
    pub fn add_chunk_data(&mut self, data: &[u8]) -> Option<RtmpPacket> {
        self.message_buffer.extend_from_slice(data);
        if self.bytes_remaining() > 0 {
            return None;
        }

        let header = self.prev_header?;
        let payload: Bytes = self.message_buffer.split().freeze();
        Some(RtmpPacket::new(header, payload))
    }

    /// Drop the partial message, keeping the header for later deltas
    pub fn abort(&mut self) {
        self.message_buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MSG_TYPE_AUDIO;

    #[test]
    fn test_reassembly_across_chunks() {
        let mut context = ChunkStreamContext::new();
        context.prev_header = Some(RtmpHeader::new(10, 5, MSG_TYPE_AUDIO, 1, 4));

        assert!(context.add_chunk_data(&[1, 2, 3]).is_none());
        assert!(context.is_assembling());
        assert_eq!(context.bytes_remaining(), 2);

        let packet = context.add_chunk_data(&[4, 5]).unwrap();
        assert_eq!(packet.payload(), &[1, 2, 3, 4, 5]);
        assert!(!context.is_assembling());
    }

    #[test]
    fn test_abort_discards_partial() {
        let mut context = ChunkStreamContext::new();
        context.prev_header = Some(RtmpHeader::new(0, 4, MSG_TYPE_AUDIO, 1, 4));
        context.add_chunk_data(&[1, 2]);
        context.abort();

        assert!(!context.is_assembling());
        assert_eq!(context.bytes_remaining(), 4);
    }
}
