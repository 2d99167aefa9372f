use crate::{ByteBuffer, Result, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MSG_TYPE_SET_CHUNK_SIZE};
use crate::chunk::{ChunkHeader, EXTENDED_TIMESTAMP};
use crate::protocol::RtmpPacket;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Outbound chunker. Every message is sent as one fmt 0 chunk followed by
/// fmt 3 continuations, so no per-csid state is kept.
pub struct ChunkWriter {
    /// Current chunk size for writing
    chunk_size_out: usize,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            chunk_size_out: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_out
    }

    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_out = size.clamp(1, MAX_CHUNK_SIZE as usize);
    }

    /// Write packet as chunks and flush
    pub async fn write_packet<W: AsyncWrite + Unpin>(
        &mut self,
        packet: &RtmpPacket,
        writer: &mut W,
    ) -> Result<()> {
        let chunks = self.encode_packet(packet)?;
        writer.write_all(&chunks).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Serialise a packet. A SetChunkSize message is itself chunked with the
    /// old size; the new size applies from the next packet on.
    pub fn encode_packet(&mut self, packet: &RtmpPacket) -> Result<Vec<u8>> {
        let cs_id = packet.header.chunk_stream_id;
        let timestamp = packet.header.timestamp;
        let extended = timestamp >= EXTENDED_TIMESTAMP;
        let payload = &packet.payload;

        let chunk_count = payload.len().div_ceil(self.chunk_size_out).max(1);
        let mut result = Vec::with_capacity(payload.len() + 16 + chunk_count * 8);

        ChunkHeader { fmt: 0, cs_id }.encode(&mut result)?;
        result.extend_from_slice(&self.encode_type0_header(packet)?);

        let mut offset = 0;
        loop {
            let end = (offset + self.chunk_size_out).min(payload.len());
            result.extend_from_slice(&payload[offset..end]);
            offset = end;
            if offset >= payload.len() {
                break;
            }

            ChunkHeader { fmt: 3, cs_id }.encode(&mut result)?;
            if extended {
                result.extend_from_slice(&timestamp.to_be_bytes());
            }
        }

        if packet.message_type() == MSG_TYPE_SET_CHUNK_SIZE && payload.len() >= 4 {
            let size = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) & MAX_CHUNK_SIZE;
            self.set_chunk_size(size as usize);
        }

        Ok(result)
    }

    /// Encode type 0 header (11 bytes + optional extended timestamp)
    fn encode_type0_header(&self, packet: &RtmpPacket) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(15);
        let timestamp = packet.header.timestamp;

        buffer.write_u24_be(timestamp.min(EXTENDED_TIMESTAMP))?;
        buffer.write_u24_be(packet.payload.len() as u32)?;
        buffer.write_u8(packet.header.message_type)?;
        buffer.write_u32_le(packet.header.message_stream_id)?;

        if timestamp >= EXTENDED_TIMESTAMP {
            buffer.write_u32_be(timestamp)?;
        }

        Ok(buffer.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{control, RtmpHeader};

    #[test]
    fn test_single_chunk_layout() {
        let mut writer = ChunkWriter::new();
        let packet = RtmpPacket::new(RtmpHeader::audio(0x010203, 1), vec![0xAF, 0x01]);
        let bytes = writer.encode_packet(&packet).unwrap();

        assert_eq!(
            bytes,
            vec![0x04, 0x01, 0x02, 0x03, 0x00, 0x00, 0x02, 0x08, 0x01, 0x00, 0x00, 0x00, 0xAF, 0x01]
        );
    }

    #[test]
    fn test_payload_split_with_fmt3() {
        let mut writer = ChunkWriter::new();
        let packet = RtmpPacket::new(RtmpHeader::video(0, 1), vec![7u8; 300]);
        let bytes = writer.encode_packet(&packet).unwrap();

        // 12-byte fmt0 chunk header, 128 bytes, 1-byte fmt3, 128, 1-byte fmt3, 44
        assert_eq!(bytes.len(), 12 + 300 + 2);
        assert_eq!(bytes[12 + 128], 0xC6);
        assert_eq!(bytes[12 + 128 + 1 + 128], 0xC6);
    }

    #[test]
    fn test_extended_timestamp_on_every_chunk() {
        let mut writer = ChunkWriter::new();
        let packet = RtmpPacket::new(RtmpHeader::video(0x0100_0000, 1), vec![1u8; 200]);
        let bytes = writer.encode_packet(&packet).unwrap();

        assert_eq!(&bytes[1..4], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[12..16], &0x0100_0000u32.to_be_bytes());
        let continuation = 16 + 128;
        assert_eq!(bytes[continuation], 0xC6);
        assert_eq!(&bytes[continuation + 1..continuation + 5], &0x0100_0000u32.to_be_bytes());
    }

    #[test]
    fn test_set_chunk_size_applies_after_write() {
        let mut writer = ChunkWriter::new();
        writer.encode_packet(&control::set_chunk_size(4096)).unwrap();
        assert_eq!(writer.chunk_size(), 4096);
    }

    #[test]
    fn test_empty_payload() {
        let mut writer = ChunkWriter::new();
        let packet = RtmpPacket::new(RtmpHeader::command(0), Vec::new());
        assert_eq!(writer.encode_packet(&packet).unwrap().len(), 12);
    }

    #[test]
    fn test_escape_csid_not_written() {
        let mut writer = ChunkWriter::new();
        let packet = RtmpPacket::new(RtmpHeader::new(0, 0, MSG_TYPE_SET_CHUNK_SIZE, 0, 1), vec![0, 0, 16, 0]);
        assert!(matches!(writer.encode_packet(&packet), Err(crate::Error::Chunk(_))));
        assert_eq!(writer.chunk_size(), DEFAULT_CHUNK_SIZE as usize);
    }
}
