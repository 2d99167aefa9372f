use crate::{Error, Result, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::chunk::{Chunk, ChunkHeader, ChunkStreamContext, EXTENDED_TIMESTAMP};
use crate::protocol::{RtmpHeader, RtmpPacket};
use bytes::Bytes;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Inbound chunk decoder and message reassembler.
///
/// Header compression state and partial payloads are tracked per chunk
/// stream id, so chunks of different messages may interleave freely.
pub struct ChunkReader {
    /// Chunk streams by ID
    chunk_streams: HashMap<u32, ChunkStreamContext>,

    /// Current chunk size for reading, set by the peer's SetChunkSize
    chunk_size_in: usize,
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            chunk_streams: HashMap::new(),
            chunk_size_in: DEFAULT_CHUNK_SIZE as usize,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_in
    }

    /// Apply the peer's SetChunkSize
    pub fn set_chunk_size(&mut self, size: u32) -> Result<()> {
        if size == 0 || size > MAX_CHUNK_SIZE {
            return Err(Error::protocol(format!("Invalid peer chunk size {}", size)));
        }
        self.chunk_size_in = size as usize;
        Ok(())
    }

    /// Discard the partially received message on a chunk stream
    pub fn abort(&mut self, cs_id: u32) {
        if let Some(context) = self.chunk_streams.get_mut(&cs_id) {
            context.abort();
        }
    }

    /// Read chunks until a message is complete
    pub async fn read_message<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<RtmpPacket> {
        loop {
            if let Some(packet) = self.read_chunk(reader).await?.message {
                return Ok(packet);
            }
        }
    }

    /// Read next chunk from stream
    pub async fn read_chunk<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<Chunk> {
        let first_byte = reader.read_u8().await?;
        let basic = Self::parse_basic_header(first_byte, reader).await?;

        let chunk_size = self.chunk_size_in;
        let context = self.chunk_streams.entry(basic.cs_id).or_default();
        let header = Self::read_message_header(basic, context, reader).await?;

        let to_read = context.bytes_remaining().min(chunk_size);
        let mut data = vec![0u8; to_read];
        reader.read_exact(&mut data).await?;

        let message = context.add_chunk_data(&data);
        Ok(Chunk {
            basic,
            header,
            data: Bytes::from(data),
            message,
        })
    }

    /// Parse basic header and get chunk stream ID
    async fn parse_basic_header<R: AsyncRead + Unpin>(first_byte: u8, reader: &mut R) -> Result<ChunkHeader> {
        let fmt = (first_byte >> 6) & 0x03;
        let cs_id = match first_byte & 0x3F {
            0 => reader.read_u8().await? as u32 + 64,
            1 => {
                let mut id_bytes = [0u8; 2];
                reader.read_exact(&mut id_bytes).await?;
                id_bytes[0] as u32 + id_bytes[1] as u32 * 256 + 64
            }
            n => n as u32,
        };
        Ok(ChunkHeader { fmt, cs_id })
    }

    /// Resolve the message header for this chunk and record it as the
    /// lane's previous header.
    async fn read_message_header<R: AsyncRead + Unpin>(
        basic: ChunkHeader,
        context: &mut ChunkStreamContext,
        reader: &mut R,
    ) -> Result<RtmpHeader> {
        let ChunkHeader { fmt, cs_id } = basic;
        let prev = context.prev_header;
        let missing_prev = || Error::chunk(format!("fmt {} chunk on csid {} without a previous header", fmt, cs_id));

        if fmt != 3 && context.is_assembling() {
            log::debug!("New header on csid {} drops a partial message", cs_id);
            context.abort();
        }

        let header = match fmt {
            0 => {
                let mut header_bytes = [0u8; 11];
                reader.read_exact(&mut header_bytes).await?;
                let (timestamp, extended) = Self::read_timestamp(u24(&header_bytes[0..3]), reader).await?;
                context.timestamp_delta = 0;
                context.extended_timestamp = extended;

                RtmpHeader::new(
                    timestamp,
                    u24(&header_bytes[3..6]),
                    header_bytes[6],
                    u32::from_le_bytes([header_bytes[7], header_bytes[8], header_bytes[9], header_bytes[10]]),
                    cs_id,
                )
            }
            1 => {
                let prev = prev.ok_or_else(missing_prev)?;
                let mut header_bytes = [0u8; 7];
                reader.read_exact(&mut header_bytes).await?;
                let (delta, extended) = Self::read_timestamp(u24(&header_bytes[0..3]), reader).await?;
                context.timestamp_delta = delta;
                context.extended_timestamp = extended;

                RtmpHeader::new(
                    prev.timestamp.wrapping_add(delta),
                    u24(&header_bytes[3..6]),
                    header_bytes[6],
                    prev.message_stream_id,
                    cs_id,
                )
            }
            2 => {
                let prev = prev.ok_or_else(missing_prev)?;
                let mut header_bytes = [0u8; 3];
                reader.read_exact(&mut header_bytes).await?;
                let (delta, extended) = Self::read_timestamp(u24(&header_bytes), reader).await?;
                context.timestamp_delta = delta;
                context.extended_timestamp = extended;

                RtmpHeader {
                    timestamp: prev.timestamp.wrapping_add(delta),
                    ..prev
                }
            }
            _ => {
                let prev = prev.ok_or_else(missing_prev)?;
                if context.extended_timestamp {
                    // Repeats the field of the inherited header
                    reader.read_u32().await?;
                }
                if context.is_assembling() {
                    prev
                } else {
                    RtmpHeader {
                        timestamp: prev.timestamp.wrapping_add(context.timestamp_delta),
                        ..prev
                    }
                }
            }
        };

        context.prev_header = Some(header);
        Ok(header)
    }

    async fn read_timestamp<R: AsyncRead + Unpin>(field: u32, reader: &mut R) -> Result<(u32, bool)> {
        if field == EXTENDED_TIMESTAMP {
            Ok((reader.read_u32().await?, true))
        } else {
            Ok((field, false))
        }
    }
}

fn u24(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkWriter;
    use crate::protocol::{MSG_TYPE_AUDIO, MSG_TYPE_VIDEO};

    async fn read_all(reader: &mut ChunkReader, bytes: &[u8]) -> Vec<RtmpPacket> {
        let mut input = bytes;
        let mut packets = Vec::new();
        while !input.is_empty() {
            packets.push(reader.read_message(&mut input).await.unwrap());
        }
        packets
    }

    #[tokio::test]
    async fn test_round_trip_lengths_and_chunk_sizes() {
        for chunk_size in [1usize, 7, 128, 4096] {
            for len in [0usize, 1, 127, 128, 129, 1000, 9000] {
                let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
                let packet = RtmpPacket::new(RtmpHeader::video(1234, 1), payload.clone());

                let mut writer = ChunkWriter::new();
                writer.set_chunk_size(chunk_size);
                let bytes = writer.encode_packet(&packet).unwrap();

                let mut reader = ChunkReader::new();
                reader.set_chunk_size(chunk_size as u32).unwrap();
                let decoded = read_all(&mut reader, &bytes).await;

                assert_eq!(decoded.len(), 1);
                assert_eq!(decoded[0].payload(), &payload[..]);
                assert_eq!(decoded[0].header, packet.header);
            }
        }
    }

    #[tokio::test]
    async fn test_fmt2_deltas() {
        let bytes = [
            // fmt0 csid 4, ts 1000, len 1, audio, stream 1
            0x04, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0xAA,
            // fmt2 delta 40
            0x84, 0x00, 0x00, 0x28, 0xBB,
            0x84, 0x00, 0x00, 0x28, 0xCC,
        ];
        let mut reader = ChunkReader::new();
        let packets = read_all(&mut reader, &bytes).await;

        let timestamps: Vec<u32> = packets.iter().map(|p| p.timestamp()).collect();
        assert_eq!(timestamps, vec![1000, 1040, 1080]);
        assert!(packets.iter().all(|p| p.message_type() == MSG_TYPE_AUDIO && p.message_stream_id() == 1));
    }

    #[tokio::test]
    async fn test_fmt1_changes_length_and_type() {
        let bytes = [
            0x04, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0xAA,
            // fmt1 delta 5, len 2, video
            0x44, 0x00, 0x00, 0x05, 0x00, 0x00, 0x02, 0x09, 0x01, 0x02,
        ];
        let mut reader = ChunkReader::new();
        let packets = read_all(&mut reader, &bytes).await;

        assert_eq!(packets[1].timestamp(), 15);
        assert_eq!(packets[1].message_type(), MSG_TYPE_VIDEO);
        assert_eq!(packets[1].message_stream_id(), 1);
        assert_eq!(packets[1].payload(), &[0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_fmt3_new_message_reapplies_delta() {
        let bytes = [
            0x04, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0xAA,
            0x84, 0x00, 0x00, 0x14, 0xBB,
            // fmt3 starting new messages
            0xC4, 0xCC,
            0xC4, 0xDD,
        ];
        let mut reader = ChunkReader::new();
        let packets = read_all(&mut reader, &bytes).await;

        let timestamps: Vec<u32> = packets.iter().map(|p| p.timestamp()).collect();
        assert_eq!(timestamps, vec![1000, 1020, 1040, 1060]);
    }

    #[tokio::test]
    async fn test_fmt3_continuation_keeps_timestamp() {
        let mut bytes = vec![
            // fmt0 csid 4, ts 500, len 130
            0x04, 0x00, 0x01, 0xF4, 0x00, 0x00, 0x82, 0x08, 0x01, 0x00, 0x00, 0x00,
        ];
        bytes.extend_from_slice(&[1u8; 128]);
        bytes.extend_from_slice(&[0xC4, 2, 2]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        let first = reader.read_chunk(&mut input).await.unwrap();
        assert!(first.message.is_none());
        let second = reader.read_chunk(&mut input).await.unwrap();
        assert_eq!(second.header.timestamp, 500);

        let packet = second.message.unwrap();
        assert_eq!(packet.timestamp(), 500);
        assert_eq!(packet.payload().len(), 130);
    }

    #[tokio::test]
    async fn test_extended_timestamp_every_fmt() {
        let bytes = [
            // fmt0 with extended absolute 0x01000000
            0x04, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0xAA,
            // fmt3 new message: extended field repeated, delta 0
            0xC4, 0x01, 0x00, 0x00, 0x00, 0xAB,
            // fmt1 with extended delta 0x01000000
            0x44, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0xBB,
            // fmt2 with extended delta 0x01000000
            0x84, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x00, 0x00, 0xCC,
            // fmt3 new message: extended field repeated, delta re-applied
            0xC4, 0x01, 0x00, 0x00, 0x00, 0xDD,
        ];
        let mut reader = ChunkReader::new();
        let packets = read_all(&mut reader, &bytes).await;

        let timestamps: Vec<u32> = packets.iter().map(|p| p.timestamp()).collect();
        assert_eq!(
            timestamps,
            vec![0x0100_0000, 0x0100_0000, 0x0200_0000, 0x0300_0000, 0x0400_0000]
        );
        let payloads: Vec<u8> = packets.iter().map(|p| p.payload()[0]).collect();
        assert_eq!(payloads, vec![0xAA, 0xAB, 0xBB, 0xCC, 0xDD]);
    }

    #[tokio::test]
    async fn test_extended_csid_forms() {
        for cs_id in [64u32, 319, 320, 65599] {
            let mut header = RtmpHeader::audio(7, 1);
            header.chunk_stream_id = cs_id;
            let packet = RtmpPacket::new(header, vec![0xAF, 0x01]);
            let bytes = ChunkWriter::new().encode_packet(&packet).unwrap();

            let mut reader = ChunkReader::new();
            let decoded = read_all(&mut reader, &bytes).await;
            assert_eq!(decoded[0].header.chunk_stream_id, cs_id);
        }
    }

    #[tokio::test]
    async fn test_interleaved_chunk_streams() {
        let audio = RtmpPacket::new(RtmpHeader::audio(10, 1), vec![1u8; 200]);
        let video = RtmpPacket::new(RtmpHeader::video(20, 1), vec![2u8; 200]);
        let mut writer = ChunkWriter::new();
        let a = writer.encode_packet(&audio).unwrap();
        let v = writer.encode_packet(&video).unwrap();

        // first chunk of each, then the remainders
        let a_first = 12 + 128;
        let v_first = 12 + 128;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&a[..a_first]);
        bytes.extend_from_slice(&v[..v_first]);
        bytes.extend_from_slice(&a[a_first..]);
        bytes.extend_from_slice(&v[v_first..]);

        let mut reader = ChunkReader::new();
        let packets = read_all(&mut reader, &bytes).await;
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].message_type(), MSG_TYPE_AUDIO);
        assert_eq!(packets[0].payload(), &[1u8; 200][..]);
        assert_eq!(packets[1].message_type(), MSG_TYPE_VIDEO);
        assert_eq!(packets[1].payload(), &[2u8; 200][..]);
    }

    #[tokio::test]
    async fn test_unseen_csid_is_fatal() {
        for first in [0x44u8, 0x84, 0xC4] {
            let bytes = [first, 0, 0, 0, 0, 0, 0, 0, 0];
            let mut reader = ChunkReader::new();
            let err = reader.read_chunk(&mut &bytes[..]).await.unwrap_err();
            assert!(matches!(err, Error::Chunk(_)));
            assert!(err.is_fatal());
        }
    }

    #[tokio::test]
    async fn test_abort_then_fresh_message() {
        let mut bytes = vec![0x04, 0x00, 0x00, 0x01, 0x00, 0x00, 0x82, 0x08, 0x01, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[1u8; 128]);

        let mut reader = ChunkReader::new();
        let mut input = &bytes[..];
        assert!(reader.read_chunk(&mut input).await.unwrap().message.is_none());
        reader.abort(4);

        // fmt3 now starts a new 130-byte message from scratch
        let mut rest = vec![0xC4];
        rest.extend_from_slice(&[3u8; 128]);
        rest.extend_from_slice(&[0xC4, 3, 3]);
        let packets = read_all(&mut reader, &rest).await;
        assert_eq!(packets[0].payload(), &[3u8; 130][..]);
    }

    #[tokio::test]
    async fn test_short_read_is_io_error() {
        let bytes = [0x04, 0x00, 0x00];
        let mut reader = ChunkReader::new();
        let err = reader.read_message(&mut &bytes[..]).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut reader = ChunkReader::new();
        assert!(reader.set_chunk_size(0).is_err());
        assert!(reader.set_chunk_size(0x8000_0000).is_err());
        assert!(reader.set_chunk_size(4096).is_ok());
        assert_eq!(reader.chunk_size(), 4096);
    }
}
