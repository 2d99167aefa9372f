mod stream;
mod reader;
mod writer;

pub use stream::*;
pub use reader::*;
pub use writer::*;

use bytes::Bytes;
use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{Error, Result};

/// Timestamp field value signalling a 4-byte extended timestamp
pub const EXTENDED_TIMESTAMP: u32 = 0x00FF_FFFF;

/// Largest csid the 3-byte basic header can carry
pub const MAX_CHUNK_STREAM_ID: u32 = 65599;

/// Chunk basic header: format and chunk stream id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub fmt: u8,
    pub cs_id: u32,
}

impl ChunkHeader {
    /// Encode with the 1, 2 or 3 byte form depending on the csid.
    /// csids 0 and 1 are escape values and cannot be sent.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let fmt = self.fmt << 6;
        match self.cs_id {
            2..=63 => out.push(fmt | self.cs_id as u8),
            64..=319 => {
                out.push(fmt);
                out.push((self.cs_id - 64) as u8);
            }
            320..=MAX_CHUNK_STREAM_ID => {
                let id = self.cs_id - 64;
                out.push(fmt | 1);
                out.push((id & 0xFF) as u8);
                out.push((id >> 8) as u8);
            }
            _ => return Err(Error::chunk(format!("Chunk stream id {} out of range", self.cs_id))),
        }
        Ok(())
    }
}

/// One decoded chunk with its header fully resolved against the lane state
#[derive(Debug, Clone)]
pub struct Chunk {
    pub basic: ChunkHeader,
    pub header: RtmpHeader,
    pub data: Bytes,
    /// Set when this chunk carried the last bytes of its message
    pub message: Option<RtmpPacket>,
}
