use bytes::Bytes;
use crate::protocol::{RtmpHeader, RtmpPacket, MSG_TYPE_AUDIO, MSG_TYPE_DATA_AMF0, MSG_TYPE_VIDEO};
use crate::{Error, Result};

// Video codec ids
pub const CODEC_AVC: u8 = 7;
pub const CODEC_HEVC: u8 = 12;
pub const CODEC_AV1: u8 = 13;

// Audio sound formats
pub const SOUND_AAC: u8 = 10;
pub const SOUND_OPUS: u8 = 13;

const FRAME_KEY: u8 = 1;
const PACKET_SEQUENCE_HEADER: u8 = 0;
/// Enhanced RTMP: top bit of the first video byte marks an extended header
const EX_HEADER: u8 = 0x80;

/// FLV tag type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Audio = 8,
    Video = 9,
    Script = 18,
}

/// A timestamped media payload as carried by audio/video/data messages.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvTag {
    pub kind: TagKind,
    pub timestamp: u32,
    pub data: Bytes,
}

impl FlvTag {
    pub fn audio(timestamp: u32, data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::protocol("Empty audio tag"));
        }
        let format = data[0] >> 4;
        if (format == SOUND_AAC || format == SOUND_OPUS) && data.len() < 2 {
            return Err(Error::protocol("AAC audio tag without packet type"));
        }
        Ok(FlvTag { kind: TagKind::Audio, timestamp, data })
    }

    pub fn video(timestamp: u32, data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::protocol("Empty video tag"));
        }
        let codec = data[0] & 0x0F;
        let legacy_avc_like = data[0] & EX_HEADER == 0
            && matches!(codec, CODEC_AVC | CODEC_HEVC | CODEC_AV1);
        if legacy_avc_like && data.len() < 5 {
            return Err(Error::protocol(format!("Video tag too short: {} bytes", data.len())));
        }
        Ok(FlvTag { kind: TagKind::Video, timestamp, data })
    }

    pub fn script(timestamp: u32, data: Bytes) -> Self {
        FlvTag { kind: TagKind::Script, timestamp, data }
    }

    /// Build a tag from a media or data message
    pub fn from_packet(packet: &RtmpPacket) -> Result<Self> {
        let data = packet.payload.clone();
        match packet.message_type() {
            MSG_TYPE_AUDIO => FlvTag::audio(packet.timestamp(), data),
            MSG_TYPE_VIDEO => FlvTag::video(packet.timestamp(), data),
            MSG_TYPE_DATA_AMF0 => Ok(FlvTag::script(packet.timestamp(), data)),
            other => Err(Error::protocol(format!("Message type {} is not a media tag", other))),
        }
    }

    /// Wrap back into a message on the given stream
    pub fn to_packet(&self, stream_id: u32) -> RtmpPacket {
        let header = match self.kind {
            TagKind::Audio => RtmpHeader::audio(self.timestamp, stream_id),
            TagKind::Video => RtmpHeader::video(self.timestamp, stream_id),
            TagKind::Script => RtmpHeader::data(self.timestamp, stream_id),
        };
        RtmpPacket::new(header, self.data.clone())
    }

    /// Codec configuration record: AVC/HEVC/AV1 decoder config, an
    /// enhanced-RTMP sequence start, or AAC/Opus specific config.
    pub fn is_sequence_header(&self) -> bool {
        match self.kind {
            TagKind::Video => {
                let first = self.data[0];
                if first & EX_HEADER != 0 {
                    return first & 0x0F == PACKET_SEQUENCE_HEADER;
                }
                matches!(first & 0x0F, CODEC_AVC | CODEC_HEVC | CODEC_AV1)
                    && self.data[1] == PACKET_SEQUENCE_HEADER
            }
            TagKind::Audio => {
                matches!(self.data[0] >> 4, SOUND_AAC | SOUND_OPUS)
                    && self.data[1] == PACKET_SEQUENCE_HEADER
            }
            TagKind::Script => false,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        match self.kind {
            TagKind::Video => (self.data[0] >> 4) & 0x07 == FRAME_KEY,
            _ => false,
        }
    }
}
