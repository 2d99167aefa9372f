use crate::protocol::constants::*;
use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{ByteBuffer, Error, Result};

/// SetPeerBandwidth limit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    Hard = 0,
    Soft = 1,
    Dynamic = 2,
}

impl LimitType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(LimitType::Hard),
            1 => Ok(LimitType::Soft),
            2 => Ok(LimitType::Dynamic),
            n => Err(Error::protocol(format!("Invalid peer bandwidth limit type {}", n))),
        }
    }
}

/// User control message events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserControlEvent {
    StreamBegin(u32),
    StreamEof(u32),
    StreamDry(u32),
    SetBufferLength { stream_id: u32, buffer_ms: u32 },
    StreamIsRecorded(u32),
    PingRequest(u32),
    PingResponse(u32),
    Unknown(u16),
}

impl UserControlEvent {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let short = |e: std::io::Error| Error::protocol(format!("Short user control message: {}", e));

        let event = buffer.read_u16_be().map_err(short)?;
        let event = match event {
            EVENT_STREAM_BEGIN => UserControlEvent::StreamBegin(buffer.read_u32_be().map_err(short)?),
            EVENT_STREAM_EOF => UserControlEvent::StreamEof(buffer.read_u32_be().map_err(short)?),
            EVENT_STREAM_DRY => UserControlEvent::StreamDry(buffer.read_u32_be().map_err(short)?),
            EVENT_SET_BUFFER_LENGTH => UserControlEvent::SetBufferLength {
                stream_id: buffer.read_u32_be().map_err(short)?,
                buffer_ms: buffer.read_u32_be().map_err(short)?,
            },
            EVENT_STREAM_IS_RECORDED => {
                UserControlEvent::StreamIsRecorded(buffer.read_u32_be().map_err(short)?)
            }
            EVENT_PING_REQUEST => UserControlEvent::PingRequest(buffer.read_u32_be().map_err(short)?),
            EVENT_PING_RESPONSE => UserControlEvent::PingResponse(buffer.read_u32_be().map_err(short)?),
            other => UserControlEvent::Unknown(other),
        };
        Ok(event)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = ByteBuffer::with_capacity(10);
        let (event, value) = match *self {
            UserControlEvent::StreamBegin(id) => (EVENT_STREAM_BEGIN, id),
            UserControlEvent::StreamEof(id) => (EVENT_STREAM_EOF, id),
            UserControlEvent::StreamDry(id) => (EVENT_STREAM_DRY, id),
            UserControlEvent::SetBufferLength { stream_id, .. } => (EVENT_SET_BUFFER_LENGTH, stream_id),
            UserControlEvent::StreamIsRecorded(id) => (EVENT_STREAM_IS_RECORDED, id),
            UserControlEvent::PingRequest(ts) => (EVENT_PING_REQUEST, ts),
            UserControlEvent::PingResponse(ts) => (EVENT_PING_RESPONSE, ts),
            UserControlEvent::Unknown(event) => (event, 0),
        };
        // Writes into a Vec cannot fail.
        let _ = buffer.write_u16_be(event);
        let _ = buffer.write_u32_be(value);
        if let UserControlEvent::SetBufferLength { buffer_ms, .. } = *self {
            let _ = buffer.write_u32_be(buffer_ms);
        }
        buffer.into_vec()
    }
}

pub fn set_chunk_size(size: u32) -> RtmpPacket {
    RtmpPacket::new(
        RtmpHeader::control(MSG_TYPE_SET_CHUNK_SIZE),
        (size & MAX_CHUNK_SIZE).to_be_bytes().to_vec(),
    )
}

pub fn window_ack_size(size: u32) -> RtmpPacket {
    RtmpPacket::new(RtmpHeader::control(MSG_TYPE_WINDOW_ACK), size.to_be_bytes().to_vec())
}

pub fn set_peer_bandwidth(size: u32, limit: LimitType) -> RtmpPacket {
    let mut payload = size.to_be_bytes().to_vec();
    payload.push(limit as u8);
    RtmpPacket::new(RtmpHeader::control(MSG_TYPE_SET_PEER_BW), payload)
}

pub fn user_control(event: UserControlEvent) -> RtmpPacket {
    RtmpPacket::new(RtmpHeader::control(MSG_TYPE_USER_CONTROL), event.encode())
}
