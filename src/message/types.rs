use crate::flv::FlvTag;
use crate::protocol::constants::*;
use crate::protocol::{LimitType, RtmpCommand, RtmpData, RtmpPacket, UserControlEvent};
use crate::{Error, Result};

/// A reassembled message classified by its type byte, with its payload
/// parsed.
#[derive(Debug, Clone)]
pub enum Message {
    SetChunkSize(u32),
    Abort(u32),
    Acknowledgement(u32),
    UserControl(UserControlEvent),
    WindowAckSize(u32),
    SetPeerBandwidth { size: u32, limit: LimitType },
    Media(FlvTag),
    Data { timestamp: u32, data: RtmpData },
    Command(RtmpCommand),
    /// AMF3, shared object, aggregate and unknown messages
    Unsupported(u8),
}

impl Message {
    pub fn parse(packet: &RtmpPacket) -> Result<Self> {
        let payload = packet.payload();
        let message = match packet.message_type() {
            MSG_TYPE_SET_CHUNK_SIZE => Message::SetChunkSize(read_u32(payload, "SetChunkSize")? & MAX_CHUNK_SIZE),
            MSG_TYPE_ABORT => Message::Abort(read_u32(payload, "Abort")?),
            MSG_TYPE_ACK => Message::Acknowledgement(read_u32(payload, "Acknowledgement")?),
            MSG_TYPE_USER_CONTROL => Message::UserControl(UserControlEvent::decode(payload)?),
            MSG_TYPE_WINDOW_ACK => Message::WindowAckSize(read_u32(payload, "WindowAcknowledgementSize")?),
            MSG_TYPE_SET_PEER_BW => {
                let size = read_u32(payload, "SetPeerBandwidth")?;
                let limit = payload
                    .get(4)
                    .ok_or_else(|| Error::protocol("SetPeerBandwidth without limit type"))?;
                Message::SetPeerBandwidth { size, limit: LimitType::from_u8(*limit)? }
            }
            MSG_TYPE_AUDIO | MSG_TYPE_VIDEO => Message::Media(FlvTag::from_packet(packet)?),
            MSG_TYPE_DATA_AMF0 => Message::Data {
                timestamp: packet.timestamp(),
                data: RtmpData::decode(payload)?,
            },
            MSG_TYPE_COMMAND_AMF0 => Message::Command(RtmpCommand::decode(payload)?),
            other => Message::Unsupported(other),
        };
        Ok(message)
    }
}

fn read_u32(payload: &[u8], what: &str) -> Result<u32> {
    match payload {
        [a, b, c, d, ..] => Ok(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => Err(Error::protocol(format!("Short {} message: {} bytes", what, payload.len()))),
    }
}
