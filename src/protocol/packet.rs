use bytes::Bytes;
use crate::protocol::constants::*;

/// A reassembled RTMP message.
#[derive(Debug, Clone)]
pub struct RtmpPacket {
    pub header: RtmpHeader,
    pub payload: Bytes,
}

impl RtmpPacket {
    /// Create a packet; the header length is taken from the payload.
    pub fn new(mut header: RtmpHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        header.message_length = payload.len() as u32;
        RtmpPacket { header, payload }
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    pub fn message_stream_id(&self) -> u32 {
        self.header.message_stream_id
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtmpHeader {
    pub timestamp: u32,
    pub message_length: u32,
    pub message_type: u8,
    pub message_stream_id: u32,
    pub chunk_stream_id: u32,
}

impl RtmpHeader {
    pub fn new(
        timestamp: u32,
        message_length: u32,
        message_type: u8,
        message_stream_id: u32,
        chunk_stream_id: u32,
    ) -> Self {
        RtmpHeader {
            timestamp,
            message_length,
            message_type,
            message_stream_id,
            chunk_stream_id,
        }
    }

    /// Protocol control and user control messages travel on csid 2, stream 0
    pub fn control(message_type: u8) -> Self {
        RtmpHeader::new(0, 0, message_type, 0, CHUNK_STREAM_PROTOCOL)
    }

    pub fn audio(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_AUDIO, stream_id, CHUNK_STREAM_AUDIO)
    }

    pub fn video(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_VIDEO, stream_id, CHUNK_STREAM_VIDEO)
    }

    pub fn command(stream_id: u32) -> Self {
        RtmpHeader::new(0, 0, MSG_TYPE_COMMAND_AMF0, stream_id, CHUNK_STREAM_COMMAND)
    }

    pub fn data(timestamp: u32, stream_id: u32) -> Self {
        RtmpHeader::new(timestamp, 0, MSG_TYPE_DATA_AMF0, stream_id, CHUNK_STREAM_DATA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_length_follows_payload() {
        let packet = RtmpPacket::new(RtmpHeader::audio(1000, 1), vec![0xAF, 0x01, 0x02]);

        assert_eq!(packet.message_type(), MSG_TYPE_AUDIO);
        assert_eq!(packet.header.message_length, 3);
        assert_eq!(packet.header.chunk_stream_id, CHUNK_STREAM_AUDIO);
        assert_eq!(packet.timestamp(), 1000);
        assert_eq!(packet.message_stream_id(), 1);
    }
}
