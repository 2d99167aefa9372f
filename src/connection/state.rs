/// Command-level state of an RTMP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake done, waiting for connect
    Initial,

    /// connect accepted
    Connected,

    /// createStream answered
    StreamCreated,

    /// Publishing stream
    Publishing,

    /// Playing stream
    Playing,
}

impl SessionState {
    pub fn can_connect(&self) -> bool {
        *self == SessionState::Initial
    }

    pub fn can_create_stream(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::StreamCreated)
    }

    /// publish and play both need a created stream
    pub fn can_start_stream(&self) -> bool {
        *self == SessionState::StreamCreated
    }

    /// Streaming sessions fall back here on deleteStream
    pub fn has_stream(&self) -> bool {
        matches!(
            self,
            SessionState::StreamCreated | SessionState::Publishing | SessionState::Playing
        )
    }
}
