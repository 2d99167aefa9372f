use chrono::Utc;

/// Milliseconds since the Unix epoch, truncated to the 32 bits RTMP carries.
pub fn epoch_millis() -> u32 {
    Utc::now().timestamp_millis() as u32
}
