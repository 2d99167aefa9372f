use rand::{Rng, rng};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fill a buffer with random bytes.
pub fn fill_random(buf: &mut [u8]) {
    rng().fill_bytes(buf);
}

/// Calculate HMAC-SHA256 over the concatenation of `parts`.
///
/// Handshake digests are computed over a 1536-byte block with the 32
/// digest bytes cut out, so taking the two halves avoids a copy.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key)
        .expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }

    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}
