use crate::hmac_sha256;

pub const RTMP_VERSION: u8 = 3;
pub const HANDSHAKE_SIZE: usize = 1536;
pub const DIGEST_SIZE: usize = 32;

/// "Genuine Adobe Flash Media Server 001" followed by 32 key bytes
pub const FMS_KEY: [u8; 68] = [
    0x47, 0x65, 0x6e, 0x75, 0x69, 0x6e, 0x65, 0x20,
    0x41, 0x64, 0x6f, 0x62, 0x65, 0x20, 0x46, 0x6c,
    0x61, 0x73, 0x68, 0x20, 0x4d, 0x65, 0x64, 0x69,
    0x61, 0x20, 0x53, 0x65, 0x72, 0x76, 0x65, 0x72,
    0x20, 0x30, 0x30, 0x31,
    0xf0, 0xee, 0xc2, 0x4a, 0x80, 0x68, 0xbe, 0xe8,
    0x2e, 0x00, 0xd0, 0xd1, 0x02, 0x9e, 0x7e, 0x57,
    0x6e, 0xec, 0x5d, 0x2d, 0x29, 0x80, 0x6f, 0xab,
    0x93, 0xb8, 0xe6, 0x36, 0xcf, 0xeb, 0x31, 0xae,
];

/// "Genuine Adobe Flash Player 001" followed by the same 32 key bytes
pub const FP_KEY: [u8; 62] = [
    0x47, 0x65, 0x6E, 0x75, 0x69, 0x6E, 0x65, 0x20,
    0x41, 0x64, 0x6F, 0x62, 0x65, 0x20, 0x46, 0x6C,
    0x61, 0x73, 0x68, 0x20, 0x50, 0x6C, 0x61, 0x79,
    0x65, 0x72, 0x20, 0x30, 0x30, 0x31,
    0xF0, 0xEE, 0xC2, 0x4A, 0x80, 0x68, 0xBE, 0xE8,
    0x2E, 0x00, 0xD0, 0xD1, 0x02, 0x9E, 0x7E, 0x57,
    0x6E, 0xEC, 0x5D, 0x2D, 0x29, 0x80, 0x6F, 0xAB,
    0x93, 0xB8, 0xE6, 0x36, 0xCF, 0xEB, 0x31, 0xAE,
];

/// Partial keys used for the C1/S1 digests
pub const FP_PARTIAL_KEY_LEN: usize = 30;
pub const FMS_PARTIAL_KEY_LEN: usize = 36;

/// Negotiated handshake flavour.
///
/// The complex variants differ in where the digest block sits inside
/// C1/S1: COMPLEX1 places it after the key block (offset 772), COMPLEX2
/// before it (offset 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMode {
    Simple,
    Complex1,
    Complex2,
}

impl HandshakeMode {
    /// Start of the 764-byte digest block, `None` for simple mode
    pub fn digest_block(&self) -> Option<usize> {
        match self {
            HandshakeMode::Simple => None,
            HandshakeMode::Complex1 => Some(8 + 764),
            HandshakeMode::Complex2 => Some(8),
        }
    }
}

/// Position of the 32-byte digest inside a 1536-byte block
pub fn digest_position(block: &[u8], block_base: usize) -> usize {
    let sum: usize = block[block_base..block_base + 4]
        .iter()
        .map(|b| *b as usize)
        .sum();
    block_base + 4 + sum % 728
}

/// HMAC-SHA256 of `block` with the digest bytes at `position` left out
pub fn compute_digest(block: &[u8], position: usize, key: &[u8]) -> [u8; DIGEST_SIZE] {
    hmac_sha256(key, &[&block[..position], &block[position + DIGEST_SIZE..]])
}

/// Compute and write the digest for `mode` into `block`, returning it
pub fn imprint_digest(block: &mut [u8], mode: HandshakeMode, key: &[u8]) -> Option<[u8; DIGEST_SIZE]> {
    let position = digest_position(block, mode.digest_block()?);
    let digest = compute_digest(block, position, key);
    block[position..position + DIGEST_SIZE].copy_from_slice(&digest);
    Some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_position_bounds() {
        let block = [0xFFu8; HANDSHAKE_SIZE];
        // 4 * 255 = 1020, 1020 % 728 = 292
        assert_eq!(digest_position(&block, 8), 8 + 4 + 292);
        let pos = digest_position(&block, 772);
        assert!(pos + DIGEST_SIZE <= HANDSHAKE_SIZE);
    }

    #[test]
    fn test_imprint_then_verify() {
        let mut block = [7u8; HANDSHAKE_SIZE];
        let digest = imprint_digest(&mut block, HandshakeMode::Complex2, &FP_KEY[..FP_PARTIAL_KEY_LEN])
            .unwrap();
        let pos = digest_position(&block, 8);
        assert_eq!(&block[pos..pos + DIGEST_SIZE], &digest);
        assert_eq!(compute_digest(&block, pos, &FP_KEY[..FP_PARTIAL_KEY_LEN]), digest);
    }

    #[test]
    fn test_simple_mode_has_no_digest() {
        let mut block = [0u8; HANDSHAKE_SIZE];
        assert!(imprint_digest(&mut block, HandshakeMode::Simple, &FMS_KEY).is_none());
    }
}
