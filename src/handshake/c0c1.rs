use crate::{Error, Result};
use crate::handshake::state::*;

/// Client handshake (C0 + C1)
#[derive(Debug, Clone)]
pub struct C0C1 {
    /// RTMP version (C0)
    pub version: u8,

    /// Raw C1 block
    pub c1: Vec<u8>,
}

impl C0C1 {
    /// Parse C0+C1 from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 1 + HANDSHAKE_SIZE {
            return Err(Error::handshake(format!(
                "C0+C1 too short: {} bytes, expected {}",
                data.len(),
                1 + HANDSHAKE_SIZE
            )));
        }

        let version = data[0];
        if version != RTMP_VERSION {
            return Err(Error::handshake(format!(
                "Unsupported RTMP version: {}, expected {}",
                version, RTMP_VERSION
            )));
        }

        Ok(C0C1 {
            version,
            c1: data[1..1 + HANDSHAKE_SIZE].to_vec(),
        })
    }

    /// Client epoch from the first four bytes of C1
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.c1[0], self.c1[1], self.c1[2], self.c1[3]])
    }

    /// Locate and verify the client digest.
    ///
    /// The digest block after the key (COMPLEX1) is tried before the one
    /// in front of it (COMPLEX2). A C1 that verifies under neither is
    /// treated as a simple handshake.
    pub fn detect_mode(&self) -> (HandshakeMode, Option<[u8; DIGEST_SIZE]>) {
        for mode in [HandshakeMode::Complex1, HandshakeMode::Complex2] {
            if let Some(digest) = self.verify_digest(mode) {
                return (mode, Some(digest));
            }
        }
        (HandshakeMode::Simple, None)
    }

    fn verify_digest(&self, mode: HandshakeMode) -> Option<[u8; DIGEST_SIZE]> {
        let position = digest_position(&self.c1, mode.digest_block()?);
        let expected = compute_digest(&self.c1, position, &FP_KEY[..FP_PARTIAL_KEY_LEN]);
        let mut found = [0u8; DIGEST_SIZE];
        found.copy_from_slice(&self.c1[position..position + DIGEST_SIZE]);
        (found == expected).then_some(found)
    }
}
