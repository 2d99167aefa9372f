use crate::{epoch_millis, fill_random, hmac_sha256, ByteBuffer, Result};
use crate::handshake::c0c1::C0C1;
use crate::handshake::state::*;

/// Version bytes advertised in a complex S1
pub const FMS_VERSION: [u8; 4] = [0x04, 0x05, 0x00, 0x01];

/// Server handshake (S0 + S1 + S2)
#[derive(Debug, Clone)]
pub struct S0S1S2 {
    pub mode: HandshakeMode,
    pub s1: Vec<u8>,
    pub s2: Vec<u8>,
}

impl S0S1S2 {
    /// Build the response to a client's C0+C1
    pub fn generate(c0c1: &C0C1) -> Result<Self> {
        let (mode, client_digest) = c0c1.detect_mode();
        let s1 = Self::build_s1(mode)?;
        let s2 = match client_digest {
            Some(digest) => Self::build_complex_s2(&digest),
            None => Self::build_simple_s2(c0c1)?,
        };
        Ok(S0S1S2 { mode, s1, s2 })
    }

    fn build_s1(mode: HandshakeMode) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(HANDSHAKE_SIZE);
        buffer.write_u32_be(epoch_millis())?;
        match mode {
            HandshakeMode::Simple => buffer.write_u32_be(0)?,
            _ => buffer.write_bytes(&FMS_VERSION)?,
        }
        let mut random = vec![0u8; HANDSHAKE_SIZE - 8];
        fill_random(&mut random);
        buffer.write_bytes(&random)?;

        let mut s1 = buffer.into_vec();
        imprint_digest(&mut s1, mode, &FMS_KEY[..FMS_PARTIAL_KEY_LEN]);
        Ok(s1)
    }

    /// Echo of C1: client time, client zero field, client random
    fn build_simple_s2(c0c1: &C0C1) -> Result<Vec<u8>> {
        let mut buffer = ByteBuffer::with_capacity(HANDSHAKE_SIZE);
        buffer.write_u32_be(c0c1.timestamp())?;
        buffer.write_bytes(&c0c1.c1[4..8])?;
        buffer.write_bytes(&c0c1.c1[8..])?;
        Ok(buffer.into_vec())
    }

    /// Random bytes signed with a key derived from the client digest
    fn build_complex_s2(client_digest: &[u8; DIGEST_SIZE]) -> Vec<u8> {
        let mut s2 = vec![0u8; HANDSHAKE_SIZE];
        fill_random(&mut s2);
        let key = hmac_sha256(&FMS_KEY, &[client_digest]);
        let signature = hmac_sha256(&key, &[&s2[..HANDSHAKE_SIZE - DIGEST_SIZE]]);
        s2[HANDSHAKE_SIZE - DIGEST_SIZE..].copy_from_slice(&signature);
        s2
    }

    /// S0, S1, S2 in wire order
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * HANDSHAKE_SIZE);
        out.push(RTMP_VERSION);
        out.extend_from_slice(&self.s1);
        out.extend_from_slice(&self.s2);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(c1: &[u8]) -> C0C1 {
        let mut bytes = vec![RTMP_VERSION];
        bytes.extend_from_slice(c1);
        C0C1::parse(&bytes).unwrap()
    }

    #[test]
    fn test_simple_s2_echoes_c1() {
        let mut c1 = vec![0u8; HANDSHAKE_SIZE];
        fill_random(&mut c1[8..]);
        c1[..4].copy_from_slice(&77u32.to_be_bytes());
        // Flash players put their version here even without a valid digest
        c1[4..8].copy_from_slice(&[9, 0, 124, 2]);

        let response = S0S1S2::generate(&parse(&c1)).unwrap();
        assert_eq!(response.mode, HandshakeMode::Simple);
        assert_eq!(&response.s1[4..8], &[0, 0, 0, 0]);
        assert_eq!(&response.s2[..4], &77u32.to_be_bytes());
        assert_eq!(&response.s2[4..8], &c1[4..8]);
        assert_eq!(response.s2, c1);

        let encoded = response.encode();
        assert_eq!(encoded.len(), 1 + 2 * HANDSHAKE_SIZE);
        assert_eq!(encoded[0], RTMP_VERSION);
    }

    #[test]
    fn test_complex_response_is_signed() {
        let mut c1 = vec![0u8; HANDSHAKE_SIZE];
        fill_random(&mut c1);
        let digest = imprint_digest(&mut c1, HandshakeMode::Complex1, &FP_KEY[..FP_PARTIAL_KEY_LEN])
            .unwrap();

        let response = S0S1S2::generate(&parse(&c1)).unwrap();
        assert_eq!(response.mode, HandshakeMode::Complex1);
        assert_eq!(&response.s1[4..8], &FMS_VERSION);

        // S1 digest sits in the same block layout as the client's
        let position = digest_position(&response.s1, 772);
        let expected = compute_digest(&response.s1, position, &FMS_KEY[..FMS_PARTIAL_KEY_LEN]);
        assert_eq!(&response.s1[position..position + DIGEST_SIZE], &expected);

        let key = hmac_sha256(&FMS_KEY, &[&digest]);
        let signature = hmac_sha256(&key, &[&response.s2[..HANDSHAKE_SIZE - DIGEST_SIZE]]);
        assert_eq!(&response.s2[HANDSHAKE_SIZE - DIGEST_SIZE..], &signature);
    }
}
