use bytes::{BufMut, Bytes, BytesMut};
use crate::flv::FlvTag;

pub const FLV_TAG_HEADER_SIZE: usize = 11;

/// FLV file header ("FLV", version 1, audio+video) followed by
/// PreviousTagSize0.
pub fn flv_header() -> Bytes {
    Bytes::from_static(&[
        b'F', b'L', b'V', 0x01, 0x05, 0x00, 0x00, 0x00, 0x09,
        0x00, 0x00, 0x00, 0x00,
    ])
}

/// Serialise a tag as it appears in an FLV body: tag header, payload, and
/// the trailing PreviousTagSize.
pub fn encode_tag(tag: &FlvTag) -> Bytes {
    let data_size = tag.data.len();
    let mut out = BytesMut::with_capacity(FLV_TAG_HEADER_SIZE + data_size + 4);

    out.put_u8(tag.kind as u8);
    out.put_uint(data_size as u64, 3);
    out.put_uint(u64::from(tag.timestamp & 0x00FF_FFFF), 3);
    out.put_u8((tag.timestamp >> 24) as u8);
    out.put_uint(0, 3); // stream id, always 0
    out.put_slice(&tag.data);
    out.put_u32((FLV_TAG_HEADER_SIZE + data_size) as u32);

    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flv::TagKind;

    #[test]
    fn test_header_bytes() {
        let header = flv_header();
        assert_eq!(&header[..3], b"FLV");
        assert_eq!(header.len(), 13);
        assert_eq!(header[4], 0x05);
    }

    #[test]
    fn test_tag_layout() {
        let tag = FlvTag {
            kind: TagKind::Video,
            timestamp: 0x0112_3456,
            data: Bytes::from_static(&[0x27, 0x01, 0x00, 0x00, 0x00]),
        };
        let bytes = encode_tag(&tag);

        assert_eq!(bytes[0], 9);
        assert_eq!(&bytes[1..4], &[0x00, 0x00, 0x05]);
        // lower 24 bits then the extension byte
        assert_eq!(&bytes[4..8], &[0x12, 0x34, 0x56, 0x01]);
        assert_eq!(&bytes[8..11], &[0, 0, 0]);
        assert_eq!(&bytes[11..16], &tag.data[..]);
        assert_eq!(&bytes[16..], &16u32.to_be_bytes());
    }
}
