mod amf0;
mod decoder;
mod encoder;

pub use amf0::*;
pub use decoder::*;
pub use encoder::*;

use crate::{ByteBuffer, Result};

/// Decode every value in `bytes`, in order.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Amf0Value>> {
    let mut buffer = ByteBuffer::new(bytes.to_vec());
    let mut decoder = Amf0Decoder::new(&mut buffer);
    let mut values = Vec::new();
    while decoder.has_remaining() {
        values.push(decoder.decode()?);
    }
    Ok(values)
}

/// Encode a value sequence back to back.
pub fn encode_all(values: &[Amf0Value]) -> Result<Vec<u8>> {
    let mut encoder = Amf0Encoder::new();
    for value in values {
        encoder.encode(value)?;
    }
    Ok(encoder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_sequence() {
        let values = vec![
            Amf0Value::string("onMetaData"),
            Amf0Value::EcmaArray(vec![
                ("width".to_string(), Amf0Value::Number(1280.0)),
                ("height".to_string(), Amf0Value::Number(720.0)),
                ("stereo".to_string(), Amf0Value::Boolean(true)),
            ]),
        ];
        let bytes = encode_all(&values).unwrap();
        assert_eq!(decode_all(&bytes).unwrap(), values);
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode_all(&[]).unwrap().is_empty());
    }
}
