use crate::amf::amf0::{markers, Amf0Object, Amf0Value};
use crate::{ByteBuffer, Error, Result};

/// Deepest object/array nesting accepted from a peer
pub const MAX_NESTING_DEPTH: usize = 64;

pub struct Amf0Decoder<'a> {
    buffer: &'a mut ByteBuffer,
    /// Complex values seen so far, addressable by reference markers
    references: Vec<Amf0Value>,
    depth: usize,
}

impl<'a> Amf0Decoder<'a> {
    pub fn new(buffer: &'a mut ByteBuffer) -> Self {
        Amf0Decoder {
            buffer,
            references: Vec::new(),
            depth: 0,
        }
    }

    /// Check if decoder has remaining data to decode
    pub fn has_remaining(&self) -> bool {
        self.buffer.remaining() > 0
    }

    /// Decode the next value. Running out of bytes is reported as an AMF
    /// error rather than an I/O one, since the payload is already in memory.
    pub fn decode(&mut self) -> Result<Amf0Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::amf_decode("AMF0 nesting too deep"));
        }

        self.depth += 1;
        let result = match self.decode_value() {
            Err(Error::Io(e)) => Err(Error::amf_decode(format!("Truncated AMF0 value: {}", e))),
            other => other,
        };
        self.depth -= 1;
        result
    }

    fn decode_value(&mut self) -> Result<Amf0Value> {
        let marker = self.buffer.read_u8()?;
        match marker {
            markers::NUMBER => Ok(Amf0Value::Number(self.buffer.read_f64_be()?)),
            markers::BOOLEAN => Ok(Amf0Value::Boolean(self.buffer.read_u8()? != 0)),
            markers::STRING => {
                let len = self.buffer.read_u16_be()? as usize;
                Ok(Amf0Value::String(self.read_utf8(len)?))
            }
            markers::OBJECT => {
                let object = Amf0Value::Object(self.decode_properties()?);
                self.references.push(object.clone());
                Ok(object)
            }
            markers::NULL => Ok(Amf0Value::Null),
            markers::UNDEFINED => Ok(Amf0Value::Undefined),
            markers::REFERENCE => {
                let index = self.buffer.read_u16_be()? as usize;
                self.references
                    .get(index)
                    .cloned()
                    .ok_or_else(|| Error::amf_decode(format!("Dangling AMF0 reference {}", index)))
            }
            markers::ECMA_ARRAY => {
                let _count = self.buffer.read_u32_be()?; // advisory only
                let array = Amf0Value::EcmaArray(self.decode_properties()?);
                self.references.push(array.clone());
                Ok(array)
            }
            markers::STRICT_ARRAY => {
                let count = self.buffer.read_u32_be()? as usize;
                let mut values = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    values.push(self.decode()?);
                }
                let array = Amf0Value::StrictArray(values);
                self.references.push(array.clone());
                Ok(array)
            }
            markers::DATE => {
                let timestamp = self.buffer.read_f64_be()?;
                let timezone = self.buffer.read_i16_be()?;
                Ok(Amf0Value::Date(timestamp, timezone))
            }
            markers::LONG_STRING => {
                let len = self.buffer.read_u32_be()? as usize;
                Ok(Amf0Value::LongString(self.read_utf8(len)?))
            }
            markers::UNSUPPORTED => Ok(Amf0Value::Unsupported),
            markers::XML_DOCUMENT => {
                let len = self.buffer.read_u32_be()? as usize;
                Ok(Amf0Value::XmlDocument(self.read_utf8(len)?))
            }
            markers::TYPED_OBJECT => {
                let len = self.buffer.read_u16_be()? as usize;
                let class_name = self.read_utf8(len)?;
                let object = Amf0Value::TypedObject(class_name, self.decode_properties()?);
                self.references.push(object.clone());
                Ok(object)
            }
            markers::MOVIE_CLIP | markers::RECORDSET => {
                Err(Error::amf_decode(format!("Reserved AMF0 marker: 0x{:02x}", marker)))
            }
            markers::AVMPLUS_OBJECT => Err(Error::amf_decode("AMF3 values are not supported")),
            _ => Err(Error::amf_decode(format!("Unknown AMF0 marker: 0x{:02x}", marker))),
        }
    }

    /// Key/value pairs up to the empty-key object end marker
    fn decode_properties(&mut self) -> Result<Amf0Object> {
        let mut properties = Vec::new();
        loop {
            let name_len = self.buffer.read_u16_be()? as usize;
            if name_len == 0 {
                let end = self.buffer.read_u8()?;
                if end != markers::OBJECT_END {
                    return Err(Error::amf_decode(format!(
                        "Expected object end marker, got 0x{:02x}",
                        end
                    )));
                }
                return Ok(properties);
            }
            let name = self.read_utf8(name_len)?;
            let value = self.decode()?;
            properties.push((name, value));
        }
    }

    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.buffer.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| Error::amf_decode(format!("Invalid UTF-8: {}", e)))
    }
}
