use crate::amf::amf0::{markers, Amf0Object, Amf0Value};
use crate::{ByteBuffer, Error, Result};

pub struct Amf0Encoder {
    buffer: ByteBuffer,
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Amf0Encoder {
    pub fn new() -> Self {
        Amf0Encoder {
            buffer: ByteBuffer::with_capacity(256),
        }
    }

    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => {
                self.buffer.write_u8(markers::NUMBER)?;
                self.buffer.write_f64_be(*n)?;
            }
            Amf0Value::Boolean(b) => {
                self.buffer.write_u8(markers::BOOLEAN)?;
                self.buffer.write_u8(u8::from(*b))?;
            }
            Amf0Value::String(s) if s.len() > u16::MAX as usize => {
                self.encode_long_string(markers::LONG_STRING, s)?;
            }
            Amf0Value::String(s) => {
                self.buffer.write_u8(markers::STRING)?;
                self.write_short_utf8(s)?;
            }
            Amf0Value::Object(obj) => {
                self.buffer.write_u8(markers::OBJECT)?;
                self.write_properties(obj)?;
            }
            Amf0Value::Null => self.buffer.write_u8(markers::NULL)?,
            Amf0Value::Undefined => self.buffer.write_u8(markers::UNDEFINED)?,
            Amf0Value::EcmaArray(obj) => {
                self.buffer.write_u8(markers::ECMA_ARRAY)?;
                self.buffer.write_u32_be(obj.len() as u32)?;
                self.write_properties(obj)?;
            }
            Amf0Value::StrictArray(values) => {
                self.buffer.write_u8(markers::STRICT_ARRAY)?;
                self.buffer.write_u32_be(values.len() as u32)?;
                for v in values {
                    self.encode(v)?;
                }
            }
            Amf0Value::Date(timestamp, timezone) => {
                self.buffer.write_u8(markers::DATE)?;
                self.buffer.write_f64_be(*timestamp)?;
                self.buffer.write_i16_be(*timezone)?;
            }
            Amf0Value::LongString(s) => self.encode_long_string(markers::LONG_STRING, s)?,
            Amf0Value::Unsupported => self.buffer.write_u8(markers::UNSUPPORTED)?,
            Amf0Value::XmlDocument(xml) => self.encode_long_string(markers::XML_DOCUMENT, xml)?,
            Amf0Value::TypedObject(class_name, obj) => {
                self.buffer.write_u8(markers::TYPED_OBJECT)?;
                self.write_short_utf8(class_name)?;
                self.write_properties(obj)?;
            }
        }
        Ok(())
    }

    fn encode_long_string(&mut self, marker: u8, value: &str) -> Result<()> {
        self.buffer.write_u8(marker)?;
        self.buffer.write_u32_be(value.len() as u32)?;
        self.buffer.write_bytes(value.as_bytes())?;
        Ok(())
    }

    /// u16 length prefix, no marker (strings, object keys, class names)
    fn write_short_utf8(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| Error::amf_encode(format!("String too long: {} bytes", value.len())))?;
        self.buffer.write_u16_be(len)?;
        self.buffer.write_bytes(value.as_bytes())?;
        Ok(())
    }

    fn write_properties(&mut self, obj: &Amf0Object) -> Result<()> {
        for (key, value) in obj {
            self.write_short_utf8(key)?;
            self.encode(value)?;
        }
        self.buffer.write_u16_be(0)?;
        self.buffer.write_u8(markers::OBJECT_END)?;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer.into_vec()
    }
}
