use crate::amf::{decode_all, encode_all, Amf0Value};
use crate::{Error, Result};

const SET_DATA_FRAME: &str = "@setDataFrame";
pub const ON_METADATA: &str = "onMetaData";

/// AMF0 data message: a handler name followed by its values
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpData {
    pub name: String,
    pub values: Vec<Amf0Value>,
}

impl RtmpData {
    pub fn new(name: impl Into<String>, values: Vec<Amf0Value>) -> Self {
        RtmpData {
            name: name.into(),
            values,
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut values = decode_all(data)?.into_iter();
        let name = match values.next() {
            Some(Amf0Value::String(name)) => name,
            _ => return Err(Error::amf_decode("Data message name must be string")),
        };
        Ok(RtmpData {
            name,
            values: values.collect(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut values = Vec::with_capacity(1 + self.values.len());
        values.push(Amf0Value::String(self.name.clone()));
        values.extend(self.values.iter().cloned());
        encode_all(&values)
    }

    /// Encoders send `@setDataFrame, onMetaData, {...}`; players expect a
    /// plain `onMetaData, {...}`. Returns `None` for anything else.
    pub fn into_metadata(self) -> Option<RtmpData> {
        if self.name == ON_METADATA {
            return Some(self);
        }
        if self.name != SET_DATA_FRAME {
            return None;
        }
        let mut values = self.values.into_iter();
        match values.next() {
            Some(Amf0Value::String(inner)) if inner == ON_METADATA => {
                Some(RtmpData::new(inner, values.collect()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_object() -> Amf0Value {
        Amf0Value::EcmaArray(vec![("width".to_string(), Amf0Value::Number(640.0))])
    }

    #[test]
    fn test_set_data_frame_unwrapped() {
        let raw = RtmpData::new(
            SET_DATA_FRAME,
            vec![Amf0Value::string(ON_METADATA), metadata_object()],
        );
        let bytes = raw.encode().unwrap();
        let meta = RtmpData::decode(&bytes).unwrap().into_metadata().unwrap();

        assert_eq!(meta.name, ON_METADATA);
        assert_eq!(meta.values, vec![metadata_object()]);
    }

    #[test]
    fn test_plain_metadata_kept() {
        let meta = RtmpData::new(ON_METADATA, vec![metadata_object()]);
        assert_eq!(meta.clone().into_metadata(), Some(meta));
    }

    #[test]
    fn test_other_data_ignored() {
        let other = RtmpData::new("|RtmpSampleAccess", vec![Amf0Value::Boolean(true)]);
        assert!(other.into_metadata().is_none());
    }
}
