/// Ordered AMF0 property list. Order is kept so encoded replies are stable.
pub type Amf0Object = Vec<(String, Amf0Value)>;

/// AMF0 data types
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    Number(f64),                            // 0x00
    Boolean(bool),                          // 0x01
    String(String),                         // 0x02
    Object(Amf0Object),                     // 0x03
    Null,                                   // 0x05
    Undefined,                              // 0x06
    EcmaArray(Amf0Object),                  // 0x08
    StrictArray(Vec<Amf0Value>),            // 0x0A
    Date(f64, i16),                         // 0x0B
    LongString(String),                     // 0x0C
    Unsupported,                            // 0x0D
    XmlDocument(String),                    // 0x0F
    TypedObject(String, Amf0Object),        // 0x10
}

// AMF0 type markers
pub mod markers {
    pub const NUMBER: u8 = 0x00;
    pub const BOOLEAN: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
    pub const MOVIE_CLIP: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const UNDEFINED: u8 = 0x06;
    pub const REFERENCE: u8 = 0x07;
    pub const ECMA_ARRAY: u8 = 0x08;
    pub const OBJECT_END: u8 = 0x09;
    pub const STRICT_ARRAY: u8 = 0x0A;
    pub const DATE: u8 = 0x0B;
    pub const LONG_STRING: u8 = 0x0C;
    pub const UNSUPPORTED: u8 = 0x0D;
    pub const RECORDSET: u8 = 0x0E;
    pub const XML_DOCUMENT: u8 = 0x0F;
    pub const TYPED_OBJECT: u8 = 0x10;
    pub const AVMPLUS_OBJECT: u8 = 0x11;
}

impl Amf0Value {
    /// Build an object from borrowed keys
    pub fn object<const N: usize>(pairs: [(&str, Amf0Value); N]) -> Self {
        Amf0Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn string(value: impl Into<String>) -> Self {
        Amf0Value::String(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Property list of any object-like value
    pub fn as_object(&self) -> Option<&Amf0Object> {
        match self {
            Amf0Value::Object(obj) | Amf0Value::EcmaArray(obj) => Some(obj),
            Amf0Value::TypedObject(_, obj) => Some(obj),
            _ => None,
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object()
            .and_then(|obj| obj.iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }

    /// Check if null or undefined
    pub fn is_null(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_lookup() {
        let obj = Amf0Value::object([
            ("app", Amf0Value::string("live")),
            ("objectEncoding", Amf0Value::Number(0.0)),
        ]);
        assert_eq!(obj.get_property("app").and_then(|v| v.as_str()), Some("live"));
        assert_eq!(obj.get_property("objectEncoding").and_then(|v| v.as_number()), Some(0.0));
        assert!(obj.get_property("tcUrl").is_none());
        assert!(Amf0Value::Null.get_property("app").is_none());
    }

    #[test]
    fn test_ecma_array_is_object_like() {
        let arr = Amf0Value::EcmaArray(vec![("width".to_string(), Amf0Value::Number(1280.0))]);
        assert_eq!(arr.get_property("width").and_then(|v| v.as_number()), Some(1280.0));
    }
}
