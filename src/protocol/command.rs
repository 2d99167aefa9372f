use crate::amf::{decode_all, encode_all, Amf0Value};
use crate::protocol::{RtmpHeader, RtmpPacket};
use crate::{Error, Result};

/// AMF0 command message: `[name, transaction id, command object, args...]`
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpCommand {
    pub name: String,
    pub transaction_id: f64,
    pub command_object: Amf0Value,
    pub arguments: Vec<Amf0Value>,
}

impl RtmpCommand {
    pub fn new(name: impl Into<String>, transaction_id: f64) -> Self {
        RtmpCommand {
            name: name.into(),
            transaction_id,
            command_object: Amf0Value::Null,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, value: Amf0Value) -> Self {
        self.arguments.push(value);
        self
    }

    /// connect command as sent by a client
    pub fn connect(app: &str, tc_url: &str) -> Self {
        let mut cmd = RtmpCommand::new("connect", 1.0);
        cmd.command_object = Amf0Value::object([
            ("app", Amf0Value::string(app)),
            ("type", Amf0Value::string("nonprivate")),
            ("flashVer", Amf0Value::string("FMLE/3.0 (compatible; FMSc/1.0)")),
            ("tcUrl", Amf0Value::string(tc_url)),
        ]);
        cmd
    }

    pub fn create_stream(transaction_id: f64) -> Self {
        RtmpCommand::new("createStream", transaction_id)
    }

    pub fn publish(stream_name: &str, publish_type: &str) -> Self {
        RtmpCommand::new("publish", 0.0)
            .with_argument(Amf0Value::string(stream_name))
            .with_argument(Amf0Value::string(publish_type))
    }

    pub fn play(stream_name: &str) -> Self {
        RtmpCommand::new("play", 0.0)
            .with_argument(Amf0Value::string(stream_name))
            .with_argument(Amf0Value::Number(-2.0))
    }

    /// `_result` reply echoing the request's transaction id
    pub fn result(transaction_id: f64, command_object: Amf0Value, info: Amf0Value) -> Self {
        let mut cmd = RtmpCommand::new("_result", transaction_id).with_argument(info);
        cmd.command_object = command_object;
        cmd
    }

    /// onStatus event with the usual `{level, code, description}` info object
    pub fn on_status(code: &str, description: &str) -> Self {
        let level = if code.ends_with("Failed") || code.ends_with("BadName") {
            "error"
        } else {
            "status"
        };
        RtmpCommand::new("onStatus", 0.0).with_argument(Amf0Value::object([
            ("level", Amf0Value::string(level)),
            ("code", Amf0Value::string(code)),
            ("description", Amf0Value::string(description)),
        ]))
    }

    /// First string argument, e.g. the stream name of publish/play
    pub fn stream_name(&self) -> Option<&str> {
        self.arguments.first().and_then(|v| v.as_str())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut values = Vec::with_capacity(3 + self.arguments.len());
        values.push(Amf0Value::String(self.name.clone()));
        values.push(Amf0Value::Number(self.transaction_id));
        values.push(self.command_object.clone());
        values.extend(self.arguments.iter().cloned());
        encode_all(&values)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut values = decode_all(data)?.into_iter();

        let name = match values.next() {
            Some(Amf0Value::String(name)) => name,
            _ => return Err(Error::amf_decode("Command name must be string")),
        };
        let transaction_id = match values.next() {
            Some(Amf0Value::Number(id)) => id,
            // Some encoders omit everything after the name.
            None => 0.0,
            Some(_) => return Err(Error::amf_decode("Transaction ID must be number")),
        };
        let command_object = values.next().unwrap_or(Amf0Value::Null);

        Ok(RtmpCommand {
            name,
            transaction_id,
            command_object,
            arguments: values.collect(),
        })
    }

    /// Encode into a command message on the given message stream
    pub fn to_packet(&self, stream_id: u32) -> Result<RtmpPacket> {
        Ok(RtmpPacket::new(RtmpHeader::command(stream_id), self.encode()?))
    }
}
