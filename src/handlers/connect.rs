use crate::{Error, Result};
use crate::amf::Amf0Value;
use crate::connection::{Session, SessionState};
use crate::handlers::{clean_name, CommandHandler};
use crate::protocol::control::{self, LimitType, UserControlEvent};
use crate::protocol::RtmpCommand;
use url::Url;

/// Parameters a client sends in the connect command object
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectParams {
    pub app: String,
    pub tc_url: Option<Url>,
    pub flash_ver: Option<String>,
    pub object_encoding: f64,
}

impl ConnectParams {
    pub fn from_command(command: &RtmpCommand) -> Result<Self> {
        let params = &command.command_object;

        let app = params.get_property("app")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("Missing app parameter"))?;

        let tc_url = params.get_property("tcUrl")
            .and_then(|v| v.as_str())
            .and_then(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    log::debug!("Unparseable tcUrl '{}': {}", raw, e);
                    None
                }
            });

        let flash_ver = params.get_property("flashVer")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let object_encoding = params.get_property("objectEncoding")
            .and_then(|v| v.as_number())
            .unwrap_or(0.0);

        Ok(ConnectParams {
            app: clean_name(app).to_string(),
            tc_url,
            flash_ver,
            object_encoding,
        })
    }
}

pub struct ConnectHandler;

impl ConnectHandler {
    fn connect_result(transaction_id: f64, object_encoding: f64) -> RtmpCommand {
        let props = Amf0Value::object([
            ("fmsVer", Amf0Value::string("FMS/3,5,5,2004")),
            ("capabilities", Amf0Value::Number(31.0)),
            ("mode", Amf0Value::Number(1.0)),
        ]);
        let info = Amf0Value::object([
            ("level", Amf0Value::string("status")),
            ("code", Amf0Value::string("NetConnection.Connect.Success")),
            ("description", Amf0Value::string("Connection succeeded.")),
            ("objectEncoding", Amf0Value::Number(object_encoding)),
        ]);
        RtmpCommand::result(transaction_id, props, info)
    }
}

#[async_trait::async_trait]
impl CommandHandler for ConnectHandler {
    fn command_name(&self) -> &str {
        "connect"
    }

    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        if !session.state().can_connect() {
            return Err(Error::invalid_state(format!("connect in state {:?}", session.state())));
        }

        let params = ConnectParams::from_command(&command)?;
        log::info!(
            "Session {}: connect app='{}' tcUrl={:?} flashVer={:?}",
            session.id(),
            params.app,
            params.tc_url.as_ref().map(Url::as_str),
            params.flash_ver
        );
        session.set_app(params.app, params.tc_url);

        let config = session.config();
        let window_ack_size = config.window_ack_size;
        let peer_bandwidth = config.peer_bandwidth;
        let chunk_size = config.chunk_size;

        session.send(control::window_ack_size(window_ack_size)).await?;
        session.send(control::set_peer_bandwidth(peer_bandwidth, LimitType::Dynamic)).await?;
        session.send(control::set_chunk_size(chunk_size)).await?;
        session.send(control::user_control(UserControlEvent::StreamBegin(0))).await?;
        session.send_command(Self::connect_result(command.transaction_id, params.object_encoding), 0).await?;

        session.set_state(SessionState::Connected);
        Ok(())
    }
}
