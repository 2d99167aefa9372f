use crate::connection::{Session, SessionState};
use crate::flv::FlvTag;
use crate::handlers::{clean_name, CommandHandler};
use crate::protocol::control::{self, UserControlEvent};
use crate::protocol::RtmpPacket;
use crate::stream::BroadcastReader;
use crate::{Error, Result, RtmpCommand, MEDIA_STREAM_ID};
use tokio::sync::mpsc;

pub struct PlayHandler;

impl PlayHandler {
    fn status_messages(stream_name: &str) -> Vec<RtmpCommand> {
        vec![
            RtmpCommand::on_status("NetStream.Play.Reset", &format!("Playing and resetting {}.", stream_name)),
            RtmpCommand::on_status("NetStream.Play.Start", &format!("Started playing {}.", stream_name)),
            RtmpCommand::on_status("NetStream.Data.Start", "Data start."),
            RtmpCommand::on_status("NetStream.Play.PublishNotify", &format!("{} is now published.", stream_name)),
        ]
    }
}

/// Forward room tags to a player until the room ends or the connection's
/// writer goes away, then tell the player the stream is over.
pub async fn pump(
    mut reader: Box<dyn BroadcastReader<FlvTag>>,
    sender: mpsc::Sender<RtmpPacket>,
    stream_name: String,
) {
    while let Some(tag) = reader.read().await {
        if sender.send(tag.to_packet(MEDIA_STREAM_ID)).await.is_err() {
            return;
        }
    }

    log::debug!("Stream {} ended, notifying player", stream_name);
    let _ = sender.send(control::user_control(UserControlEvent::StreamEof(MEDIA_STREAM_ID))).await;
    let status = RtmpCommand::on_status(
        "NetStream.Play.UnpublishNotify",
        &format!("{} is now unpublished.", stream_name),
    );
    match status.to_packet(MEDIA_STREAM_ID) {
        Ok(packet) => {
            let _ = sender.send(packet).await;
        }
        Err(e) => log::warn!("Failed to encode UnpublishNotify: {}", e),
    }
}

#[async_trait::async_trait]
impl CommandHandler for PlayHandler {
    fn command_name(&self) -> &str {
        "play"
    }

    async fn handle(&self, command: RtmpCommand, session: &mut Session) -> Result<()> {
        if !session.state().can_start_stream() {
            return Err(Error::invalid_state(format!("play in state {:?}", session.state())));
        }

        let stream_name = command.stream_name()
            .map(clean_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::protocol("play without stream name"))?
            .to_string();

        let app_name = session.app().unwrap_or_default().to_string();
        let Some(app) = session.registry().app(&app_name) else {
            log::warn!("Session {}: play from unknown app '{}'", session.id(), app_name);
            return Ok(());
        };

        log::info!("Session {}: playing {}/{}", session.id(), app_name, stream_name);
        let room = app.get_or_create(&stream_name).await;
        let reader = room.join().await;

        session.send(control::user_control(UserControlEvent::StreamBegin(MEDIA_STREAM_ID))).await?;
        for status in Self::status_messages(&stream_name) {
            session.send_command(status, MEDIA_STREAM_ID).await?;
        }

        let pump = tokio::spawn(pump(reader, session.sender(), stream_name));
        session.attach_player(room, pump).await;
        session.set_state(SessionState::Playing);
        Ok(())
    }
}
