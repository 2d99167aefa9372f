use crate::{Error, Result};
use crate::chunk::ChunkWriter;
use crate::connection::Session;
use crate::handshake::server_handshake;
use crate::message::MessageDispatcher;
use crate::protocol::RtmpPacket;
use crate::server::{Registry, ServerConfig};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

/// One accepted RTMP socket.
///
/// The read loop runs on the calling task and owns the session. Outbound
/// packets go through a bounded queue to a writer task that owns the write
/// half and the chunk writer; players' pump tasks feed the same queue.
pub struct Connection {
    peer: String,
    registry: Arc<Registry>,
    config: Arc<ServerConfig>,
    dispatcher: Arc<MessageDispatcher>,
}

impl Connection {
    pub fn new(
        peer: impl Into<String>,
        registry: Arc<Registry>,
        config: Arc<ServerConfig>,
        dispatcher: Arc<MessageDispatcher>,
    ) -> Self {
        Connection {
            peer: peer.into(),
            registry,
            config,
            dispatcher,
        }
    }

    /// Serve the connection until the peer leaves or a fatal error occurs
    pub async fn run<S>(self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut read_half, mut write_half) = tokio::io::split(stream);

        let mode = server_handshake(&mut read_half, &mut write_half).await?;
        log::debug!("{}: handshake complete ({:?})", self.peer, mode);

        let (packet_tx, packet_rx) = mpsc::channel(self.config.outbound_queue);
        let writer = tokio::spawn(write_loop(write_half, packet_rx));

        let mut session = Session::new(self.registry.clone(), self.config.clone(), packet_tx);
        log::info!("{}: session {} started", self.peer, session.id());

        let result = self.read_loop(&mut read_half, &mut session).await;

        session.detach().await;
        log::info!("{}: session {} closed", self.peer, session.id());
        drop(session);
        writer.abort();

        result
    }

    async fn read_loop<R>(&self, reader: &mut R, session: &mut Session) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let packet = match session.chunk_reader().read_message(reader).await {
                Ok(packet) => packet,
                Err(Error::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            };

            if let Err(e) = self.dispatcher.dispatch(session, packet).await {
                if e.is_fatal() {
                    return Err(e);
                }
                log::warn!("Session {}: dropped message: {}", session.id(), e);
            }
        }
    }
}

async fn write_loop<W>(mut writer: W, mut packets: mpsc::Receiver<RtmpPacket>)
where
    W: AsyncWrite + Unpin,
{
    let mut chunk_writer = ChunkWriter::new();
    while let Some(packet) = packets.recv().await {
        if let Err(e) = chunk_writer.write_packet(&packet, &mut writer).await {
            log::debug!("Write failed: {}", e);
            break;
        }
    }
}
