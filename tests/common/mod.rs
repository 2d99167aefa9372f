// Common test utilities and helper functions
//
// A minimal RTMP client built on the crate's chunk codec, plus packet
// builders for the media a publisher would send.

#![allow(dead_code)]

use rtmp::{
    Amf0Value, ChunkReader, ChunkWriter, RtmpCommand, RtmpData, RtmpHeader, RtmpPacket,
    RtmpServer, MSG_TYPE_COMMAND_AMF0, MSG_TYPE_SET_CHUNK_SIZE,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a server and wait until its RTMP port accepts connections
pub async fn start_server(server: RtmpServer) {
    let addr = server.config().rtmp_addr.clone();
    tokio::spawn(server.handler());
    assert!(wait_for_server(&addr, 50).await, "server did not start on {}", addr);
}

pub async fn wait_for_server(addr: &str, max_attempts: u32) -> bool {
    for _ in 0..max_attempts {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

pub struct TestClient {
    stream: TcpStream,
    reader: ChunkReader,
    writer: ChunkWriter,
    next_transaction: f64,
}

impl TestClient {
    /// Connect and complete a simple-mode handshake
    pub async fn connect(addr: &str) -> TestClient {
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let mut c0c1 = vec![0u8; 1537];
        c0c1[0] = 3;
        stream.write_all(&c0c1).await.unwrap();

        let mut s0s1s2 = vec![0u8; 1 + 1536 * 2];
        tokio::time::timeout(TIMEOUT, stream.read_exact(&mut s0s1s2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s0s1s2[0], 3);
        assert_eq!(&s0s1s2[1537..], &c0c1[1..], "S2 must echo C1 in simple mode");

        stream.write_all(&s0s1s2[1..1537]).await.unwrap();

        TestClient {
            stream,
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
            next_transaction: 1.0,
        }
    }

    pub async fn send(&mut self, packet: &RtmpPacket) {
        self.writer.write_packet(packet, &mut self.stream).await.unwrap();
    }

    pub async fn send_command(&mut self, command: RtmpCommand, stream_id: u32) {
        self.send(&command.to_packet(stream_id).unwrap()).await;
    }

    /// Next message from the server, tracking its chunk size
    pub async fn recv(&mut self) -> RtmpPacket {
        let packet = tokio::time::timeout(TIMEOUT, self.reader.read_message(&mut self.stream))
            .await
            .expect("timed out waiting for a message")
            .unwrap();

        if packet.message_type() == MSG_TYPE_SET_CHUNK_SIZE {
            let payload = packet.payload();
            let size = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
            self.reader.set_chunk_size(size).unwrap();
        }
        packet
    }

    /// Skip to the next AMF0 command
    pub async fn recv_command(&mut self) -> RtmpCommand {
        loop {
            let packet = self.recv().await;
            if packet.message_type() == MSG_TYPE_COMMAND_AMF0 {
                return RtmpCommand::decode(packet.payload()).unwrap();
            }
        }
    }

    /// Read until the peer closes the socket; true when it did
    pub async fn closed(&mut self) -> bool {
        let mut buf = [0u8; 1024];
        loop {
            match tokio::time::timeout(TIMEOUT, self.stream.read(&mut buf)).await {
                Ok(Ok(0)) | Ok(Err(_)) => return true,
                Ok(Ok(_)) => continue,
                Err(_) => return false,
            }
        }
    }

    fn transaction(&mut self) -> f64 {
        let id = self.next_transaction;
        self.next_transaction += 1.0;
        id
    }

    pub async fn connect_app(&mut self, app: &str) -> RtmpCommand {
        let mut connect = RtmpCommand::connect(app, &format!("rtmp://127.0.0.1/{}", app));
        connect.transaction_id = self.transaction();
        self.send_command(connect, 0).await;
        self.recv_command().await
    }

    pub async fn create_stream(&mut self) -> f64 {
        let transaction_id = self.transaction();
        self.send_command(RtmpCommand::create_stream(transaction_id), 0).await;
        let result = self.recv_command().await;
        assert_eq!(result.name, "_result");
        assert_eq!(result.transaction_id, transaction_id);
        result.arguments[0].as_number().unwrap()
    }

    /// connect, createStream, publish; returns the onStatus code
    pub async fn publish(&mut self, app: &str, stream: &str) -> String {
        self.connect_app(app).await;
        let stream_id = self.create_stream().await as u32;
        self.send_command(RtmpCommand::publish(stream, "live"), stream_id).await;
        status_code(&self.recv_command().await)
    }

    /// connect, createStream, play; returns the four onStatus codes
    pub async fn play(&mut self, app: &str, stream: &str) -> Vec<String> {
        self.connect_app(app).await;
        let stream_id = self.create_stream().await as u32;
        self.send_command(RtmpCommand::play(stream), stream_id).await;

        let mut codes = Vec::new();
        for _ in 0..4 {
            codes.push(status_code(&self.recv_command().await));
        }
        codes
    }
}

pub fn status_code(command: &RtmpCommand) -> String {
    command.arguments.first()
        .and_then(|info| info.get_property("code"))
        .and_then(|code| code.as_str())
        .unwrap_or_default()
        .to_string()
}

/// AVC video packet: sequence header, key frame or inter frame
pub fn video_packet(timestamp: u32, keyframe: bool, sequence_header: bool) -> RtmpPacket {
    let frame = if keyframe { 0x17 } else { 0x27 };
    let packet_type = if sequence_header { 0x00 } else { 0x01 };
    let payload = vec![frame, packet_type, 0x00, 0x00, 0x00, timestamp as u8];
    RtmpPacket::new(RtmpHeader::video(timestamp, 1), payload)
}

/// AAC audio packet: sequence header or raw frame
pub fn audio_packet(timestamp: u32, sequence_header: bool) -> RtmpPacket {
    let packet_type = if sequence_header { 0x00 } else { 0x01 };
    let payload = vec![0xAF, packet_type, 0x12, timestamp as u8];
    RtmpPacket::new(RtmpHeader::audio(timestamp, 1), payload)
}

/// `@setDataFrame onMetaData` as an encoder sends it
pub fn metadata_packet() -> RtmpPacket {
    let data = RtmpData::new(
        "@setDataFrame",
        vec![
            Amf0Value::string("onMetaData"),
            Amf0Value::EcmaArray(vec![("width".to_string(), Amf0Value::Number(1280.0))]),
        ],
    );
    RtmpPacket::new(RtmpHeader::data(0, 1), data.encode().unwrap())
}
