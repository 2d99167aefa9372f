mod state;
mod c0c1;
mod s0s1s2;

pub use state::*;
pub use c0c1::*;
pub use s0s1s2::*;

use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Run the server side of the handshake.
///
/// Reads C0+C1, answers with S0+S1+S2 in one write, then reads C2. C2 is
/// not checked against S1.
pub async fn server_handshake<R, W>(reader: &mut R, writer: &mut W) -> Result<HandshakeMode>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut c0c1_buf = vec![0u8; 1 + HANDSHAKE_SIZE];
    reader.read_exact(&mut c0c1_buf).await
        .map_err(|e| Error::handshake(format!("Failed to read C0+C1: {}", e)))?;

    let c0c1 = C0C1::parse(&c0c1_buf)?;
    let response = S0S1S2::generate(&c0c1)?;
    log::debug!("Client handshake mode: {:?}", response.mode);

    writer.write_all(&response.encode()).await
        .map_err(|e| Error::handshake(format!("Failed to write S0+S1+S2: {}", e)))?;
    writer.flush().await
        .map_err(|e| Error::handshake(format!("Failed to flush: {}", e)))?;

    let mut c2_buf = vec![0u8; HANDSHAKE_SIZE];
    reader.read_exact(&mut c2_buf).await
        .map_err(|e| Error::handshake(format!("Failed to read C2: {}", e)))?;

    Ok(response.mode)
}
