use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::http::detect;
use crate::http::response::ResponseSet;

/// Largest slice of a request pulled off the socket in one step.
pub const READ_BUFFER_SIZE: usize = 1024;

/// One accepted socket. The driving task is the sole owner: `run` consumes
/// the connection, and the socket is closed exactly once when it returns.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    responses: Arc<ResponseSet>,
}

/// Outcome of a single read-classify-respond step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    KeepOpen,
    Close,
}

impl Connection {
    pub fn new(stream: TcpStream, responses: Arc<ResponseSet>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            responses,
        }
    }

    /// Drives the connection until it closes: each iteration handles one
    /// request chunk and either answers it or tears the socket down.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            match self.step().await? {
                Step::KeepOpen => continue,
                Step::Close => break,
            }
        }
        Ok(())
    }

    /// One pass of the engine. No request state survives between passes;
    /// every chunk is classified on its own.
    async fn step(&mut self) -> anyhow::Result<Step> {
        self.buffer.clear();

        let n = match self.stream.read_buf(&mut self.buffer).await {
            Ok(n) => n,
            Err(e) => {
                // A reset peer gets no response; the socket is torn down
                // instead of staying registered.
                debug!("Read error: {}", e);
                return Ok(Step::Close);
            }
        };

        if n == 0 {
            trace!("Peer closed connection");
            return Ok(Step::Close);
        }

        debug!("Read {} bytes", n);
        trace!("Request bytes: {:?}", String::from_utf8_lossy(&self.buffer));

        if detect::wants_keep_alive(&self.buffer) {
            self.stream
                .write_all(self.responses.keep_alive.as_bytes())
                .await?;
            Ok(Step::KeepOpen)
        } else {
            self.stream
                .write_all(self.responses.close.as_bytes())
                .await?;
            self.stream.shutdown().await?;
            Ok(Step::Close)
        }
    }
}
