use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, info};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::response::ResponseSet;

/// Accept queue depth. Intentionally tiny for a stress-test target.
const BACKLOG: u32 = 2;

/// Startup failure while setting up the listening socket. Each stage gets
/// its own exit code.
#[derive(Debug)]
pub enum BindError {
    Socket(io::Error),
    Bind(io::Error),
    Listen(io::Error),
}

impl BindError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BindError::Socket(_) => 4,
            BindError::Bind(_) => 5,
            BindError::Listen(_) => 6,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Socket(e) => write!(f, "Socket error: {e}"),
            BindError::Bind(e) => write!(f, "Bind error: {e}"),
            BindError::Listen(e) => write!(f, "Listen error: {e}"),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::Socket(e) | BindError::Bind(e) | BindError::Listen(e) => Some(e),
        }
    }
}

/// The accept loop: owns the listening socket and the shared response
/// buffers, and is the only place connections are created.
pub struct Server {
    listener: TcpListener,
    responses: Arc<ResponseSet>,
}

impl Server {
    /// Binds to `config.port` on all interfaces. Must be called from within
    /// a tokio runtime.
    pub fn bind(config: &Config, responses: ResponseSet) -> Result<Self, BindError> {
        let socket = TcpSocket::new_v4().map_err(BindError::Socket)?;
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        socket.bind(addr).map_err(BindError::Bind)?;
        let listener = socket.listen(BACKLOG).map_err(BindError::Listen)?;

        Ok(Self {
            listener,
            responses: Arc::new(responses),
        })
    }

    /// The actual bound address; pass port 0 in `Config` to let the OS pick.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts forever. One failed accept never stops the loop, and each
    /// connection runs on its own task so a slow peer never blocks accepts.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    debug!("Accept error: {}", e);
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let responses = Arc::clone(&self.responses);
            tokio::spawn(async move {
                let conn = Connection::new(socket, responses);
                if let Err(e) = conn.run().await {
                    debug!("Connection error from {}: {}", peer, e);
                }
            });
        }
    }
}
