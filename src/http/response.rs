use std::collections::TryReserveError;
use std::fmt;

use bytes::Bytes;

const SERVER_TOKEN: &str = concat!("punchbag/", env!("CARGO_PKG_VERSION"));

/// Which `Connection` header a precomputed response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Close,
    KeepAlive,
}

impl Variant {
    pub fn connection_value(&self) -> &'static str {
        match self {
            Variant::Close => "close",
            Variant::KeepAlive => "keep-alive",
        }
    }
}

/// Response buffer allocation failed. Fatal at startup: the server must not
/// come up with only one of its two buffers.
#[derive(Debug)]
pub struct BuildError(TryReserveError);

impl BuildError {
    pub fn exit_code(&self) -> u8 {
        3
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to allocate response buffer: {}", self.0)
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<TryReserveError> for BuildError {
    fn from(e: TryReserveError) -> Self {
        BuildError(e)
    }
}

/// A complete response, formatted once at startup and written verbatim to
/// every matching request. Immutable and shared read-only across all
/// connections for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecomputedResponse {
    bytes: Bytes,
}

impl PrecomputedResponse {
    /// Formats the response for `body` and `variant`. Pure function of its
    /// inputs: the same arguments always produce byte-identical buffers.
    pub fn build(body: &[u8], variant: Variant) -> Result<Self, BuildError> {
        let content_length = body.len().to_string();

        // LF line endings and this exact header order are part of the fixed
        // wire format.
        let head = [
            "HTTP/1.1 200 OK\n",
            "Server: ",
            SERVER_TOKEN,
            "\n",
            "Content-Type: text/html\n",
            "Content-Length: ",
            content_length.as_str(),
            "\n",
            "Connection: ",
            variant.connection_value(),
            "\n",
            "Accept-Ranges: bytes\n",
            "\n",
        ];

        let total = head.iter().map(|part| part.len()).sum::<usize>() + body.len();
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(total)?;
        for part in head {
            bytes.extend_from_slice(part.as_bytes());
        }
        bytes.extend_from_slice(body);

        Ok(Self {
            bytes: Bytes::from(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Both response variants for one configured body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSet {
    pub close: PrecomputedResponse,
    pub keep_alive: PrecomputedResponse,
}

impl ResponseSet {
    pub fn build(body: &[u8]) -> Result<Self, BuildError> {
        Ok(Self {
            close: PrecomputedResponse::build(body, Variant::Close)?,
            keep_alive: PrecomputedResponse::build(body, Variant::KeepAlive)?,
        })
    }
}
