//! Error types for the relay.

use thiserror::Error;

/// Failures the relay can report.
///
/// Only `Bind` and `Config` ever leave the process startup path. Everything
/// else is contained inside the connection task that produced it.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The listener could not open its socket.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The upstream provider could not be reached.
    #[error("failed to connect to upstream {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings are present but unusable.
    #[error("invalid settings: {0}")]
    Config(String),

    /// The client sent more than the limit without ending its headers.
    #[error("request exceeded {limit} bytes without a header terminator")]
    RequestTooLarge { limit: usize },

    /// Read or write failure on a client or upstream socket.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
