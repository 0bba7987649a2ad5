use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::Settings;
use crate::error::{RelayError, Result};
use crate::http::rewrite::{HEADER_TERMINATOR, rewrite_request};
use crate::proxy::UpstreamClient;

/// Bytes pulled from the client per read
pub const CHUNK_SIZE: usize = 256;

pub struct Connection {
    stream: TcpStream,
    buffer: Vec<u8>,
    settings: Arc<Settings>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Receiving,
    HeaderComplete(String),
    Forwarding(String),
    Responding(Bytes),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, settings: Arc<Settings>) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(CHUNK_SIZE * 4),
            settings,
            state: ConnectionState::Receiving,
        }
    }

    /// Serve one request and return. The stream is owned by `self`, so the
    /// socket closes when the connection is dropped whichever way this exits.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Receiving => {
                    self.state = match self.read_request().await? {
                        Some(request) => ConnectionState::HeaderComplete(request),
                        None => ConnectionState::Closed,
                    };
                }

                ConnectionState::HeaderComplete(request) => {
                    tracing::trace!(request = %request, "Received request");
                    let rewritten = rewrite_request(
                        &request,
                        &self.settings.host_header_value(),
                        &self.settings.cookie_header_value,
                    );
                    self.state = ConnectionState::Forwarding(rewritten);
                }

                ConnectionState::Forwarding(request) => {
                    let upstream = UpstreamClient::from_settings(&self.settings);
                    let response = upstream.send(&request).await?;
                    self.state = ConnectionState::Responding(response);
                }

                ConnectionState::Responding(response) => {
                    self.stream.write_all(&response).await?;
                    self.stream.shutdown().await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Read until the buffer ends with the header terminator.
    ///
    /// Returns `None` if the client hangs up first. The buffer may grow up to
    /// `max_response_bytes`; past that the connection is dropped.
    pub async fn read_request(&mut self) -> Result<Option<String>> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let limit = self.settings.max_response_bytes;

        loop {
            let n = self.stream.read(&mut chunk).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }

            self.buffer.extend_from_slice(&chunk[..n]);

            if self.buffer.ends_with(HEADER_TERMINATOR.as_bytes()) {
                let request = String::from_utf8_lossy(&self.buffer).into_owned();
                self.buffer.clear();
                return Ok(Some(request));
            }

            if self.buffer.len() > limit {
                return Err(RelayError::RequestTooLarge { limit });
            }
        }
    }
}
