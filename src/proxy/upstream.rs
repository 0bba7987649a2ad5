//! Upstream connection and request forwarding
//!
//! Every request gets a fresh connection to the configured provider. Nothing
//! is pooled and nothing is retried.

use crate::config::{Settings, format_host_port};
use crate::error::{RelayError, Result};
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Sends rewritten requests to the upstream provider
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    host: String,
    port: u16,
    max_response_bytes: usize,
    idle_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(host: impl Into<String>, port: u16, max_response_bytes: usize) -> Self {
        Self {
            host: host.into(),
            port,
            max_response_bytes,
            idle_timeout: Duration::from_millis(250),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.upstream_host.clone(),
            settings.upstream_port,
            settings.max_response_bytes,
        )
        .with_idle_timeout(settings.response_idle_timeout())
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn addr(&self) -> String {
        format_host_port(&self.host, self.port)
    }

    /// Deliver `request` and capture one response.
    ///
    /// The returned buffer holds at most `max_response_bytes`; anything the
    /// upstream sends beyond that is dropped.
    pub async fn send(&self, request: &str) -> Result<Bytes> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| RelayError::Connect {
                addr: self.addr(),
                source,
            })?;

        tracing::trace!(upstream = %self.addr(), "Connected to upstream");

        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        let response = self.read_response(&mut stream).await?;

        tracing::debug!(
            upstream = %self.addr(),
            bytes = response.len(),
            "Received upstream response"
        );

        Ok(response)
    }

    /// Read until the buffer is full, the upstream closes, or it goes quiet.
    ///
    /// The first read waits as long as the transport lets it. Later reads are
    /// bounded by the idle timeout so an upstream that keeps the connection
    /// open does not stall the client.
    async fn read_response(&self, stream: &mut TcpStream) -> Result<Bytes> {
        let mut buffer = BytesMut::zeroed(self.max_response_bytes);
        let mut filled = stream.read(&mut buffer[..]).await?;

        if filled > 0 {
            while filled < buffer.len() {
                match timeout(self.idle_timeout, stream.read(&mut buffer[filled..])).await {
                    Ok(Ok(0)) => break,
                    Ok(Ok(n)) => filled += n,
                    Ok(Err(e)) => {
                        // Keep what already arrived.
                        tracing::debug!(upstream = %self.addr(), error = %e, "Upstream read failed");
                        break;
                    }
                    Err(_) => {
                        tracing::trace!(upstream = %self.addr(), "Upstream went idle");
                        break;
                    }
                }
            }
        }

        buffer.truncate(filled);
        Ok(buffer.freeze())
    }
}
