use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::error::{RelayError, Result};
use crate::http::connection::Connection;

/// Pause after a failed accept before trying again
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Listener {
    inner: TcpListener,
    settings: Arc<Settings>,
    active: Arc<AtomicUsize>,
}

/// Counts a connection task as active until dropped
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Listener {
    pub async fn bind(settings: Arc<Settings>) -> Result<Self> {
        let inner = TcpListener::bind((settings.listen_host(), settings.listen_port))
            .await
            .map_err(|source| RelayError::Bind {
                addr: settings.listen_display(),
                source,
            })?;

        Ok(Self {
            inner,
            settings,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    /// Connections currently being served. Informational only.
    pub fn active_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active)
    }

    /// Accept until `shutdown` completes. Connections already handed to a task
    /// keep running after this returns.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        match self.local_addr() {
            Ok(addr) => info!(
                "Listening on {}, relaying to {}",
                addr,
                self.settings.upstream_display()
            ),
            Err(_) => info!("Listening on {}", self.settings.listen_display()),
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Listener stopped accepting connections");
                    break;
                }

                accepted = self.inner.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            // Errors like EMFILE persist; don't spin on them.
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };
                    info!("Inbound connection from {}", peer);

                    let settings = Arc::clone(&self.settings);
                    let guard = ActiveGuard::enter(&self.active);
                    tokio::spawn(async move {
                        let _guard = guard;
                        let mut conn = Connection::new(socket, settings);
                        if let Err(e) = conn.run().await {
                            tracing::debug!(peer = %peer, error = %e, "Connection closed early");
                        }
                    });
                }
            }
        }
    }
}

/// Bind and serve until `shutdown` completes.
pub async fn run<F>(settings: Arc<Settings>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = Listener::bind(settings).await?;
    listener.run_until(shutdown).await;
    Ok(())
}
