//! Network link probing and reconnection

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// Network credentials (name/secret pair)
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Network name
    pub ssid: String,
    /// Network secret; never logged
    pub secret: String,
}

/// Link error types
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Link down: {0}")]
    Down(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Connectivity to the upstream network.
///
/// `reconnect` must be a single bounded attempt; indefinite retry is the
/// supervisor's job, between watchdog renewals.
pub trait NetworkLink: Send {
    /// Check whether the link currently carries traffic.
    fn is_up(&mut self) -> impl Future<Output = bool> + Send;

    /// Attempt to restore the link with the given credentials.
    fn reconnect(
        &mut self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;
}

/// Link check backed by a TCP connect probe against a fixed address,
/// typically the local gateway. The platform owns the actual wireless
/// association; a successful probe means the link carries traffic again.
pub struct TcpProbe {
    addr: String,
    probe_timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            probe_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_timeout(addr: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            probe_timeout,
        }
    }

    async fn probe(&self) -> Result<(), LinkError> {
        match timeout(self.probe_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(LinkError::Down(format!("{}: {}", self.addr, e))),
            Err(_) => Err(LinkError::Timeout(self.probe_timeout)),
        }
    }
}

impl NetworkLink for TcpProbe {
    async fn is_up(&mut self) -> bool {
        let up = self.probe().await.is_ok();
        debug!("link probe against {}: up={}", self.addr, up);
        up
    }

    async fn reconnect(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        info!("reconnecting to network '{}'", credentials.ssid);
        self.probe().await
    }
}

/// Always-up link for development setups without a gateway to probe.
pub struct StaticLink;

impl NetworkLink for StaticLink {
    async fn is_up(&mut self) -> bool {
        true
    }

    async fn reconnect(&mut self, _credentials: &Credentials) -> Result<(), LinkError> {
        Ok(())
    }
}
