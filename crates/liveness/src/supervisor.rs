//! Supervisor tick loop state

use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::link::{Credentials, NetworkLink};
use crate::watchdog::Watchdog;

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Cadence the owner drives [`Supervisor::tick`] at
    pub tick_interval: Duration,
    /// Watchdog deadline; the device restarts if renewal stops this long
    pub watchdog_timeout: Duration,
    /// Emit a heartbeat marker every N ticks
    pub heartbeat_every: u64,
    /// First reconnection backoff delay
    pub backoff_initial: Duration,
    /// Backoff ceiling
    pub backoff_max: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            watchdog_timeout: Duration::from_secs(10),
            heartbeat_every: 30,
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
        }
    }
}

/// Process-wide liveness bookkeeping, owned by the supervisor.
#[derive(Debug)]
pub struct LivenessState {
    /// Whether the network link currently carries traffic
    pub link_up: bool,
    /// Instant of the last heartbeat marker
    pub last_heartbeat: Option<Instant>,
    /// Deadline the watchdog will fire at unless renewed
    pub watchdog_deadline: Option<Instant>,
    /// Consecutive failed reconnection attempts
    pub consecutive_failures: u32,
    /// Earliest instant of the next reconnection attempt
    pub next_retry: Option<Instant>,
    backoff: Duration,
}

/// Liveness supervisor.
///
/// The owner calls [`Supervisor::tick`] once per control-loop pass. Each
/// tick renews the watchdog first, then advances link recovery by at
/// most one bounded attempt, then emits the heartbeat on its cadence.
/// The responsibilities are independent: a failing watchdog write does
/// not stop link recovery and vice versa.
pub struct Supervisor<L, W> {
    config: SupervisorConfig,
    credentials: Credentials,
    link: L,
    watchdog: W,
    state: LivenessState,
    ticks: u64,
}

impl<L: NetworkLink, W: Watchdog> Supervisor<L, W> {
    pub fn new(config: SupervisorConfig, credentials: Credentials, link: L, watchdog: W) -> Self {
        let backoff = config.backoff_initial;
        Self {
            config,
            credentials,
            link,
            watchdog,
            state: LivenessState {
                link_up: false,
                last_heartbeat: None,
                watchdog_deadline: None,
                consecutive_failures: 0,
                next_retry: None,
                backoff,
            },
            ticks: 0,
        }
    }

    /// Current liveness bookkeeping.
    pub fn state(&self) -> &LivenessState {
        &self.state
    }

    /// Run one supervision pass.
    pub async fn tick(&mut self, now: Instant) {
        // Watchdog first: reconnection must never starve it
        match self.watchdog.renew() {
            Ok(()) => {
                self.state.watchdog_deadline = Some(now + self.config.watchdog_timeout);
            }
            Err(e) => error!("watchdog renewal failed: {}", e),
        }

        if self.state.link_up {
            if !self.link.is_up().await {
                warn!("network link lost");
                self.state.link_up = false;
                self.state.backoff = self.config.backoff_initial;
                self.state.next_retry = Some(now);
            }
        } else if self.state.next_retry.map_or(true, |at| now >= at) {
            match self.link.reconnect(&self.credentials).await {
                Ok(()) => {
                    info!(
                        "network link restored after {} failed attempts",
                        self.state.consecutive_failures
                    );
                    self.state.link_up = true;
                    self.state.consecutive_failures = 0;
                    self.state.backoff = self.config.backoff_initial;
                    self.state.next_retry = None;
                }
                Err(e) => {
                    self.state.consecutive_failures += 1;
                    warn!(
                        "reconnect attempt {} failed: {}; next try in {}ms",
                        self.state.consecutive_failures,
                        e,
                        self.state.backoff.as_millis()
                    );
                    self.state.next_retry = Some(now + self.state.backoff);
                    self.state.backoff =
                        (self.state.backoff * 2).min(self.config.backoff_max);
                }
            }
        }

        if self.ticks % self.config.heartbeat_every == 0 {
            info!(
                "alive: link_up={} failures={}",
                self.state.link_up, self.state.consecutive_failures
            );
            self.state.last_heartbeat = Some(now);
        }
        self.ticks += 1;
    }
}
