//! Gate state machine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::latch::SensorLatch;

/// Gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// How long the gate stays armed after the last motion edge
    pub inactivity_window: Duration,
    /// Capacity of the transition notification channel
    pub event_capacity: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            inactivity_window: Duration::from_secs(5),
            event_capacity: 8,
        }
    }
}

/// Authorization state of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// No recent motion; streaming is forbidden
    #[default]
    Idle,
    /// Motion within the inactivity window; streaming is permitted
    Armed,
}

/// Notification emitted on a gate transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// The gate went Idle -> Armed; a client may attach to the stream
    StreamStart,
}

/// Read-only handle to the gate, shared with session handlers.
///
/// Authorization is a plain atomic snapshot so concurrent sessions never
/// block each other or the control loop.
#[derive(Clone)]
pub struct GateMonitor {
    authorized: Arc<AtomicBool>,
    events: broadcast::Sender<GateEvent>,
}

impl GateMonitor {
    /// True iff the gate is currently Armed.
    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::Acquire)
    }

    /// Subscribe to Idle -> Armed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.events.subscribe()
    }
}

/// Motion-driven streaming authorization machine.
///
/// Owned by the control loop, which calls [`MotionGate::tick`] on a fixed
/// cadence. The sensor side writes through the shared [`SensorLatch`];
/// session handlers read through a [`GateMonitor`]. Idle is the initial
/// state and there is no terminal state.
pub struct MotionGate {
    state: GateState,
    last_activity: Option<Instant>,
    window: Duration,
    latch: Arc<SensorLatch>,
    authorized: Arc<AtomicBool>,
    events: broadcast::Sender<GateEvent>,
}

impl MotionGate {
    /// Create a new gate in the Idle state.
    pub fn new(config: GateConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            state: GateState::Idle,
            last_activity: None,
            window: config.inactivity_window,
            latch: Arc::new(SensorLatch::new()),
            authorized: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// Producer-side handle for the sensor interrupt path.
    pub fn latch(&self) -> Arc<SensorLatch> {
        Arc::clone(&self.latch)
    }

    /// Shared read-only handle for session handlers.
    pub fn monitor(&self) -> GateMonitor {
        GateMonitor {
            authorized: Arc::clone(&self.authorized),
            events: self.events.clone(),
        }
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// True iff the gate is Armed.
    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::Acquire)
    }

    /// Drain the sensor latch and evaluate transitions.
    ///
    /// A pending edge refreshes the activity timestamp and arms an Idle
    /// gate, emitting exactly one [`GateEvent::StreamStart`] per
    /// contiguous Armed interval. An Armed gate with no activity within
    /// the inactivity window decays back to Idle.
    pub fn tick(&mut self, now: Instant) {
        if let Some(edge_at) = self.latch.take() {
            self.last_activity = Some(edge_at);
            if self.state == GateState::Idle {
                self.state = GateState::Armed;
                self.authorized.store(true, Ordering::Release);
                info!("motion detected, streaming armed");
                // No receivers is fine; the event is advisory
                let _ = self.events.send(GateEvent::StreamStart);
            } else {
                debug!("motion while armed, window extended");
            }
        }

        if self.state == GateState::Armed {
            if let Some(last) = self.last_activity {
                if now.saturating_duration_since(last) >= self.window {
                    self.state = GateState::Idle;
                    self.authorized.store(false, Ordering::Release);
                    info!(
                        "no motion for {}ms, streaming disarmed",
                        self.window.as_millis()
                    );
                }
            }
        }
    }
}
