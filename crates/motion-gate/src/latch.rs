//! Interrupt-side motion signal latch

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Single-slot channel between the sensor interrupt path and the control
/// loop. The producer side only stores a timestamp and sets a flag; no
/// allocation, no blocking, no I/O. Only the latest edge matters, so
/// later edges overwrite earlier ones.
pub struct SensorLatch {
    /// Reference point for the millisecond offsets held in `last_edge_ms`
    epoch: Instant,
    /// Set by the producer, cleared by the consumer
    fired: AtomicBool,
    /// Milliseconds since `epoch` of the most recent edge
    last_edge_ms: AtomicU64,
}

impl SensorLatch {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            fired: AtomicBool::new(false),
            last_edge_ms: AtomicU64::new(0),
        }
    }

    /// Record a rising edge at the current instant. Safe to call from a
    /// signal handler or interrupt-style callback.
    pub fn record_edge(&self) {
        self.record_edge_at(Instant::now());
    }

    /// Record a rising edge at an explicit instant.
    pub fn record_edge_at(&self, now: Instant) {
        let offset_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        self.last_edge_ms.store(offset_ms, Ordering::Relaxed);
        self.fired.store(true, Ordering::Release);
    }

    /// Consume the pending edge, if any, returning the instant it was
    /// recorded at.
    pub(crate) fn take(&self) -> Option<Instant> {
        if self.fired.swap(false, Ordering::Acquire) {
            let offset_ms = self.last_edge_ms.load(Ordering::Relaxed);
            Some(self.epoch + Duration::from_millis(offset_ms))
        } else {
            None
        }
    }
}

impl Default for SensorLatch {
    fn default() -> Self {
        Self::new()
    }
}
