//! Motion Gate for Streaming Authorization
//!
//! A two-state machine (Idle/Armed) that turns motion sensor edges into
//! a standing streaming permit with timed decay. The sensor side writes
//! into a single-slot latch from an interrupt-like context; the control
//! loop drains the latch and evaluates transitions on a periodic tick.

mod gate;
mod latch;

pub use gate::{GateConfig, GateEvent, GateMonitor, GateState, MotionGate};
pub use latch::SensorLatch;
