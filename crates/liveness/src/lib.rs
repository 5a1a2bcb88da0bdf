//! Liveness Supervision
//!
//! Background responsibilities that keep the device reachable across
//! failures: network link probing with bounded-backoff reconnection,
//! hardware watchdog renewal, and periodic heartbeat markers. The
//! supervisor advances one step per control-loop tick; the watchdog is
//! always renewed before any reconnection work so a prolonged outage
//! cannot starve it.

mod link;
mod supervisor;
mod watchdog;

pub use link::{Credentials, LinkError, NetworkLink, StaticLink, TcpProbe};
pub use supervisor::{LivenessState, Supervisor, SupervisorConfig};
pub use watchdog::{DeviceWatchdog, NoopWatchdog, Watchdog};
