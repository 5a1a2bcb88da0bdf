//! MotionCam - Motion-Gated Camera Controller
//!
//! Wires the camera source, the motion gate, the liveness supervisor,
//! and the HTTP surface together. The control loop ticks the gate and
//! the supervisor; request handlers run as independent tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{error, info, warn};

use api::settings::Settings;
use api::{init_logging, run_server, AppState};
use camera_source::SyntheticCamera;
use liveness::{
    DeviceWatchdog, NetworkLink, NoopWatchdog, StaticLink, Supervisor, TcpProbe, Watchdog,
};
use motion_gate::MotionGate;
#[cfg(unix)]
use motion_gate::SensorLatch;

/// Cadence the motion gate is drained and decayed at
const GATE_TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== motioncam v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    if settings.camera.device.is_some() {
        warn!("camera device path set but no hardware driver is linked; using synthetic source");
    }
    let camera = match SyntheticCamera::open(settings.camera_config()) {
        Ok(camera) => camera,
        Err(e) => {
            // No degraded mode: exit nonzero so the platform supervisor
            // restarts the device
            error!("camera init failed: {}", e);
            std::process::exit(1);
        }
    };

    let gate = MotionGate::new(settings.gate_config());
    let state = Arc::new(AppState::new(gate.monitor(), Box::new(camera), &settings));

    #[cfg(unix)]
    spawn_motion_input(gate.latch());

    let watchdog = open_watchdog(&settings);
    let supervisor_config = settings.supervisor_config();
    let supervisor_interval = supervisor_config.tick_interval;
    let credentials = settings.credentials();

    match settings.network.probe_addr.clone() {
        Some(addr) => {
            let supervisor =
                Supervisor::new(supervisor_config, credentials, TcpProbe::new(addr), watchdog);
            start_control(gate, supervisor, supervisor_interval).await;
        }
        None => {
            let supervisor =
                Supervisor::new(supervisor_config, credentials, StaticLink, watchdog);
            start_control(gate, supervisor, supervisor_interval).await;
        }
    }

    run_server(&settings.server.bind_addr, state).await
}

/// Wait for the network link, then run the control loop as a background
/// task: gate ticks and supervisor ticks interleaved on their cadences.
async fn start_control<L>(
    mut gate: MotionGate,
    mut supervisor: Supervisor<L, Box<dyn Watchdog + Send>>,
    supervisor_interval: Duration,
) where
    L: NetworkLink + Send + 'static,
{
    // No requests are served until the link is up, but the watchdog is
    // fed through every retry
    while !supervisor.state().link_up {
        supervisor.tick(Instant::now()).await;
        if supervisor.state().link_up {
            break;
        }
        tokio::time::sleep(supervisor_interval).await;
    }
    info!("network link up");

    tokio::spawn(async move {
        let mut gate_tick = tokio::time::interval(GATE_TICK);
        let mut supervisor_tick = tokio::time::interval(supervisor_interval);
        loop {
            tokio::select! {
                _ = gate_tick.tick() => gate.tick(Instant::now()),
                _ = supervisor_tick.tick() => supervisor.tick(Instant::now()).await,
            }
        }
    });
}

/// SIGUSR1 stands in for the sensor interrupt line on hosts without a
/// GPIO edge source; the handler only writes the latch.
#[cfg(unix)]
fn spawn_motion_input(latch: Arc<SensorLatch>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut edges = match signal(SignalKind::user_defined1()) {
            Ok(sig) => sig,
            Err(e) => {
                warn!("motion signal input unavailable: {}", e);
                return;
            }
        };
        while edges.recv().await.is_some() {
            latch.record_edge();
        }
    });
}

fn open_watchdog(settings: &Settings) -> Box<dyn Watchdog + Send> {
    match &settings.watchdog.device {
        Some(path) => match DeviceWatchdog::open(path) {
            Ok(watchdog) => Box::new(watchdog),
            Err(e) => {
                warn!("watchdog device unavailable ({}), renewals are a no-op", e);
                Box::new(NoopWatchdog::new())
            }
        },
        None => Box::new(NoopWatchdog::new()),
    }
}
