//! Runtime configuration
//!
//! Layered: built-in defaults, then an optional `motioncam.toml`, then
//! `MOTIONCAM_*` environment variables (e.g. `MOTIONCAM_SERVER__BIND_ADDR`).

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use camera_source::CameraConfig;
use liveness::{Credentials, SupervisorConfig};
use motion_gate::GateConfig;

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub network: NetworkSettings,
    pub camera: CameraSettings,
    pub gate: GateSettings,
    pub stream: StreamSettings,
    pub watchdog: WatchdogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Network name
    pub ssid: String,
    /// Network secret
    pub secret: String,
    /// Gateway address for link probes; None disables probing
    pub probe_addr: Option<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            secret: String::new(),
            probe_addr: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Driver-side frame buffer count
    pub fb_count: u32,
    /// Device path; None selects the synthetic source
    pub device: Option<String>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let base = CameraConfig::default();
        Self {
            width: base.width,
            height: base.height,
            jpeg_quality: base.jpeg_quality,
            fb_count: base.fb_count,
            device: base.device,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// How long streaming stays authorized after the last motion edge
    pub inactivity_window_ms: u64,
    /// False selects the ungated variant: streaming always permitted
    pub enabled: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            inactivity_window_ms: 5000,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Target emission rate in frames per second
    pub fps: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self { fps: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogSettings {
    /// Watchdog deadline in seconds
    pub timeout_secs: u64,
    /// Watchdog device node; None selects the no-op watchdog
    pub device: Option<String>,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            device: None,
        }
    }
}

impl Settings {
    /// Load settings from file and environment over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("motioncam").required(false))
            .add_source(Environment::with_prefix("MOTIONCAM").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device: self.camera.device.clone(),
            width: self.camera.width,
            height: self.camera.height,
            jpeg_quality: self.camera.jpeg_quality,
            fb_count: self.camera.fb_count,
        }
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            inactivity_window: Duration::from_millis(self.gate.inactivity_window_ms),
            ..Default::default()
        }
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            watchdog_timeout: Duration::from_secs(self.watchdog.timeout_secs),
            ..Default::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            ssid: self.network.ssid.clone(),
            secret: self.network.secret.clone(),
        }
    }

    /// Delay between stream parts for the configured frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.stream.fps.max(1)))
    }
}
