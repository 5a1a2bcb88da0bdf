//! Hardware watchdog renewal

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use tracing::info;

/// A watchdog timer that restarts the device unless renewed within its
/// configured deadline.
pub trait Watchdog: Send {
    /// Reset the watchdog countdown.
    fn renew(&mut self) -> io::Result<()>;
}

impl Watchdog for Box<dyn Watchdog + Send> {
    fn renew(&mut self) -> io::Result<()> {
        (**self).renew()
    }
}

/// Watchdog backed by a kernel device node (e.g. `/dev/watchdog`). Any
/// write resets the countdown; if the process hangs and stops writing,
/// the kernel reboots the device.
pub struct DeviceWatchdog {
    file: File,
}

impl DeviceWatchdog {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().write(true).open(path)?;
        info!("watchdog device opened: {}", path.display());
        Ok(Self { file })
    }
}

impl Watchdog for DeviceWatchdog {
    fn renew(&mut self) -> io::Result<()> {
        self.file.write_all(b"\n")?;
        self.file.flush()
    }
}

/// No-op watchdog for development hosts; records renewals so tests can
/// assert the renewal cadence.
#[derive(Debug, Default)]
pub struct NoopWatchdog {
    renewals: u64,
    last_renewal: Option<Instant>,
}

impl NoopWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renewals(&self) -> u64 {
        self.renewals
    }

    pub fn last_renewal(&self) -> Option<Instant> {
        self.last_renewal
    }
}

impl Watchdog for NoopWatchdog {
    fn renew(&mut self) -> io::Result<()> {
        self.renewals += 1;
        self.last_renewal = Some(Instant::now());
        Ok(())
    }
}
