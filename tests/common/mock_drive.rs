/// Simulated block device for integration tests
///
/// Records what each pass wrote and when flushes happened, without touching
/// real storage. Supports error injection: a capped write size (short
/// writes), a write or flush failure on a chosen pass, and a failing
/// capacity query.
use std::io;
use std::sync::{Arc, Mutex};
use zt_wipe::io::{BlockDevice, DeviceOpener};

/// Fault injection knobs
#[derive(Debug, Clone, Default)]
pub struct SimulatedDriveConfig {
    pub capacity: u64,
    /// Accept at most this many bytes per write call
    pub max_write: Option<usize>,
    /// Fail the first write of this pass (1-based)
    pub fail_on_pass: Option<u32>,
    /// Fail the flush that ends this pass (1-based)
    pub fail_sync_on_pass: Option<u32>,
    pub fail_capacity: bool,
}

/// Everything the engine did to the simulated device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveLog {
    /// Bytes written per pass, indexed by pass - 1
    pub pass_bytes: Vec<u64>,
    /// Passes started so far, captured at each flush
    pub syncs_after_pass: Vec<usize>,
    pub write_calls: usize,
    pub nonzero_bytes: u64,
    pub opens: usize,
    pub closes: usize,
}

#[allow(dead_code)]
impl DriveLog {
    pub fn passes(&self) -> usize {
        self.pass_bytes.len()
    }

    pub fn syncs(&self) -> usize {
        self.syncs_after_pass.len()
    }
}

/// Opener handing out handles to one shared simulated device
#[derive(Clone)]
pub struct SimulatedDrive {
    config: SimulatedDriveConfig,
    log: Arc<Mutex<DriveLog>>,
}

#[allow(dead_code)]
impl SimulatedDrive {
    pub fn new(config: SimulatedDriveConfig) -> Self {
        Self {
            config,
            log: Arc::new(Mutex::new(DriveLog::default())),
        }
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self::new(SimulatedDriveConfig {
            capacity,
            ..Default::default()
        })
    }

    pub fn log(&self) -> DriveLog {
        self.log.lock().unwrap().clone()
    }
}

impl DeviceOpener for SimulatedDrive {
    fn open_for_write(&self, _path: &str) -> io::Result<Box<dyn BlockDevice>> {
        self.log.lock().unwrap().opens += 1;
        Ok(Box::new(SimulatedHandle {
            config: self.config.clone(),
            log: self.log.clone(),
            current_pass: 0,
        }))
    }
}

struct SimulatedHandle {
    config: SimulatedDriveConfig,
    log: Arc<Mutex<DriveLog>>,
    current_pass: u32,
}

impl BlockDevice for SimulatedHandle {
    fn capacity(&mut self) -> io::Result<u64> {
        if self.config.fail_capacity {
            return Err(io::Error::other("capacity query rejected"));
        }
        Ok(self.config.capacity)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.current_pass += 1;
        self.log.lock().unwrap().pass_bytes.push(0);
        Ok(())
    }

    fn write_chunk(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut log = self.log.lock().unwrap();
        let index = log.pass_bytes.len().saturating_sub(1);

        if self.config.fail_on_pass == Some(self.current_pass) {
            return Err(io::Error::other(format!(
                "injected write failure on pass {}",
                self.current_pass
            )));
        }

        let accepted = self
            .config
            .max_write
            .map_or(data.len(), |cap| data.len().min(cap));

        log.write_calls += 1;
        log.nonzero_bytes += data[..accepted].iter().filter(|b| **b != 0).count() as u64;
        if let Some(bytes) = log.pass_bytes.get_mut(index) {
            *bytes += accepted as u64;
        }
        Ok(accepted)
    }

    fn sync(&mut self) -> io::Result<()> {
        if self.config.fail_sync_on_pass == Some(self.current_pass) {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }

        let mut log = self.log.lock().unwrap();
        let passes = log.pass_bytes.len();
        log.syncs_after_pass.push(passes);
        Ok(())
    }
}

impl Drop for SimulatedHandle {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.closes += 1;
        }
    }
}
