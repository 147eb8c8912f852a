// Wipe Orchestrator - dispatches a WipeMethod to its erasure strategy
//
// Every attempt is bracketed by start/end timestamps, including failed and
// rejected ones, and the status reflects only what the strategy reported.
// At most one wipe runs per device; paths are compared after resolving
// symlinks, so aliases such as /dev/disk/by-id/* share a guard with the node
// they point to. There are no automatic retries.

use crate::algorithms::{BlockOverwrite, EncryptedOverwrite, ErasureStrategy};
use crate::drives::{AtaSecureErase, CommandRunner, NvmeSanitize, SystemCommandRunner};
use crate::io::{DeviceOpener, RawDeviceOpener};
use crate::{
    Device, ErasureError, ErasureResult, WipeConfig, WipeMethod, WipeResult, WipeStatus,
    TOOL_VERSION,
};
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-invocation lifecycle. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for WipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identity fields copied into the result
#[derive(Default)]
struct Identity<'a> {
    model: &'a str,
    serial: &'a str,
    size: u64,
}

pub struct WipeOrchestrator {
    runner: Arc<dyn CommandRunner>,
    opener: Arc<dyn DeviceOpener>,
    hdparm_path: String,
    nvme_path: String,
    in_flight: Mutex<HashSet<String>>,
}

impl WipeOrchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        opener: Arc<dyn DeviceOpener>,
        config: &WipeConfig,
    ) -> Self {
        Self {
            runner,
            opener,
            hdparm_path: config.hdparm_path.clone(),
            nvme_path: config.nvme_path.clone(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Orchestrator backed by real processes and raw device I/O
    pub fn from_config(config: &WipeConfig) -> Self {
        Self::new(
            Arc::new(SystemCommandRunner::new(config.command_timeout())),
            Arc::new(RawDeviceOpener),
            config,
        )
    }

    /// Strategy implementing `method`
    pub fn strategy_for(&self, method: WipeMethod) -> Box<dyn ErasureStrategy> {
        match method {
            WipeMethod::PlainOverwrite => Box::new(BlockOverwrite::new(self.opener.clone())),
            WipeMethod::EncryptedOverwrite => Box::new(EncryptedOverwrite),
            WipeMethod::FirmwareErase => {
                Box::new(NvmeSanitize::new(self.runner.clone(), self.nvme_path.clone()))
            }
            WipeMethod::AtaSecureErase => {
                Box::new(AtaSecureErase::new(self.runner.clone(), self.hdparm_path.clone()))
            }
        }
    }

    /// Erase the device at `device_path`. Identity fields of the result are
    /// left empty; use [`wipe_device`](Self::wipe_device) to carry them.
    pub fn wipe(&self, device_path: &str, method: WipeMethod) -> WipeResult {
        self.run(device_path, Identity::default(), method)
    }

    /// Erase a described device after checking that it offers `method`.
    pub fn wipe_device(&self, device: &Device, method: WipeMethod) -> WipeResult {
        let identity = Identity {
            model: &device.model,
            serial: &device.serial,
            size: device.size_bytes,
        };

        let rejection = if device.read_only {
            Some(ErasureError::ReadOnlyDevice(device.path.clone()))
        } else if !device.offers(method) {
            Some(ErasureError::MethodNotOffered {
                path: device.path.clone(),
                method,
            })
        } else {
            None
        };

        match rejection {
            Some(err) => {
                tracing::error!(device = %device.path, %method, error = %err, "Wipe rejected");
                let now = epoch_now();
                build_result(&device.path, &identity, method, now, now, Err(err))
            }
            None => self.run(&device.path, identity, method),
        }
    }

    /// Whether a wipe is currently running against `device_path`
    pub fn is_busy(&self, device_path: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&guard_key(device_path))
    }

    fn run(&self, device_path: &str, identity: Identity<'_>, method: WipeMethod) -> WipeResult {
        let start_time = epoch_now();

        let outcome = match DeviceGuard::acquire(&self.in_flight, device_path) {
            Some(_guard) => {
                let strategy = self.strategy_for(method);
                tracing::info!(
                    device = device_path,
                    %method,
                    strategy = strategy.name(),
                    from = %WipeState::Idle,
                    to = %WipeState::Running,
                    "Wipe started"
                );
                strategy.execute(device_path)
            }
            None => Err(ErasureError::DeviceBusy(device_path.to_string())),
        };

        let end_time = epoch_now().max(start_time);

        match &outcome {
            Ok(()) => tracing::info!(
                device = device_path,
                %method,
                to = %WipeState::Succeeded,
                duration_secs = end_time - start_time,
                "Wipe finished"
            ),
            Err(e) => tracing::error!(
                device = device_path,
                %method,
                to = %WipeState::Failed,
                error = %e,
                "Wipe failed"
            ),
        }

        build_result(device_path, &identity, method, start_time, end_time, outcome)
    }
}

fn build_result(
    device_path: &str,
    identity: &Identity<'_>,
    method: WipeMethod,
    start_time: u64,
    end_time: u64,
    outcome: ErasureResult<()>,
) -> WipeResult {
    let (status, failure) = match outcome {
        Ok(()) => (WipeStatus::Success, None),
        Err(e) => (WipeStatus::Failure, Some(e)),
    };

    WipeResult {
        device_path: device_path.to_string(),
        device_model: identity.model.to_string(),
        device_serial: identity.serial.to_string(),
        device_size: identity.size,
        method,
        status,
        start_time,
        end_time,
        tool_version: TOOL_VERSION.to_string(),
        failure,
    }
}

/// Key for the in-flight set. Falls back to the literal path when it cannot
/// be resolved (e.g. it does not exist yet).
fn guard_key(device_path: &str) -> String {
    std::fs::canonicalize(device_path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| device_path.to_string())
}

fn epoch_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Marks a device path as in flight until dropped
struct DeviceGuard<'a> {
    path: String,
    in_flight: &'a Mutex<HashSet<String>>,
}

impl<'a> DeviceGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<String>>, device_path: &str) -> Option<Self> {
        let path = guard_key(device_path);
        let inserted = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone());

        inserted.then_some(Self { path, in_flight })
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}
