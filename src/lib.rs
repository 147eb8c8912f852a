// Allow uppercase acronyms for industry-standard terms like NVMe, ATA
#![allow(clippy::upper_case_acronyms)]

pub mod algorithms;
pub mod config;
pub mod crypto;
pub mod custody;
pub mod drives;
pub mod io;
pub mod session;
pub mod wipe_orchestrator;

// Re-export the main entry points for convenience
pub use config::WipeConfig;
pub use crypto::certificates::{Certificate, CertificateBuilder, CertificateDocument};
pub use custody::{CustodyClient, VerificationFailure, VerificationResult};
pub use session::{CustodyOutcome, DriveWipeRecord, WipeSession};
pub use wipe_orchestrator::WipeOrchestrator;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version string stamped into every wipe result and certificate.
pub const TOOL_VERSION: &str = "zt-wipe 1.0";

/// Identifies one step of a delegated (external tool) erase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStep {
    AtaIdentify,
    AtaSetPassword,
    AtaErase,
    NvmeIdentify,
    NvmeCryptoSanitize,
    NvmeBlockSanitize,
}

impl fmt::Display for ToolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolStep::AtaIdentify => "ATA identify (hdparm -I)",
            ToolStep::AtaSetPassword => "ATA set security password",
            ToolStep::AtaErase => "ATA security erase",
            ToolStep::NvmeIdentify => "NVMe identify controller",
            ToolStep::NvmeCryptoSanitize => "NVMe crypto-erase sanitize",
            ToolStep::NvmeBlockSanitize => "NVMe block-erase sanitize",
        };
        f.write_str(label)
    }
}

/// Everything that can stop an erasure attempt.
///
/// Errors carry strings rather than `std::io::Error` so a result holding one
/// stays `Clone` and comparable in tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErasureError {
    #[error("Cannot open {path} for writing: {reason}")]
    DeviceOpen { path: String, reason: String },

    #[error("Cannot determine capacity of {path}: {reason}")]
    SizeQuery { path: String, reason: String },

    #[error("I/O error on pass {pass} at offset {offset}: {reason}")]
    Io { pass: u32, offset: u64, reason: String },

    #[error("{step} failed: {detail}")]
    ExternalTool { step: ToolStep, detail: String },

    #[error("{step} timed out after {after_secs}s")]
    TimedOut { step: ToolStep, after_secs: u64 },

    #[error("Wipe method {0} is not supported by this build")]
    UnsupportedMethod(WipeMethod),

    #[error("Device {0} is read-only; no destructive method may run")]
    ReadOnlyDevice(String),

    #[error("Wipe method {method} is not offered for device {path}")]
    MethodNotOffered { path: String, method: WipeMethod },

    #[error("A wipe is already in progress on {0}")]
    DeviceBusy(String),
}

pub type ErasureResult<T> = Result<T, ErasureError>;

/// Erasure method. The ordinal is part of the certificate and wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WipeMethod {
    PlainOverwrite,
    EncryptedOverwrite,
    FirmwareErase,
    AtaSecureErase,
}

impl WipeMethod {
    pub const ALL: [WipeMethod; 4] = [
        WipeMethod::PlainOverwrite,
        WipeMethod::EncryptedOverwrite,
        WipeMethod::FirmwareErase,
        WipeMethod::AtaSecureErase,
    ];

    pub fn ordinal(self) -> u8 {
        match self {
            WipeMethod::PlainOverwrite => 0,
            WipeMethod::EncryptedOverwrite => 1,
            WipeMethod::FirmwareErase => 2,
            WipeMethod::AtaSecureErase => 3,
        }
    }
}

impl TryFrom<u8> for WipeMethod {
    type Error = u8;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        WipeMethod::ALL
            .into_iter()
            .find(|m| m.ordinal() == ordinal)
            .ok_or(ordinal)
    }
}

impl fmt::Display for WipeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WipeMethod::PlainOverwrite => "Plain Overwrite",
            WipeMethod::EncryptedOverwrite => "Encrypted Overwrite",
            WipeMethod::FirmwareErase => "Firmware Erase (NVMe sanitize)",
            WipeMethod::AtaSecureErase => "ATA Secure Erase",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    NVMe,
    AtaScsi,
    SdMmc,
    Unknown,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceClass::NVMe => "NVMe",
            DeviceClass::AtaScsi => "ATA/SCSI",
            DeviceClass::SdMmc => "SD/MMC",
            DeviceClass::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Caller-supplied description of a target device. The engine never probes
/// hardware to fill this in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub removable: bool,
    pub read_only: bool,
    pub model: String,
    pub serial: String,
    pub class: DeviceClass,
    supported_methods: Vec<WipeMethod>,
}

impl Device {
    /// Build a device description. A read-only device keeps an empty method
    /// set whatever the caller passes in.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        size_bytes: u64,
        removable: bool,
        read_only: bool,
        model: impl Into<String>,
        serial: impl Into<String>,
        class: DeviceClass,
        supported_methods: Vec<WipeMethod>,
    ) -> Self {
        let supported_methods = if read_only {
            Vec::new()
        } else {
            supported_methods
        };

        Self {
            name: name.into(),
            path: path.into(),
            size_bytes,
            removable,
            read_only,
            model: model.into(),
            serial: serial.into(),
            class,
            supported_methods,
        }
    }

    /// Methods that may be offered for this device. Always empty when read-only.
    pub fn offered_methods(&self) -> &[WipeMethod] {
        if self.read_only {
            &[]
        } else {
            &self.supported_methods
        }
    }

    pub fn offers(&self, method: WipeMethod) -> bool {
        self.offered_methods().contains(&method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WipeStatus {
    Success,
    Failure,
}

/// Outcome of a single erasure attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeResult {
    pub device_path: String,
    pub device_model: String,
    pub device_serial: String,
    pub device_size: u64,
    pub method: WipeMethod,
    pub status: WipeStatus,
    /// Epoch seconds
    pub start_time: u64,
    /// Epoch seconds, never earlier than `start_time`
    pub end_time: u64,
    pub tool_version: String,
    /// Why the attempt failed. Not part of the certificate.
    pub failure: Option<ErasureError>,
}

impl WipeResult {
    pub fn succeeded(&self) -> bool {
        self.status == WipeStatus::Success
    }

    pub fn duration_secs(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}
