use crate::{WipeMethod, WipeResult, WipeStatus};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Separator between identity fields in the device hash preimage
const IDENTITY_SEPARATOR: &str = "|";

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("Certificate serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed certificate document: {0}")]
    Malformed(String),

    #[error("Certificate I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// SHA-256 digest identifying a document or a device
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex with the `0x` prefix used on the wire
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{:x}", self)
    }
}

impl fmt::LowerHex for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:x})", self)
    }
}

/// Hash of `model|serial|size`. Depends on nothing else, so one physical
/// device always maps to the same identity.
pub fn device_identity_hash(model: &str, serial: &str, size: u64) -> ContentHash {
    let preimage = [model, serial, &size.to_string()].join(IDENTITY_SEPARATOR);
    ContentHash::of(preimage.as_bytes())
}

/// Canonical certificate body.
///
/// Field declaration order is the serialization order and must not change:
/// `cert_hash` is computed over the compact JSON bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateDocument {
    pub device_path: String,
    pub device_model: String,
    pub device_serial: String,
    pub device_size: u64,
    pub wipe_method: u8,
    pub wipe_status: bool,
    pub start_time: u64,
    pub end_time: u64,
    pub tool_version: String,
}

impl CertificateDocument {
    pub fn from_result(result: &WipeResult) -> Self {
        Self {
            device_path: result.device_path.clone(),
            device_model: result.device_model.clone(),
            device_serial: result.device_serial.clone(),
            device_size: result.device_size,
            wipe_method: result.method.ordinal(),
            wipe_status: result.status == WipeStatus::Success,
            start_time: result.start_time,
            end_time: result.end_time,
            tool_version: result.tool_version.clone(),
        }
    }

    /// Parse an untrusted document
    pub fn parse(bytes: &[u8]) -> Result<Self, CertificateError> {
        let document: Self = serde_json::from_slice(bytes)
            .map_err(|e| CertificateError::Malformed(e.to_string()))?;

        if document.method().is_none() {
            return Err(CertificateError::Malformed(format!(
                "unknown wipe method ordinal {}",
                document.wipe_method
            )));
        }

        Ok(document)
    }

    pub fn method(&self) -> Option<WipeMethod> {
        WipeMethod::try_from(self.wipe_method).ok()
    }

    pub fn device_hash(&self) -> ContentHash {
        device_identity_hash(&self.device_model, &self.device_serial, self.device_size)
    }

    /// Compact canonical bytes
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A certificate document together with its exact bytes and both hashes.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    document: CertificateDocument,
    bytes: Vec<u8>,
    cert_hash: ContentHash,
    device_hash: ContentHash,
}

impl Certificate {
    /// Rebuild from persisted bytes. `cert_hash` covers the bytes exactly as
    /// given, never a re-serialization of them.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CertificateError> {
        let document = CertificateDocument::parse(&bytes)?;
        let device_hash = document.device_hash();
        let cert_hash = ContentHash::of(&bytes);

        Ok(Self {
            document,
            bytes,
            cert_hash,
            device_hash,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CertificateError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Write the canonical bytes unchanged
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CertificateError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub fn document(&self) -> &CertificateDocument {
        &self.document
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_json(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn cert_hash(&self) -> ContentHash {
        self.cert_hash
    }

    pub fn device_hash(&self) -> ContentHash {
        self.device_hash
    }

    pub fn method(&self) -> Option<WipeMethod> {
        self.document.method()
    }
}

/// Renders wipe results into hash-bound certificates. Pure: no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateBuilder;

impl CertificateBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, result: &WipeResult) -> Result<Certificate, CertificateError> {
        let document = CertificateDocument::from_result(result);
        let bytes = document.to_canonical_bytes()?;
        let cert_hash = ContentHash::of(&bytes);
        let device_hash = document.device_hash();

        tracing::debug!(
            device = %result.device_path,
            cert_hash = %cert_hash,
            device_hash = %device_hash,
            "Certificate built"
        );

        Ok(Certificate {
            document,
            bytes,
            cert_hash,
            device_hash,
        })
    }
}
