//! Wire objects exchanged with the chain-of-custody service.

use serde::{Deserialize, Serialize};

pub const RECORD_PATH: &str = "/record-wipe";
pub const VERIFY_PATH: &str = "/verify-wipe";

/// Status value the service uses for an accepted request
pub const STATUS_OK: &str = "ok";

/// Body of `POST /record-wipe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub cert_hash: String,
    pub device_hash: String,
    pub wipe_method: u8,
}

/// Body of `POST /verify-wipe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub device_hash: String,
    pub cert_hash: String,
}

/// Response to either endpoint. Verification fields are present only on
/// successful verify calls; `message` only on errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wipe_method: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChainResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
