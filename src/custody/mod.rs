//! Chain-of-custody client.
//!
//! Records the hashes of a successful erasure with an external recording
//! service, and later asks the same service whether a certificate document's
//! hashes are on record. Recording failures are reported on their own and
//! never affect the erasure outcome. Each call makes exactly one attempt.

pub mod models;
pub mod transport;

pub use models::{ChainResponse, RecordRequest, VerifyRequest, RECORD_PATH, VERIFY_PATH};
pub use transport::{ChainTransport, HttpTransport, TransportReply};

use crate::crypto::{Certificate, CertificateError, ContentHash};
use crate::{WipeConfig, WipeMethod};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Malformed certificate document: {0}")]
    MalformedDocument(String),

    #[error("Chain-of-custody service unreachable: {0}")]
    Transport(String),

    #[error("Unexpected response from chain-of-custody service: {0}")]
    Protocol(String),

    #[error("Chain-of-custody service returned status '{status}': {message}")]
    Rejected { status: String, message: String },

    #[error("Certificate hashes are not on record")]
    VerificationMismatch,

    #[error("Failed to encode request: {0}")]
    Serialization(String),
}

/// Why a verification did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationFailure {
    MalformedDocument,
    Transport,
    Protocol,
    Rejected,
    NotVerified,
}

impl From<&ChainError> for VerificationFailure {
    fn from(err: &ChainError) -> Self {
        match err {
            ChainError::MalformedDocument(_) => VerificationFailure::MalformedDocument,
            ChainError::Transport(_) => VerificationFailure::Transport,
            ChainError::Protocol(_) | ChainError::Serialization(_) => VerificationFailure::Protocol,
            ChainError::Rejected { .. } => VerificationFailure::Rejected,
            ChainError::VerificationMismatch => VerificationFailure::NotVerified,
        }
    }
}

/// What the service holds for a verified certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedRecord {
    pub timestamp: u64,
    pub wipe_method: WipeMethod,
}

/// Caller-facing verification outcome. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    pub error_message: Option<String>,
    pub timestamp: u64,
    pub wipe_method: Option<WipeMethod>,
    pub failure: Option<VerificationFailure>,
}

impl VerificationResult {
    fn verified(record: VerifiedRecord) -> Self {
        Self {
            verified: true,
            error_message: None,
            timestamp: record.timestamp,
            wipe_method: Some(record.wipe_method),
            failure: None,
        }
    }

    fn failed(err: &ChainError) -> Self {
        Self {
            verified: false,
            error_message: Some(err.to_string()),
            timestamp: 0,
            wipe_method: None,
            failure: Some(err.into()),
        }
    }
}

pub struct CustodyClient {
    transport: Arc<dyn ChainTransport>,
}

impl CustodyClient {
    pub fn new(transport: Arc<dyn ChainTransport>) -> Self {
        Self { transport }
    }

    /// Client talking HTTP to the configured endpoint
    pub fn from_config(config: &WipeConfig) -> Result<Self, ChainError> {
        let transport = HttpTransport::new(&config.chain_endpoint, config.chain_timeout())?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Record a certificate's hashes. `Ok` means the service durably accepted them.
    pub fn record(&self, certificate: &Certificate) -> Result<(), ChainError> {
        self.record_hashes(
            certificate.cert_hash(),
            certificate.device_hash(),
            certificate.document().wipe_method,
        )
    }

    pub fn record_hashes(
        &self,
        cert_hash: ContentHash,
        device_hash: ContentHash,
        wipe_method: u8,
    ) -> Result<(), ChainError> {
        let request = RecordRequest {
            cert_hash: cert_hash.to_prefixed_hex(),
            device_hash: device_hash.to_prefixed_hex(),
            wipe_method,
        };

        let response = self.exchange(RECORD_PATH, &request)?;
        if !response.is_ok() {
            return Err(rejected(response));
        }

        tracing::info!(cert_hash = %request.cert_hash, "Wipe proof recorded");
        Ok(())
    }

    /// Verify an untrusted certificate document, keeping the typed error
    pub fn try_verify(&self, document: &[u8]) -> Result<VerifiedRecord, ChainError> {
        let certificate = Certificate::from_bytes(document.to_vec()).map_err(|e| match e {
            CertificateError::Malformed(msg) => ChainError::MalformedDocument(msg),
            other => ChainError::MalformedDocument(other.to_string()),
        })?;

        let request = VerifyRequest {
            device_hash: certificate.device_hash().to_prefixed_hex(),
            cert_hash: certificate.cert_hash().to_prefixed_hex(),
        };

        let response = self.exchange(VERIFY_PATH, &request)?;
        if !response.is_ok() {
            return Err(rejected(response));
        }

        match response.verified {
            Some(true) => {}
            Some(false) => return Err(ChainError::VerificationMismatch),
            None => {
                return Err(ChainError::Protocol(
                    "verify response is missing 'verified'".to_string(),
                ))
            }
        }

        let timestamp = response.timestamp.ok_or_else(|| {
            ChainError::Protocol("verified response is missing 'timestamp'".to_string())
        })?;
        let ordinal = response.wipe_method.ok_or_else(|| {
            ChainError::Protocol("verified response is missing 'wipe_method'".to_string())
        })?;
        let wipe_method = WipeMethod::try_from(ordinal)
            .map_err(|o| ChainError::Protocol(format!("unknown wipe method ordinal {}", o)))?;

        if certificate.method() != Some(wipe_method) {
            tracing::warn!(
                recorded = %wipe_method,
                document = certificate.document().wipe_method,
                "Recorded wipe method differs from the certificate"
            );
        }

        Ok(VerifiedRecord {
            timestamp,
            wipe_method,
        })
    }

    /// Verify an untrusted certificate document. Never fails; the result
    /// names the cause when not verified.
    pub fn verify(&self, document: &[u8]) -> VerificationResult {
        match self.try_verify(document) {
            Ok(record) => {
                tracing::info!(timestamp = record.timestamp, "Certificate verified");
                VerificationResult::verified(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Certificate verification failed");
                VerificationResult::failed(&e)
            }
        }
    }

    fn exchange<T: Serialize>(&self, path: &str, request: &T) -> Result<ChainResponse, ChainError> {
        let body =
            serde_json::to_vec(request).map_err(|e| ChainError::Serialization(e.to_string()))?;
        let reply = self.transport.post(path, &body)?;

        serde_json::from_slice::<ChainResponse>(&reply.body).map_err(|e| {
            if reply.is_success() {
                ChainError::Protocol(format!("invalid response body: {}", e))
            } else {
                ChainError::Protocol(format!("HTTP {} with unreadable body: {}", reply.status, e))
            }
        })
    }
}

fn rejected(response: ChainResponse) -> ChainError {
    ChainError::Rejected {
        status: response.status,
        message: response.message.unwrap_or_default(),
    }
}
