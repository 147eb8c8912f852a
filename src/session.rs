// Wipe session - runs wipe, certificate and custody recording per drive
//
// The erasure status is decided by the orchestrator alone. Certificate and
// recording outcomes are kept beside it and never rewrite it.

use crate::crypto::{Certificate, CertificateBuilder};
use crate::custody::{ChainError, CustodyClient};
use crate::{Device, WipeMethod, WipeOrchestrator, WipeResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What happened to the proof of an erasure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustodyOutcome {
    /// The service accepted the certificate's hashes
    Recorded,
    /// The erasure failed, so nothing was recorded
    NotAttempted,
    /// Recording was turned off for this session
    Skipped,
    RecordFailed(ChainError),
    CertificateFailed(String),
}

impl CustodyOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, CustodyOutcome::Recorded)
    }
}

/// One drive's pass through the pipeline
#[derive(Debug, Clone)]
pub struct DriveWipeRecord {
    pub result: WipeResult,
    pub certificate: Option<Certificate>,
    pub custody: CustodyOutcome,
}

pub struct WipeSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    orchestrator: WipeOrchestrator,
    certificates: CertificateBuilder,
    custody: Option<CustodyClient>,
    records: Vec<DriveWipeRecord>,
}

impl WipeSession {
    /// Start a session. With `custody` set to `None` certificates are still
    /// built but never recorded.
    pub fn new(orchestrator: WipeOrchestrator, custody: Option<CustodyClient>) -> Self {
        let session_id = Uuid::new_v4();
        tracing::info!(session = %session_id, recording = custody.is_some(), "Wipe session started");

        Self {
            session_id,
            started_at: Utc::now(),
            orchestrator,
            certificates: CertificateBuilder::new(),
            custody,
            records: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn orchestrator(&self) -> &WipeOrchestrator {
        &self.orchestrator
    }

    /// Wipe one drive, build its certificate and record it on success
    pub fn wipe_drive(&mut self, device: &Device, method: WipeMethod) -> &DriveWipeRecord {
        let result = self.orchestrator.wipe_device(device, method);

        let (certificate, custody) = match self.certificates.build(&result) {
            Ok(certificate) => {
                let custody = self.record(&result, &certificate);
                (Some(certificate), custody)
            }
            Err(e) => {
                tracing::error!(device = %device.path, error = %e, "Certificate build failed");
                (None, CustodyOutcome::CertificateFailed(e.to_string()))
            }
        };

        let index = self.records.len();
        self.records.push(DriveWipeRecord {
            result,
            certificate,
            custody,
        });
        &self.records[index]
    }

    fn record(&self, result: &WipeResult, certificate: &Certificate) -> CustodyOutcome {
        if !result.succeeded() {
            return CustodyOutcome::NotAttempted;
        }

        let Some(client) = &self.custody else {
            return CustodyOutcome::Skipped;
        };

        match client.record(certificate) {
            Ok(()) => CustodyOutcome::Recorded,
            Err(e) => {
                tracing::warn!(
                    session = %self.session_id,
                    device = %result.device_path,
                    error = %e,
                    "Wipe succeeded but its proof was not recorded"
                );
                CustodyOutcome::RecordFailed(e)
            }
        }
    }

    pub fn records(&self) -> &[DriveWipeRecord] {
        &self.records
    }

    pub fn successful_wipes(&self) -> usize {
        self.records.iter().filter(|r| r.result.succeeded()).count()
    }

    pub fn failed_wipes(&self) -> usize {
        self.records.len() - self.successful_wipes()
    }

    /// Successful wipes whose proof is not on record
    pub fn unrecorded_wipes(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.result.succeeded() && !r.custody.is_recorded())
            .count()
    }
}
