/// In-memory chain-of-custody service
///
/// Speaks the same JSON as the real service through the `ChainTransport`
/// seam. Recorded entries get a service-assigned timestamp.
use std::collections::HashMap;
use std::sync::Mutex;
use zt_wipe::custody::{
    ChainError, ChainResponse, ChainTransport, RecordRequest, TransportReply, VerifyRequest,
    RECORD_PATH, VERIFY_PATH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredProof {
    pub timestamp: u64,
    pub wipe_method: u8,
}

#[derive(Default)]
struct Ledger {
    /// cert_hash -> (device_hash, proof)
    entries: HashMap<String, (String, StoredProof)>,
    record_calls: usize,
    verify_calls: usize,
}

pub struct InMemoryCustodyService {
    ledger: Mutex<Ledger>,
    clock: u64,
    offline: bool,
}

#[allow(dead_code)]
impl InMemoryCustodyService {
    /// Service stamping every record with `clock`
    pub fn new(clock: u64) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            clock,
            offline: false,
        }
    }

    /// Service that is never reachable
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(0)
        }
    }

    pub fn record_calls(&self) -> usize {
        self.ledger.lock().unwrap().record_calls
    }

    pub fn verify_calls(&self) -> usize {
        self.ledger.lock().unwrap().verify_calls
    }

    pub fn stored(&self, cert_hash: &str) -> Option<StoredProof> {
        self.ledger
            .lock()
            .unwrap()
            .entries
            .get(cert_hash)
            .map(|(_, proof)| *proof)
    }

    fn record(&self, request: RecordRequest) -> ChainResponse {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.record_calls += 1;

        if ledger.entries.contains_key(&request.cert_hash) {
            return error("certificate already recorded");
        }

        ledger.entries.insert(
            request.cert_hash,
            (
                request.device_hash,
                StoredProof {
                    timestamp: self.clock,
                    wipe_method: request.wipe_method,
                },
            ),
        );
        ok()
    }

    fn verify(&self, request: VerifyRequest) -> ChainResponse {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.verify_calls += 1;

        match ledger.entries.get(&request.cert_hash) {
            Some((device_hash, proof)) if *device_hash == request.device_hash => ChainResponse {
                verified: Some(true),
                timestamp: Some(proof.timestamp),
                wipe_method: Some(proof.wipe_method),
                ..ok()
            },
            _ => ChainResponse {
                verified: Some(false),
                ..ok()
            },
        }
    }
}

impl ChainTransport for InMemoryCustodyService {
    fn post(&self, path: &str, body: &[u8]) -> Result<TransportReply, ChainError> {
        if self.offline {
            return Err(ChainError::Transport("connection refused".to_string()));
        }

        let response = match path {
            RECORD_PATH => match serde_json::from_slice(body) {
                Ok(request) => self.record(request),
                Err(e) => error(&e.to_string()),
            },
            VERIFY_PATH => match serde_json::from_slice(body) {
                Ok(request) => self.verify(request),
                Err(e) => error(&e.to_string()),
            },
            _ => {
                return Ok(TransportReply {
                    status: 404,
                    body: b"not found".to_vec(),
                })
            }
        };

        let body = serde_json::to_vec(&response).map_err(|e| ChainError::Protocol(e.to_string()))?;
        Ok(TransportReply::ok(body))
    }
}

fn ok() -> ChainResponse {
    ChainResponse {
        status: "ok".to_string(),
        verified: None,
        timestamp: None,
        wipe_method: None,
        message: None,
    }
}

fn error(message: &str) -> ChainResponse {
    ChainResponse {
        status: "error".to_string(),
        message: Some(message.to_string()),
        ..ok()
    }
}
