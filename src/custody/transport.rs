//! HTTP transport to the chain-of-custody service.

use super::ChainError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Raw reply: HTTP status plus body bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportReply {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON body to one service path. One attempt per call, no retry.
#[cfg_attr(test, mockall::automock)]
pub trait ChainTransport: Send + Sync {
    fn post(&self, path: &str, body: &[u8]) -> Result<TransportReply, ChainError>;
}

/// Blocking HTTP client for the recording service.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChainTransport for HttpTransport {
    fn post(&self, path: &str, body: &[u8]) -> Result<TransportReply, ChainError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%url, "POST to chain-of-custody service");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| ChainError::Transport(e.to_string()))?
            .to_vec();

        Ok(TransportReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://127.0.0.1:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_unreachable_service_is_transport_error() {
        // Bind then drop a listener to get a port nothing is listening on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport =
            HttpTransport::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2)).unwrap();

        let err = transport.post("/record-wipe", b"{}").unwrap_err();
        assert!(matches!(err, ChainError::Transport(_)));
    }

    #[test]
    fn test_reply_success_range() {
        assert!(TransportReply::ok("{}").is_success());
        let reply = TransportReply {
            status: 503,
            body: Vec::new(),
        };
        assert!(!reply.is_success());
    }
}
