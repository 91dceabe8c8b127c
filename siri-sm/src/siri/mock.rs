//! Mock transport for testing without a supplier.
//!
//! Serves canned responses keyed by SOAP action and records every request
//! it is asked to send.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::request::{SoapAction, SoapRequest};
use super::transport::{RawResponse, Transport, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: Vec<u8> },
    Fail(String),
}

/// Transport that answers from memory.
///
/// Useful for development and tests, and behind the CLI's `--mock-dir`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: HashMap<SoapAction, Reply>,
    latency: Option<Duration>,
    sent: Arc<Mutex<Vec<SoapRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `action` with the given status and body.
    pub fn with_response(
        mut self,
        action: SoapAction,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.replies.insert(
            action,
            Reply::Respond {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Fail `action` as if the connection broke.
    pub fn with_failure(mut self, action: SoapAction, message: impl Into<String>) -> Self {
        self.replies.insert(action, Reply::Fail(message.into()));
        self
    }

    /// Wait this long before answering each request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Load `200 OK` responses from a directory.
    ///
    /// Expects files named `{Action}.xml` (e.g., `CheckStatus.xml`,
    /// `Subscribe.xml`). Other files are ignored.
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let mut mock = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("xml") {
                continue;
            }

            let Some(action) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<SoapAction>().ok())
            else {
                continue;
            };

            let body = std::fs::read(&path)?;
            mock = mock.with_response(action, 200, body);
        }

        if mock.replies.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no mock response files found in {}", dir.display()),
            ));
        }

        Ok(mock)
    }

    /// Every request sent so far, oldest first.
    pub async fn sent(&self) -> Vec<SoapRequest> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &SoapRequest) -> Result<RawResponse, TransportError> {
        self.sent.lock().await.push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.replies.get(&request.action()) {
            Some(Reply::Respond { status, body }) => Ok(RawResponse {
                status: *status,
                headers: vec![("content-type".to_string(), "text/xml; charset=utf-8".to_string())],
                body: body.clone(),
            }),
            Some(Reply::Fail(message)) => Err(TransportError::Connection(message.clone())),
            None => Err(TransportError::Connection(format!(
                "no mock response for {}",
                request.action()
            ))),
        }
    }
}
