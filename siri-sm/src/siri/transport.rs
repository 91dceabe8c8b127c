//! Transports carry a rendered request to the supplier.

use std::future::Future;
use std::io::Read;
use std::time::Duration;

use crate::config::TransportConfig;

use super::request::SoapRequest;

/// Errors from delivering a request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Transport),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("connection failed: {0}")]
    Connection(String),
}

/// What came back from the supplier, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the HTTP status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends SOAP requests and returns the raw response.
///
/// Implementations must return the body for every HTTP status, so callers
/// can report what the supplier sent even on failure.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &SoapRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// HTTP transport backed by a shared `ureq::Agent`.
///
/// Header names go on the wire exactly as [`SoapRequest::headers`] spells
/// them. The agent is blocking, so each call runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &SoapRequest) -> Result<RawResponse, TransportError> {
        let mut call = self.agent.post(request.url().as_str());
        for (name, value) in request.headers() {
            call = call.set(name, value);
        }
        let body = request.body().to_string();

        tokio::task::spawn_blocking(move || post(call, &body)).await?
    }
}

fn post(call: ureq::Request, body: &str) -> Result<RawResponse, TransportError> {
    let response = match call.send_string(body) {
        Ok(response) => response,
        // Error statuses still carry a body worth reporting.
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(e)) => return Err(e.into()),
    };

    let status = response.status();
    let headers = response
        .headers_names()
        .into_iter()
        .filter_map(|name| {
            let value = response.header(&name)?.to_string();
            Some((name, value))
        })
        .collect();

    let mut body = Vec::new();
    response.into_reader().read_to_end(&mut body)?;

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let response = |status| RawResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(response(200).is_success());
        assert!(response(299).is_success());
        assert!(!response(199).is_success());
        assert!(!response(300).is_success());
        assert!(!response(500).is_success());
    }

    #[test]
    fn transport_is_cheap_to_share() {
        let transport = HttpTransport::new(TransportConfig::default().with_timeout(1));
        let _clone = transport.clone();
    }
}
