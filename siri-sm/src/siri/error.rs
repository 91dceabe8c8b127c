//! SIRI client error types.
//!
//! Errors are split in two categories. [`LocalError`] covers everything
//! that goes wrong before a request leaves the process. [`RemoteError`]
//! covers the call itself and everything the supplier sent back, and is
//! always wrapped with the exchange it came from.

use crate::config::ConfigError;
use crate::domain::DecodeError;

use super::request::SoapAction;
use super::transport::TransportError;

/// Failure raised before any network activity.
#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("failed to render request body: {0}")]
    Template(#[from] askama::Error),
}

/// Failure attributable to the call or to the supplier's response.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("call error: {0}")]
    Transport(#[from] TransportError),

    #[error("bad http-response status: {status}")]
    UnexpectedHttpStatus { status: u16 },

    #[error("unmarshallable response body: {0}")]
    Unmarshal(#[from] quick_xml::de::DeError),

    #[error("status not true in response body")]
    UnexpectedStatus,

    #[error("invalid number of {list}: expected {expected}, got {actual}")]
    UnexpectedCardinality {
        list: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("undecodable response field: {0}")]
    Decode(#[from] DecodeError),
}

/// Any failure of a SIRI exchange.
#[derive(Debug, thiserror::Error)]
pub enum SiriError {
    #[error(transparent)]
    Local(#[from] LocalError),

    #[error("{operation} remote error: {source}")]
    Remote {
        operation: SoapAction,
        #[source]
        source: RemoteError,
    },
}

impl SiriError {
    /// Wrap a remote failure with the exchange it belongs to.
    pub fn remote(operation: SoapAction, source: impl Into<RemoteError>) -> Self {
        SiriError::Remote {
            operation,
            source: source.into(),
        }
    }

    /// Whether the failure happened on or after the network call.
    pub fn is_remote(&self) -> bool {
        matches!(self, SiriError::Remote { .. })
    }
}

impl From<ConfigError> for SiriError {
    fn from(err: ConfigError) -> Self {
        SiriError::Local(LocalError::InvalidConfig(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_display_names_operation() {
        let err = SiriError::remote(SoapAction::GetStopMonitoring, RemoteError::UnexpectedStatus);
        assert_eq!(
            err.to_string(),
            "GetStopMonitoring remote error: status not true in response body"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn cardinality_display() {
        let err = RemoteError::UnexpectedCardinality {
            list: "MonitoredStopVisit",
            expected: 1,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "invalid number of MonitoredStopVisit: expected 1, got 0"
        );
    }

    #[test]
    fn local_is_not_remote() {
        let err = SiriError::from(ConfigError::MissingField("requestor_ref"));
        assert!(!err.is_remote());
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing required configuration value: requestor_ref"
        );
    }

    #[test]
    fn decode_errors_are_remote() {
        let decode = DecodeError::MalformedTimestamp {
            raw: "nope".into(),
            reason: "wrong length",
        };
        let err = SiriError::remote(SoapAction::CheckStatus, decode);
        assert!(err.is_remote());
        assert!(matches!(
            err,
            SiriError::Remote {
                source: RemoteError::Decode(_),
                ..
            }
        ));
    }
}
