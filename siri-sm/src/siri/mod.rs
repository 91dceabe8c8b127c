//! SIRI SOAP client.
//!
//! This module builds SIRI request envelopes, sends them through a
//! [`Transport`] and decodes the supplier's answers.
//!
//! Supported exchanges:
//! - `CheckStatus`: liveness probe of the supplier
//! - `GetStopMonitoring`: real-time visits at one stop point
//! - `Subscribe`: push subscriptions for a list of stop points

mod client;
mod convert;
mod error;
mod mock;
mod pretty;
mod request;
mod transport;
mod types;

pub use client::{Exchange, SiriClient};
pub use convert::{
    CheckStatusMessage, SiriMessage, StopMonitoringMessage, SubscribeMessage, parse_check_status,
    parse_stop_monitoring, parse_subscribe,
};
pub use error::{LocalError, RemoteError, SiriError};
pub use mock::MockTransport;
pub use pretty::pretty_print_xml;
pub use request::{
    CONTENT_TYPE, MINIMUM_STOP_VISITS_PER_LINE, SOAP_ACTION_HEADER, SoapAction, SoapRequest,
    UnknownSoapAction, build_check_status, build_get_stop_monitoring, build_subscribe,
    message_identifier, subscribe_entries,
};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
pub use types::{Envelope, element_namespace};
