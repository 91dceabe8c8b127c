//! Domain types for SIRI stop monitoring.
//!
//! This module contains the normalized values produced by decoding SIRI
//! envelopes, and the codecs for SIRI's micro-formats (composite
//! references and millisecond timestamps). Decoding functions are pure and
//! validate at construction, so code that receives these types can trust
//! their validity.

mod error;
mod reference;
mod subscription;
mod time;
mod visit;

pub use error::DecodeError;
pub use reference::{
    InvalidStopPointId, LINE_TAG, LineId, STOP_POINT_TAG, StopPointId, decode_composite_ref,
};
pub use subscription::{CheckStatusResult, SubscribeRequestEntry, SubscriptionStatus};
pub use time::{
    decode_timestamp, encode_timestamp, format_duration, format_identifier_timestamp,
    format_request_timestamp,
};
pub use visit::{
    MonitoredCall, MonitoredStopVisit, StopMonitoringDelivery, StopVisitCancellation,
    VehicleJourney,
};
