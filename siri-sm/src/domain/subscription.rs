//! Subscription and status domain types.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

/// One stop monitoring subscription to request from the supplier.
///
/// A Subscribe call carries one entry per configured stop point, in the
/// order the stop points were configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequestEntry {
    pub subscriber_ref: String,
    pub subscription_identifier: String,
    pub initial_termination_time: DateTime<FixedOffset>,
    /// Identifier of the embedded stop monitoring request.
    pub message_identifier: String,
    pub preview_interval: Duration,
    /// Composite stop point reference, as sent on the wire.
    pub monitoring_ref: String,
    pub stop_visit_types: String,
    pub minimum_stop_visits_per_line: u32,
    pub incremental_updates: bool,
    pub change_before_updates: Duration,
}

/// The supplier's acknowledgement of one requested subscription.
///
/// Whether an entry was accepted is reported, not enforced: callers decide
/// what a rejected subscription means for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatus {
    pub response_timestamp: DateTime<FixedOffset>,
    pub request_message_ref: String,
    pub subscriber_ref: String,
    pub subscription_ref: String,
    pub accepted: bool,
    pub valid_until: Option<DateTime<FixedOffset>>,
}

/// Outcome of a successful CheckStatus exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckStatusResult {
    /// When the supplier's service last started, with the offset it was sent in.
    pub service_started_time: DateTime<FixedOffset>,

    /// When this client received the positive status.
    pub checked_at: DateTime<Utc>,
}
