//! Decoding and validation of SIRI responses.
//!
//! Each exchange implements [`SiriMessage`], which names the envelope body
//! it expects and turns that body into domain values. Conversion checks
//! the structural rules of the message (status flag, list cardinalities)
//! before decoding any reference or timestamp.

use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;

use crate::domain::{
    CheckStatusResult, DecodeError, LineId, MonitoredCall, MonitoredStopVisit, StopMonitoringDelivery,
    StopPointId, StopVisitCancellation, SubscriptionStatus, VehicleJourney, decode_timestamp,
};

use super::error::RemoteError;
use super::request::SoapAction;
use super::types::{
    CheckStatusBody, Envelope, GetStopMonitoringBody, MonitoredStopVisitDto, ResponseStatusDto,
    StopVisitCancellationDto, SubscribeBody,
};

/// Visits a single-stop query must return.
const EXPECTED_VISITS: usize = 1;

/// Cancellations a single-stop query must return.
const EXPECTED_CANCELLATIONS: usize = 0;

/// A SIRI response shape and the rules for turning it into domain values.
pub trait SiriMessage {
    /// The exchange this message answers.
    const ACTION: SoapAction;

    /// Contents of the SOAP `Body` element.
    type Body: DeserializeOwned;

    /// The domain value extracted on success.
    type Output;

    /// Validate a decoded body and extract the domain value.
    fn extract(&self, body: Self::Body) -> Result<Self::Output, RemoteError>;

    /// Decode a raw response body and extract the domain value.
    fn parse(&self, raw: &[u8]) -> Result<Self::Output, RemoteError> {
        let envelope: Envelope<Self::Body> = quick_xml::de::from_reader(raw)?;
        self.extract(envelope.body)
    }
}

/// CheckStatus response, stamped with the time the answer was received.
#[derive(Debug, Clone, Copy)]
pub struct CheckStatusMessage {
    pub checked_at: DateTime<Utc>,
}

impl SiriMessage for CheckStatusMessage {
    const ACTION: SoapAction = SoapAction::CheckStatus;
    type Body = CheckStatusBody;
    type Output = CheckStatusResult;

    fn extract(&self, body: CheckStatusBody) -> Result<CheckStatusResult, RemoteError> {
        let answer = body.response.answer;
        if !answer.status {
            return Err(RemoteError::UnexpectedStatus);
        }

        let raw = answer.service_started_time.trim();
        let service_started_time =
            DateTime::parse_from_rfc3339(raw).map_err(|_| DecodeError::MalformedTimestamp {
                raw: raw.to_string(),
                reason: "not an RFC 3339 timestamp",
            })?;

        Ok(CheckStatusResult {
            service_started_time,
            checked_at: self.checked_at,
        })
    }
}

/// GetStopMonitoring response for a single stop point.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopMonitoringMessage;

impl SiriMessage for StopMonitoringMessage {
    const ACTION: SoapAction = SoapAction::GetStopMonitoring;
    type Body = GetStopMonitoringBody;
    type Output = StopMonitoringDelivery;

    fn extract(&self, body: GetStopMonitoringBody) -> Result<StopMonitoringDelivery, RemoteError> {
        let delivery = body.response.answer.stop_monitoring_delivery;

        check_count("MonitoredStopVisit", EXPECTED_VISITS, delivery.visits.len())?;
        check_count(
            "MonitoredStopVisitCancellation",
            EXPECTED_CANCELLATIONS,
            delivery.cancellations.len(),
        )?;

        let monitoring_ref = optional(delivery.monitoring_ref.as_deref())
            .map(StopPointId::decode)
            .transpose()?;
        let visits = delivery
            .visits
            .iter()
            .map(convert_visit)
            .collect::<Result<_, _>>()?;
        let cancellations = delivery
            .cancellations
            .iter()
            .map(convert_cancellation)
            .collect::<Result<_, _>>()?;

        Ok(StopMonitoringDelivery {
            monitoring_ref,
            visits,
            cancellations,
        })
    }
}

/// Subscribe response for a request carrying `requested` subscriptions.
#[derive(Debug, Clone, Copy)]
pub struct SubscribeMessage {
    pub requested: usize,
}

impl SiriMessage for SubscribeMessage {
    const ACTION: SoapAction = SoapAction::Subscribe;
    type Body = SubscribeBody;
    type Output = Vec<SubscriptionStatus>;

    fn extract(&self, body: SubscribeBody) -> Result<Vec<SubscriptionStatus>, RemoteError> {
        let statuses = body.response.answer.statuses;
        check_count("ResponseStatus", self.requested, statuses.len())?;

        statuses.iter().map(convert_response_status).collect()
    }
}

/// Decode a CheckStatus response body.
pub fn parse_check_status(
    raw: &[u8],
    checked_at: DateTime<Utc>,
) -> Result<CheckStatusResult, RemoteError> {
    CheckStatusMessage { checked_at }.parse(raw)
}

/// Decode a GetStopMonitoring response body.
pub fn parse_stop_monitoring(raw: &[u8]) -> Result<StopMonitoringDelivery, RemoteError> {
    StopMonitoringMessage.parse(raw)
}

/// Decode a Subscribe response body for `requested` subscriptions.
pub fn parse_subscribe(
    raw: &[u8],
    requested: usize,
) -> Result<Vec<SubscriptionStatus>, RemoteError> {
    SubscribeMessage { requested }.parse(raw)
}

fn check_count(list: &'static str, expected: usize, actual: usize) -> Result<(), RemoteError> {
    if actual != expected {
        return Err(RemoteError::UnexpectedCardinality {
            list,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Treat a blank element the same as a missing one.
fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, DecodeError> {
    optional(value).map(decode_timestamp).transpose()
}

fn convert_visit(dto: &MonitoredStopVisitDto) -> Result<MonitoredStopVisit, DecodeError> {
    let journey = &dto.monitored_vehicle_journey;
    let call = &journey.monitored_call;

    Ok(MonitoredStopVisit {
        item_identifier: dto.item_identifier.trim().to_string(),
        monitoring_ref: StopPointId::decode(dto.monitoring_ref.trim())?,
        journey: VehicleJourney {
            line_ref: LineId::decode(journey.line_ref.trim())?,
            direction_name: journey.direction_name.trim().to_string(),
            destination_ref: optional(journey.destination_ref.as_deref())
                .map(StopPointId::decode)
                .transpose()?,
            destination_name: journey.destination_name.trim().to_string(),
            call: MonitoredCall {
                stop_point_ref: StopPointId::decode(call.stop_point_ref.trim())?,
                aimed_departure_time: optional_timestamp(call.aimed_departure_time.as_deref())?,
                expected_departure_time: optional_timestamp(
                    call.expected_departure_time.as_deref(),
                )?,
            },
        },
    })
}

fn convert_cancellation(dto: &StopVisitCancellationDto) -> Result<StopVisitCancellation, DecodeError> {
    Ok(StopVisitCancellation {
        item_ref: dto.item_ref.trim().to_string(),
        monitoring_ref: StopPointId::decode(dto.monitoring_ref.trim())?,
    })
}

fn convert_response_status(dto: &ResponseStatusDto) -> Result<SubscriptionStatus, RemoteError> {
    Ok(SubscriptionStatus {
        response_timestamp: decode_timestamp(dto.response_timestamp.trim())?,
        request_message_ref: dto.request_message_ref.trim().to_string(),
        subscriber_ref: dto.subscriber_ref.trim().to_string(),
        subscription_ref: dto.subscription_ref.trim().to_string(),
        accepted: dto.status,
        valid_until: optional_timestamp(dto.valid_until.as_deref())?,
    })
}
