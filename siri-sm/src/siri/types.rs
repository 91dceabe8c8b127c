//! SIRI response wire types.
//!
//! These types mirror the XML returned by suppliers and are deserialized
//! with quick-xml's serde support. Elements are matched by local name, so
//! namespace prefixes do not matter. Micro-formats (composite references,
//! timestamps) are kept as strings here and decoded during conversion.
//! Namespaces can be looked up separately with [`element_namespace`].

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use serde::Deserialize;

/// SOAP envelope wrapping a message-specific body.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<B> {
    #[serde(rename = "Body")]
    pub body: B,
}

/// The `<XxxResponse>` element common to every answer.
#[derive(Debug, Clone, Deserialize)]
pub struct Response<A> {
    #[serde(rename = "Answer")]
    pub answer: A,
}

// ============================================================================
// CheckStatus
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CheckStatusBody {
    #[serde(rename = "CheckStatusResponse")]
    pub response: Response<CheckStatusAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckStatusAnswer {
    pub status: bool,
    /// RFC 3339 start time of the supplier's service.
    pub service_started_time: String,
}

// ============================================================================
// GetStopMonitoring
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GetStopMonitoringBody {
    #[serde(rename = "GetStopMonitoringResponse")]
    pub response: Response<StopMonitoringAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopMonitoringAnswer {
    pub stop_monitoring_delivery: StopMonitoringDeliveryDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopMonitoringDeliveryDto {
    #[serde(default)]
    pub monitoring_ref: Option<String>,
    #[serde(default, rename = "MonitoredStopVisit")]
    pub visits: Vec<MonitoredStopVisitDto>,
    #[serde(default, rename = "MonitoredStopVisitCancellation")]
    pub cancellations: Vec<StopVisitCancellationDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredStopVisitDto {
    pub item_identifier: String,
    pub monitoring_ref: String,
    pub monitored_vehicle_journey: MonitoredVehicleJourneyDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredVehicleJourneyDto {
    pub line_ref: String,
    #[serde(default)]
    pub direction_name: String,
    #[serde(default)]
    pub destination_ref: Option<String>,
    #[serde(default)]
    pub destination_name: String,
    pub monitored_call: MonitoredCallDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredCallDto {
    pub stop_point_ref: String,
    #[serde(default)]
    pub aimed_departure_time: Option<String>,
    #[serde(default)]
    pub expected_departure_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopVisitCancellationDto {
    pub item_ref: String,
    pub monitoring_ref: String,
}

// ============================================================================
// Subscribe
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeBody {
    #[serde(rename = "SubscribeResponse")]
    pub response: Response<SubscribeAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeAnswer {
    #[serde(default, rename = "ResponseStatus")]
    pub statuses: Vec<ResponseStatusDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseStatusDto {
    pub response_timestamp: String,
    #[serde(default)]
    pub request_message_ref: String,
    #[serde(default)]
    pub subscriber_ref: String,
    #[serde(default)]
    pub subscription_ref: String,
    pub status: bool,
    #[serde(default)]
    pub valid_until: Option<String>,
}

/// Namespace URI bound to the first element named `local_name`.
///
/// Returns `None` if the element is absent, unqualified or the document
/// cannot be read up to it.
pub fn element_namespace(raw: &[u8], local_name: &str) -> Option<String> {
    let mut reader = NsReader::from_reader(raw);
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ResolveResult::Bound(Namespace(ns)), Event::Start(e) | Event::Empty(e)))
                if e.local_name().as_ref() == local_name.as_bytes() =>
            {
                return Some(String::from_utf8_lossy(ns).into_owned());
            }
            Ok((_, Event::Start(e) | Event::Empty(e)))
                if e.local_name().as_ref() == local_name.as_bytes() =>
            {
                return None;
            }
            Ok((_, Event::Eof)) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}
