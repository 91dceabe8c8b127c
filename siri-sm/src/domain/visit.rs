//! Stop monitoring domain types.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::{LineId, StopPointId};

/// The result of a stop monitoring query for one stop point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopMonitoringDelivery {
    /// Stop point the delivery answers for, when the supplier echoes it.
    pub monitoring_ref: Option<StopPointId>,

    /// Real-time predictions, in document order.
    pub visits: Vec<MonitoredStopVisit>,

    /// Visits withdrawn since the previous delivery, in document order.
    pub cancellations: Vec<StopVisitCancellation>,
}

/// One real-time departure/arrival prediction at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoredStopVisit {
    pub item_identifier: String,
    pub monitoring_ref: StopPointId,
    pub journey: VehicleJourney,
}

/// The vehicle journey serving a monitored stop visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleJourney {
    pub line_ref: LineId,
    pub direction_name: String,
    pub destination_ref: Option<StopPointId>,
    pub destination_name: String,
    pub call: MonitoredCall,
}

/// The call of the journey at the monitored stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoredCall {
    pub stop_point_ref: StopPointId,

    /// Timetabled departure.
    pub aimed_departure_time: Option<DateTime<FixedOffset>>,

    /// Real-time departure estimate.
    pub expected_departure_time: Option<DateTime<FixedOffset>>,
}

impl MonitoredCall {
    /// How late the expected departure is relative to the aimed one.
    ///
    /// Returns `None` unless both times are known. Early departures are negative.
    pub fn delay(&self) -> Option<chrono::Duration> {
        Some(self.expected_departure_time? - self.aimed_departure_time?)
    }
}

/// A previously announced visit that has been withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopVisitCancellation {
    pub item_ref: String,
    pub monitoring_ref: StopPointId,
}
