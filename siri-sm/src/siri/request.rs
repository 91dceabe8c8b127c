//! SOAP request construction.
//!
//! Each exchange has a `build_*` function that validates its configuration,
//! derives the message identifier from the request timestamp and renders
//! the body through an askama template. Builders are pure: the same
//! inputs always produce the same request.

use std::fmt;
use std::str::FromStr;

use askama::Template;
use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::config::{ConfigError, SubscribeConfig, SupplierConfig};
use crate::domain::{
    SubscribeRequestEntry, encode_timestamp, format_duration, format_identifier_timestamp,
    format_request_timestamp,
};

use super::error::LocalError;

/// Value of the `Content-Type` header on every request.
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Name of the header carrying the SOAP action, spelled as suppliers expect.
pub const SOAP_ACTION_HEADER: &str = "SOAPAction";

/// Stop visits per line asked for by GetStopMonitoring.
pub const MINIMUM_STOP_VISITS_PER_LINE: u32 = 2;

/// The three supported SIRI exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoapAction {
    CheckStatus,
    GetStopMonitoring,
    Subscribe,
}

impl SoapAction {
    pub const ALL: [SoapAction; 3] = [
        SoapAction::CheckStatus,
        SoapAction::GetStopMonitoring,
        SoapAction::Subscribe,
    ];

    /// The `SOAPAction` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoapAction::CheckStatus => "CheckStatus",
            SoapAction::GetStopMonitoring => "GetStopMonitoring",
            SoapAction::Subscribe => "Subscribe",
        }
    }

    /// Local name of the element the supplier answers with.
    pub fn response_element(&self) -> &'static str {
        match self {
            SoapAction::CheckStatus => "CheckStatusResponse",
            SoapAction::GetStopMonitoring => "GetStopMonitoringResponse",
            SoapAction::Subscribe => "SubscribeResponse",
        }
    }
}

impl fmt::Display for SoapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown SOAP action name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SOAP action: {0:?}")]
pub struct UnknownSoapAction(String);

impl FromStr for SoapAction {
    type Err = UnknownSoapAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoapAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownSoapAction(s.to_string()))
    }
}

/// A fully rendered request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    url: Url,
    action: SoapAction,
    message_identifier: String,
    body: String,
}

impl SoapRequest {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn action(&self) -> SoapAction {
        self.action
    }

    pub fn message_identifier(&self) -> &str {
        &self.message_identifier
    }

    /// The rendered XML body. This is also the display form of the request.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Headers to send with the body, names spelled exactly as listed.
    pub fn headers(&self) -> [(&'static str, &'static str); 2] {
        [
            ("Content-Type", CONTENT_TYPE),
            (SOAP_ACTION_HEADER, self.action.as_str()),
        ]
    }
}

/// Message identifier for a request sent by `requestor_ref` at `requested_at`.
///
/// The stamp has second precision, so two requests from the same requestor
/// within one second share an identifier.
///
/// ```
/// use chrono::DateTime;
/// use siri_sm::siri::message_identifier;
///
/// let at = DateTime::parse_from_rfc3339("2022-08-30T04:34:46+02:00").unwrap();
/// assert_eq!(
///     message_identifier("NAVITIA", &at),
///     "NAVITIA:ResponseMessage:20220830_043446"
/// );
/// ```
pub fn message_identifier(requestor_ref: &str, requested_at: &DateTime<FixedOffset>) -> String {
    format!(
        "{requestor_ref}:ResponseMessage:{}",
        format_identifier_timestamp(requested_at)
    )
}

#[derive(Template)]
#[template(path = "check_status.xml")]
struct CheckStatusTemplate<'a> {
    request_timestamp: String,
    requestor_ref: &'a str,
    message_identifier: &'a str,
}

#[derive(Template)]
#[template(path = "get_stop_monitoring.xml")]
struct GetStopMonitoringTemplate<'a> {
    request_timestamp: String,
    requestor_ref: &'a str,
    message_identifier: &'a str,
    monitoring_ref: &'a str,
    minimum_stop_visits_per_line: u32,
}

#[derive(Template)]
#[template(path = "subscribe.xml")]
struct SubscribeTemplate<'a> {
    request_timestamp: String,
    requestor_ref: &'a str,
    message_identifier: &'a str,
    consumer_address: &'a str,
    entries: Vec<SubscriptionView<'a>>,
}

/// A subscribe entry with every value already in its wire form.
struct SubscriptionView<'a> {
    subscriber_ref: &'a str,
    subscription_identifier: &'a str,
    initial_termination_time: String,
    message_identifier: &'a str,
    preview_interval: String,
    monitoring_ref: &'a str,
    stop_visit_types: &'a str,
    minimum_stop_visits_per_line: u32,
    incremental_updates: bool,
    change_before_updates: String,
}

impl<'a> From<&'a SubscribeRequestEntry> for SubscriptionView<'a> {
    fn from(entry: &'a SubscribeRequestEntry) -> Self {
        Self {
            subscriber_ref: &entry.subscriber_ref,
            subscription_identifier: &entry.subscription_identifier,
            initial_termination_time: encode_timestamp(&entry.initial_termination_time),
            message_identifier: &entry.message_identifier,
            preview_interval: format_duration(entry.preview_interval),
            monitoring_ref: &entry.monitoring_ref,
            stop_visit_types: &entry.stop_visit_types,
            minimum_stop_visits_per_line: entry.minimum_stop_visits_per_line,
            incremental_updates: entry.incremental_updates,
            change_before_updates: format_duration(entry.change_before_updates),
        }
    }
}

/// Build a CheckStatus request.
pub fn build_check_status(
    config: &SupplierConfig,
    requested_at: &DateTime<FixedOffset>,
) -> Result<SoapRequest, LocalError> {
    let url = config.validate()?;
    let message_identifier = message_identifier(&config.requestor_ref, requested_at);

    let body = CheckStatusTemplate {
        request_timestamp: format_request_timestamp(requested_at),
        requestor_ref: &config.requestor_ref,
        message_identifier: &message_identifier,
    }
    .render()?;

    Ok(SoapRequest {
        url,
        action: SoapAction::CheckStatus,
        message_identifier,
        body,
    })
}

/// Build a GetStopMonitoring request for one composite stop point reference.
pub fn build_get_stop_monitoring(
    config: &SupplierConfig,
    requested_at: &DateTime<FixedOffset>,
    monitoring_ref: &str,
) -> Result<SoapRequest, LocalError> {
    let url = config.validate()?;
    if monitoring_ref.trim().is_empty() {
        return Err(ConfigError::MissingField("monitoring_ref").into());
    }
    let message_identifier = message_identifier(&config.requestor_ref, requested_at);

    let body = GetStopMonitoringTemplate {
        request_timestamp: format_request_timestamp(requested_at),
        requestor_ref: &config.requestor_ref,
        message_identifier: &message_identifier,
        monitoring_ref,
        minimum_stop_visits_per_line: MINIMUM_STOP_VISITS_PER_LINE,
    }
    .render()?;

    Ok(SoapRequest {
        url,
        action: SoapAction::GetStopMonitoring,
        message_identifier,
        body,
    })
}

/// The subscription entries a Subscribe request carries, one per stop point.
pub fn subscribe_entries(
    config: &SubscribeConfig,
    requested_at: &DateTime<FixedOffset>,
) -> Vec<SubscribeRequestEntry> {
    let subscriber_ref = &config.supplier.requestor_ref;
    let settings = &config.settings;
    let message_identifier = format!(
        "{subscriber_ref}:Message:{}",
        format_identifier_timestamp(requested_at)
    );

    config
        .stop_point_ids
        .iter()
        .map(|stop| SubscribeRequestEntry {
            subscriber_ref: subscriber_ref.clone(),
            subscription_identifier: format!("{subscriber_ref}:Subscription:arret_{stop}:LOC"),
            initial_termination_time: *requested_at + settings.initial_termination,
            message_identifier: message_identifier.clone(),
            preview_interval: settings.preview_interval,
            monitoring_ref: stop.to_composite(&config.producer_ref),
            stop_visit_types: settings.stop_visit_types.clone(),
            minimum_stop_visits_per_line: settings.minimum_stop_visits_per_line,
            incremental_updates: settings.incremental_updates,
            change_before_updates: settings.change_before_updates,
        })
        .collect()
}

/// Build a Subscribe request covering every configured stop point.
///
/// Returns the request together with the entries it carries, in
/// configuration order.
pub fn build_subscribe(
    config: &SubscribeConfig,
    requested_at: &DateTime<FixedOffset>,
) -> Result<(SoapRequest, Vec<SubscribeRequestEntry>), LocalError> {
    let url = config.validate()?;
    let message_identifier = message_identifier(&config.supplier.requestor_ref, requested_at);
    let entries = subscribe_entries(config, requested_at);

    let body = SubscribeTemplate {
        request_timestamp: format_request_timestamp(requested_at),
        requestor_ref: &config.supplier.requestor_ref,
        message_identifier: &message_identifier,
        consumer_address: &config.consumer_address,
        entries: entries.iter().map(SubscriptionView::from).collect(),
    }
    .render()?;

    let request = SoapRequest {
        url,
        action: SoapAction::Subscribe,
        message_identifier,
        body,
    };
    Ok((request, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopPointId;

    fn at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2022-08-30T04:34:46+02:00").unwrap()
    }

    fn supplier() -> SupplierConfig {
        SupplierConfig::new("https://siri.example.org/ws", "NAVITIA")
    }

    fn subscribe_config(ids: &[&str]) -> SubscribeConfig {
        SubscribeConfig::new(supplier(), "https://consumer.example.org/push", "ILEVIA")
            .with_stop_points(ids.iter().map(|id| StopPointId::new(*id).unwrap()))
    }

    #[test]
    fn action_names() {
        for action in SoapAction::ALL {
            assert_eq!(action.as_str().parse::<SoapAction>().unwrap(), action);
            assert_eq!(action.to_string(), action.as_str());
        }
        assert!("checkstatus".parse::<SoapAction>().is_err());
    }

    #[test]
    fn check_status_body() {
        let req = build_check_status(&supplier(), &at()).unwrap();

        assert_eq!(req.action(), SoapAction::CheckStatus);
        assert_eq!(req.url().as_str(), "https://siri.example.org/ws");
        assert_eq!(
            req.message_identifier(),
            "NAVITIA:ResponseMessage:20220830_043446"
        );
        assert!(req.body().contains("<sw:CheckStatus>"));
        assert!(
            req.body()
                .contains("<siri:RequestTimestamp>2022-08-30T04:34:46+02:00</siri:RequestTimestamp>")
        );
        assert!(
            req.body()
                .contains("<siri:RequestorRef>NAVITIA</siri:RequestorRef>")
        );
        assert!(req.body().contains(
            "<siri:MessageIdentifier>NAVITIA:ResponseMessage:20220830_043446</siri:MessageIdentifier>"
        ));
    }

    #[test]
    fn headers_are_spelled_exactly() {
        let req = build_check_status(&supplier(), &at()).unwrap();
        assert_eq!(
            req.headers(),
            [
                ("Content-Type", "text/xml; charset=utf-8"),
                ("SOAPAction", "CheckStatus")
            ]
        );
    }

    #[test]
    fn building_is_idempotent() {
        let a = build_check_status(&supplier(), &at()).unwrap();
        let b = build_check_status(&supplier(), &at()).unwrap();
        assert_eq!(a, b);

        let monitoring_ref = "ILEVIA:StopPoint:BP:CAS001:LOC";
        let a = build_get_stop_monitoring(&supplier(), &at(), monitoring_ref).unwrap();
        let b = build_get_stop_monitoring(&supplier(), &at(), monitoring_ref).unwrap();
        assert_eq!(a, b);

        let config = subscribe_config(&["11N001", "CAS001"]);
        let (a, a_entries) = build_subscribe(&config, &at()).unwrap();
        let (b, b_entries) = build_subscribe(&config, &at()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a_entries, b_entries);
    }

    #[test]
    fn response_elements() {
        assert_eq!(SoapAction::CheckStatus.response_element(), "CheckStatusResponse");
        assert_eq!(
            SoapAction::GetStopMonitoring.response_element(),
            "GetStopMonitoringResponse"
        );
        assert_eq!(SoapAction::Subscribe.response_element(), "SubscribeResponse");
    }

    #[test]
    fn identifier_follows_timestamp() {
        let later = at() + chrono::Duration::seconds(1);
        let a = build_check_status(&supplier(), &at()).unwrap();
        let b = build_check_status(&supplier(), &later).unwrap();
        assert_ne!(a.message_identifier(), b.message_identifier());
        assert!(b.message_identifier().ends_with("20220830_043447"));
    }

    #[test]
    fn values_are_escaped() {
        let config = supplier().with_requestor_ref("A&B<C>");
        let req = build_check_status(&config, &at()).unwrap();
        assert!(req.body().contains("A&amp;B&lt;C&gt;"));
        assert!(!req.body().contains("A&B<C>"));
    }

    #[test]
    fn invalid_config_fails_before_rendering() {
        let err = build_check_status(&supplier().with_requestor_ref(""), &at()).unwrap_err();
        assert!(matches!(
            err,
            LocalError::InvalidConfig(ConfigError::MissingField("requestor_ref"))
        ));

        let err = build_check_status(&supplier().with_supplier_address("not a url"), &at())
            .unwrap_err();
        assert!(matches!(
            err,
            LocalError::InvalidConfig(ConfigError::InvalidSupplierAddress { .. })
        ));
    }

    #[test]
    fn stop_monitoring_body() {
        let req =
            build_get_stop_monitoring(&supplier(), &at(), "ILEVIA:StopPoint:BP:CAS001:LOC")
                .unwrap();

        assert_eq!(req.action(), SoapAction::GetStopMonitoring);
        assert_eq!(req.headers()[1], ("SOAPAction", "GetStopMonitoring"));
        assert!(req.body().contains(
            "<siri:MonitoringRef>ILEVIA:StopPoint:BP:CAS001:LOC</siri:MonitoringRef>"
        ));
        assert!(
            req.body()
                .contains("<siri:MinimumStopVisitsPerLine>2</siri:MinimumStopVisitsPerLine>")
        );
    }

    #[test]
    fn stop_monitoring_requires_ref() {
        let err = build_get_stop_monitoring(&supplier(), &at(), " ").unwrap_err();
        assert!(matches!(
            err,
            LocalError::InvalidConfig(ConfigError::MissingField("monitoring_ref"))
        ));
    }

    #[test]
    fn subscribe_entry_values() {
        let entries = subscribe_entries(&subscribe_config(&["CAS001"]), &at());
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.subscriber_ref, "NAVITIA");
        assert_eq!(
            entry.subscription_identifier,
            "NAVITIA:Subscription:arret_CAS001:LOC"
        );
        assert_eq!(entry.monitoring_ref, "ILEVIA:StopPoint:BP:CAS001:LOC");
        assert_eq!(entry.message_identifier, "NAVITIA:Message:20220830_043446");
        assert_eq!(
            encode_timestamp(&entry.initial_termination_time),
            "2022-08-31T04:34:46.000+02:00"
        );
        assert_eq!(format_duration(entry.preview_interval), "PT2H0M0.000S");
        assert_eq!(format_duration(entry.change_before_updates), "PT0M30.000S");
        assert_eq!(entry.stop_visit_types, "departures");
        assert_eq!(entry.minimum_stop_visits_per_line, 2);
        assert!(entry.incremental_updates);
    }

    #[test]
    fn subscribe_preserves_stop_order() {
        let (req, entries) =
            build_subscribe(&subscribe_config(&["11N001", "CAS001", "ACC001"]), &at()).unwrap();

        let ids: Vec<&str> = entries
            .iter()
            .map(|e| e.subscription_identifier.as_str())
            .collect();
        assert_eq!(
            ids,
            [
                "NAVITIA:Subscription:arret_11N001:LOC",
                "NAVITIA:Subscription:arret_CAS001:LOC",
                "NAVITIA:Subscription:arret_ACC001:LOC",
            ]
        );

        let body = req.body();
        assert_eq!(body.matches("<siri:StopMonitoringSubscriptionRequest>").count(), 3);
        let first = body.find("arret_11N001").unwrap();
        let second = body.find("arret_CAS001").unwrap();
        let third = body.find("arret_ACC001").unwrap();
        assert!(first < second && second < third);
        assert!(body.contains("<siri:ConsumerAddress>https:"));
        assert!(body.contains("consumer.example.org"));
        assert!(body.contains("<siri:IncrementalUpdates>true</siri:IncrementalUpdates>"));
        assert!(body.contains("<siri:PreviewInterval>PT2H0M0.000S</siri:PreviewInterval>"));
    }

    #[test]
    fn subscribe_without_stops_is_local_error() {
        let err = build_subscribe(&subscribe_config(&[]), &at()).unwrap_err();
        assert!(matches!(
            err,
            LocalError::InvalidConfig(ConfigError::NoStopPoints)
        ));
    }
}
