//! Client configuration.
//!
//! Configuration is plain data with builder-style setters. Nothing is
//! checked at construction; each exchange calls `validate()` before it
//! renders a request, so a bad value is reported as a local error and no
//! network activity happens.

use chrono::Duration;
use url::Url;

use crate::domain::{InvalidStopPointId, StopPointId};

/// Default request timeout for the HTTP transport.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    MissingField(&'static str),

    #[error("invalid supplier address {address:?}: {reason}")]
    InvalidSupplierAddress { address: String, reason: String },

    #[error("no stop points configured for subscription")]
    NoStopPoints,

    #[error(transparent)]
    InvalidStopPoint(#[from] InvalidStopPointId),
}

/// Where to reach the supplier and who we are.
///
/// Used by every exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierConfig {
    /// Absolute `http`/`https` URL of the supplier's SIRI endpoint.
    pub supplier_address: String,
    /// Subscriber reference sent as `RequestorRef` in every request.
    pub requestor_ref: String,
}

impl SupplierConfig {
    pub fn new(supplier_address: impl Into<String>, requestor_ref: impl Into<String>) -> Self {
        Self {
            supplier_address: supplier_address.into(),
            requestor_ref: requestor_ref.into(),
        }
    }

    /// Set a different supplier endpoint.
    pub fn with_supplier_address(mut self, address: impl Into<String>) -> Self {
        self.supplier_address = address.into();
        self
    }

    /// Set a different requestor reference.
    pub fn with_requestor_ref(mut self, requestor_ref: impl Into<String>) -> Self {
        self.requestor_ref = requestor_ref.into();
        self
    }

    /// Check the configuration and return the parsed supplier URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.requestor_ref.trim().is_empty() {
            return Err(ConfigError::MissingField("requestor_ref"));
        }
        if self.supplier_address.trim().is_empty() {
            return Err(ConfigError::MissingField("supplier_address"));
        }

        let url =
            Url::parse(&self.supplier_address).map_err(|e| ConfigError::InvalidSupplierAddress {
                address: self.supplier_address.clone(),
                reason: e.to_string(),
            })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidSupplierAddress {
                address: self.supplier_address.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        Ok(url)
    }
}

/// Per-entry parameters of a stop monitoring subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Added to the request timestamp to get `InitialTerminationTime`.
    pub initial_termination: Duration,
    pub preview_interval: Duration,
    pub stop_visit_types: String,
    pub minimum_stop_visits_per_line: u32,
    pub incremental_updates: bool,
    pub change_before_updates: Duration,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            initial_termination: Duration::days(1),
            preview_interval: Duration::hours(2),
            stop_visit_types: "departures".to_string(),
            minimum_stop_visits_per_line: 2,
            incremental_updates: true,
            change_before_updates: Duration::seconds(30),
        }
    }
}

/// Configuration of the Subscribe exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeConfig {
    pub supplier: SupplierConfig,
    /// Endpoint the supplier should push notifications to.
    pub consumer_address: String,
    /// Network prefix used in subscribed monitoring refs.
    pub producer_ref: String,
    /// Stop points to subscribe to, in request order.
    pub stop_point_ids: Vec<StopPointId>,
    pub settings: SubscriptionSettings,
}

impl SubscribeConfig {
    pub fn new(
        supplier: SupplierConfig,
        consumer_address: impl Into<String>,
        producer_ref: impl Into<String>,
    ) -> Self {
        Self {
            supplier,
            consumer_address: consumer_address.into(),
            producer_ref: producer_ref.into(),
            stop_point_ids: Vec::new(),
            settings: SubscriptionSettings::default(),
        }
    }

    /// Set the stop points to subscribe to.
    pub fn with_stop_points(mut self, ids: impl IntoIterator<Item = StopPointId>) -> Self {
        self.stop_point_ids = ids.into_iter().collect();
        self
    }

    /// Override the per-entry subscription parameters.
    pub fn with_settings(mut self, settings: SubscriptionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Check the configuration and return the parsed supplier URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = self.supplier.validate()?;

        if self.consumer_address.trim().is_empty() {
            return Err(ConfigError::MissingField("consumer_address"));
        }
        if self.producer_ref.trim().is_empty() {
            return Err(ConfigError::MissingField("producer_ref"));
        }
        if self.stop_point_ids.is_empty() {
            return Err(ConfigError::NoStopPoints);
        }

        Ok(url)
    }
}

/// Parse a comma-separated list of short stop point ids.
///
/// Blank items are skipped, so trailing commas are harmless.
pub fn parse_stop_point_list(s: &str) -> Result<Vec<StopPointId>, ConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| StopPointId::new(item).map_err(ConfigError::from))
        .collect()
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransportConfig {
    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
