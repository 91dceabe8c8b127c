//! SIRI client.
//!
//! Drives one exchange end to end: build the request, send it, check the
//! HTTP status and decode the answer. Every exchange returns an
//! [`Exchange`] so the raw request and response bodies are available to
//! the caller whatever the outcome.

use std::time::Instant;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::config::{SubscribeConfig, SupplierConfig};
use crate::domain::{CheckStatusResult, StopMonitoringDelivery, SubscriptionStatus};

use super::convert::{CheckStatusMessage, SiriMessage, StopMonitoringMessage, SubscribeMessage};
use super::error::{RemoteError, SiriError};
use super::request::{
    SoapRequest, build_check_status, build_get_stop_monitoring, build_subscribe,
};
use super::transport::Transport;
use super::types::element_namespace;

/// The outcome of one exchange, with the raw bodies that produced it.
#[derive(Debug)]
pub struct Exchange<T> {
    /// Rendered request body; `None` only if building the request failed.
    pub request_body: Option<String>,
    /// Response body as received; `None` if nothing came back.
    pub response_body: Option<Vec<u8>>,
    /// Namespace URI of the `<{Action}Response>` element, recorded but not checked.
    pub response_namespace: Option<String>,
    pub result: Result<T, SiriError>,
}

impl<T> Exchange<T> {
    fn local(err: impl Into<SiriError>) -> Self {
        Self {
            request_body: None,
            response_body: None,
            response_namespace: None,
            result: Err(err.into()),
        }
    }

    /// Discard the raw bodies.
    pub fn into_result(self) -> Result<T, SiriError> {
        self.result
    }
}

/// A SIRI client over any [`Transport`].
///
/// The client holds no mutable state, so it can be shared between tasks.
#[derive(Debug, Clone)]
pub struct SiriClient<T> {
    transport: T,
}

impl<T: Transport> SiriClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask the supplier whether its service is up.
    pub async fn check_status(
        &self,
        config: &SupplierConfig,
        requested_at: &DateTime<FixedOffset>,
    ) -> Exchange<CheckStatusResult> {
        let request = match build_check_status(config, requested_at) {
            Ok(request) => request,
            Err(e) => return Exchange::local(e),
        };
        self.exchange(request, || CheckStatusMessage {
            checked_at: Utc::now(),
        })
        .await
    }

    /// Fetch the current stop visits at one composite stop point reference.
    pub async fn get_stop_monitoring(
        &self,
        config: &SupplierConfig,
        requested_at: &DateTime<FixedOffset>,
        monitoring_ref: &str,
    ) -> Exchange<StopMonitoringDelivery> {
        let request = match build_get_stop_monitoring(config, requested_at, monitoring_ref) {
            Ok(request) => request,
            Err(e) => return Exchange::local(e),
        };
        self.exchange(request, || StopMonitoringMessage).await
    }

    /// Subscribe to stop monitoring for every configured stop point.
    ///
    /// The supplier must answer with one status per requested subscription,
    /// in request order.
    pub async fn subscribe(
        &self,
        config: &SubscribeConfig,
        requested_at: &DateTime<FixedOffset>,
    ) -> Exchange<Vec<SubscriptionStatus>> {
        let (request, entries) = match build_subscribe(config, requested_at) {
            Ok(built) => built,
            Err(e) => return Exchange::local(e),
        };
        let requested = entries.len();
        self.exchange(request, move || SubscribeMessage { requested }).await
    }

    /// Send `request` and decode the answer with the message `on_response`
    /// builds once the response has arrived.
    async fn exchange<M: SiriMessage>(
        &self,
        request: SoapRequest,
        on_response: impl FnOnce() -> M,
    ) -> Exchange<M::Output> {
        let action = M::ACTION;
        let started = Instant::now();
        debug!(
            %action,
            message_identifier = request.message_identifier(),
            body = request.body(),
            "sending request"
        );

        let request_body = Some(request.body().to_string());

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(%action, error = %e, "call failed");
                return Exchange {
                    request_body,
                    response_body: None,
                    response_namespace: None,
                    result: Err(SiriError::remote(action, e)),
                };
            }
        };

        debug!(
            %action,
            status = response.status,
            body = %String::from_utf8_lossy(&response.body),
            "received response"
        );

        let message = on_response();
        let response_namespace = element_namespace(&response.body, action.response_element());

        let result = if response.is_success() {
            message.parse(&response.body)
        } else {
            Err(RemoteError::UnexpectedHttpStatus {
                status: response.status,
            })
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let result = match result {
            Ok(output) => {
                info!(%action, status = response.status, elapsed_ms, "exchange succeeded");
                Ok(output)
            }
            Err(e) => {
                warn!(%action, status = response.status, elapsed_ms, error = %e, "exchange failed");
                Err(SiriError::remote(action, e))
            }
        };

        Exchange {
            request_body,
            response_body: Some(response.body),
            response_namespace,
            result,
        }
    }
}
