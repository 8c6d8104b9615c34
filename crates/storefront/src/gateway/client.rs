//! The gateway: single interception point for outbound requests.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{Span, debug, error, instrument, warn};
use uuid::Uuid;

use emporium_core::Credential;

use super::transport::{ApiRequest, ApiResponse, REQUEST_ID_HEADER, Transport};
use super::{GatewayError, GatewayEvent, error_message};
use crate::error::clear_sentry_user;
use crate::session::SessionStore;

/// Buffered gateway events per subscriber before the slowest one lags.
const EVENT_CAPACITY: usize = 16;

/// Client for the catalog, inventory, order, user, and auth endpoints.
///
/// Cheap to clone; all clones share the transport, session, and event
/// channel.
#[derive(Debug, Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

#[derive(Debug)]
struct GatewayInner {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    events: broadcast::Sender<GatewayEvent>,
}

impl Gateway {
    /// Create a gateway that authorizes requests with `session`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                session,
                events,
            }),
        }
    }

    /// Subscribe to gateway events such as [`GatewayEvent::AuthExpired`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.events.subscribe()
    }

    /// Send a request through the credential and unauthorized policies.
    ///
    /// Non-2xx responses are returned as errors. A 401 clears the session
    /// (if the request carried its current credential) and publishes
    /// [`GatewayEvent::AuthExpired`] before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] on 401, [`GatewayError::Rejected`]
    /// on any other non-success status, and transport errors as-is.
    #[instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path, request_id)
    )]
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            request.headers.insert(REQUEST_ID_HEADER, value);
        }

        let credential = self.inner.session.credential();
        if let Some(credential) = &credential {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
                .map_err(|_| GatewayError::Transport("credential is not a valid header".to_string()))?;
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
        }

        let path = request.path.clone();
        let response = self.inner.transport.send(request).await?;
        debug!(status = %response.status, "Response received");

        if response.status == StatusCode::UNAUTHORIZED {
            let (message, _) = error_message(response.status, &response.body);
            self.handle_unauthorized(credential.as_ref(), &path);
            return Err(GatewayError::Unauthorized { message });
        }

        if !response.status.is_success() {
            let (message, field_errors) = error_message(response.status, &response.body);
            debug!(status = %response.status, message = %message, "Request rejected");
            return Err(GatewayError::Rejected {
                status: response.status,
                message,
                field_errors,
            });
        }

        Ok(response)
    }

    /// Execute a request and decode its JSON body.
    pub(super) async fn fetch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, GatewayError> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            error!(
                path = %path,
                error = %e,
                body = %response.body.chars().take(500).collect::<String>(),
                "Failed to decode response body"
            );
            GatewayError::Decode(e)
        })
    }

    /// Execute a request whose body is ignored.
    pub(super) async fn send_empty(&self, request: ApiRequest) -> Result<(), GatewayError> {
        self.execute(request).await.map(|_| ())
    }

    /// Tear down the session for a 401 and tell subscribers once.
    ///
    /// A request that carried a credential only triggers teardown if that
    /// credential is still the active one; concurrent requests rejected for
    /// the same credential therefore produce a single event. A request sent
    /// without a credential always produces one.
    fn handle_unauthorized(&self, sent_with: Option<&Credential>, path: &str) {
        let expired = sent_with.is_none_or(|credential| self.inner.session.expire(credential));
        if !expired {
            debug!(path, "Unauthorized response for an already-expired credential");
            return;
        }

        warn!(path, "Request unauthorized; session cleared");
        clear_sentry_user();
        // No subscribers is fine: nobody is listening for navigation.
        let _ = self.inner.events.send(GatewayEvent::AuthExpired {
            path: path.to_string(),
        });
    }
}
