use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Error;
use crate::session::SessionStore;
use crate::transport::{RequestOptions, Transport, TransportExt};
use crate::types::{ApiEnvelope, DeviceId, RefreshOutcome, RefreshedTokens};

/// Obtains a new token pair without going through the browser-facing
/// refresh endpoint.
pub trait RefreshStrategy: Send + Sync + 'static {
    fn refresh(&self) -> impl Future<Output = RefreshOutcome> + Send;
}

/// Placeholder for a server platform that has no way to refresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefreshStrategy;

impl RefreshStrategy for NoRefreshStrategy {
    async fn refresh(&self) -> RefreshOutcome {
        RefreshOutcome::failed("no refresh strategy configured")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
    device_id: &'a DeviceId,
}

/// Calls the upstream refresh endpoint directly from the server.
///
/// Outbound calls from a server process do not carry the incoming request's
/// cookies, so the refresh token and device id are read from the store and
/// sent in the body. The store is only read here; persisting the new pair is
/// left to the platform that invoked the strategy.
pub struct UpstreamRefresh<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    path: String,
}

impl<T: Transport, S: SessionStore> UpstreamRefresh<T, S> {
    #[must_use]
    pub fn new(transport: Arc<T>, store: Arc<S>, path: impl Into<String>) -> Self {
        Self {
            transport,
            store,
            path: path.into(),
        }
    }

    async fn try_refresh(&self) -> Result<RefreshedTokens, Error> {
        let refresh_token = self
            .store
            .get_refresh_token()
            .await?
            .ok_or_else(|| Error::Token("no refresh token in session".into()))?;
        let device_id = self.store.get_device_id().await?;

        let body = serde_json::to_value(RefreshBody {
            refresh_token: &refresh_token,
            device_id: &device_id,
        })
        .map_err(|e| Error::Token(e.to_string()))?;

        let response = self
            .transport
            .post(&self.path, Some(body), RequestOptions::default())
            .await?;
        response
            .json::<ApiEnvelope<RefreshedTokens>>()?
            .into_data()
            .map_err(Error::Rejected)
    }
}

impl<T: Transport, S: SessionStore> RefreshStrategy for UpstreamRefresh<T, S> {
    async fn refresh(&self) -> RefreshOutcome {
        match self.try_refresh().await {
            Ok(tokens) => RefreshOutcome::Refreshed(tokens),
            Err(e) => {
                tracing::warn!(error = %e, "Upstream token refresh failed");
                RefreshOutcome::failed(e.to_string())
            }
        }
    }
}
