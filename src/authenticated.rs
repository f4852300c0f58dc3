use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use reqwest::header::AUTHORIZATION;

use crate::error::Error;
use crate::platform::Platform;
use crate::token::{TokenProvider, bearer};
use crate::transport::{Request, Response, Transport};
use crate::types::RefreshOutcome;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Transport decorator that keeps requests authenticated.
///
/// Every request gets `Authorization: Bearer <token>` from the
/// [`TokenProvider`]. A 401 makes the caller join the single in-flight
/// refresh of this instance; if it succeeds the request is replayed once
/// with the new token, otherwise the original 401 is returned.
///
/// ```rust,ignore
/// let store = Arc::new(ClientSessionStore::new(MemoryStorage::new()));
/// let origin = Arc::new(HttpTransport::from_config(&config));
/// let platform = BrowserPlatform::new(origin.clone(), navigate, &config).with_store(store.clone());
///
/// let api = AuthenticatedTransport::new(
///     HttpTransport::from_config(&config),
///     SessionTokenProvider::new(store),
///     platform,
/// );
/// let me = api.get("/users/me", RequestOptions::default()).await?;
/// ```
pub struct AuthenticatedTransport<T, K, P> {
    inner: T,
    tokens: K,
    platform: Arc<P>,
    pending: Arc<Mutex<Option<PendingRefresh>>>,
}

impl<T: Transport, K: TokenProvider, P: Platform> AuthenticatedTransport<T, K, P> {
    #[must_use]
    pub fn new(inner: T, tokens: K, platform: P) -> Self {
        Self {
            inner,
            tokens,
            platform: Arc::new(platform),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The refresh currently in flight, or a new one.
    ///
    /// The refresh future empties the slot itself when it settles, so a 401
    /// arriving afterwards starts a new cycle instead of reusing the old result.
    fn join_refresh(&self) -> PendingRefresh {
        let mut slot = self.pending.lock();
        if let Some(pending) = slot.as_ref() {
            return pending.clone();
        }

        let platform = Arc::clone(&self.platform);
        let owner = Arc::downgrade(&self.pending);
        let pending = async move {
            tracing::debug!("Refreshing session");
            let outcome = platform.refresh().await;
            if let RefreshOutcome::Failed(reason) = &outcome {
                tracing::warn!(reason = %reason, "Session refresh failed");
                platform.on_unauthenticated();
            }
            if let Some(slot) = owner.upgrade() {
                slot.lock().take();
            }
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(pending.clone());
        pending
    }
}

impl<T: Transport, K: TokenProvider, P: Platform> Transport for AuthenticatedTransport<T, K, P> {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let token = self.tokens.get_token().await?;
        let first = authorize(request.clone(), token.as_deref())?;

        let unauthorized = match self.inner.send(first).await {
            Err(e) if e.is_unauthorized() => e,
            other => return other,
        };

        tracing::debug!(method = %request.method, path = %request.path, "Request unauthorized, waiting for refresh");
        match self.join_refresh().await {
            RefreshOutcome::Refreshed(tokens) => {
                // Single replay; a second 401 goes straight back to the caller.
                let retry = authorize(request, Some(&tokens.access_token))?;
                self.inner.send(retry).await
            }
            RefreshOutcome::Failed(_) => Err(unauthorized),
        }
    }
}

fn authorize(mut request: Request, token: Option<&str>) -> Result<Request, Error> {
    if let Some(token) = token {
        request.options.headers.insert(AUTHORIZATION, bearer(token)?);
    }
    Ok(request)
}
