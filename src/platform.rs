//! Execution-context strategies for the authenticated transport.
//!
//! A [`Platform`] is picked once when the transport is built and decides how
//! a refresh is performed and what happens when it fails.

use std::future::Future;
use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::Error;
use crate::refresh::{NoRefreshStrategy, RefreshStrategy};
use crate::session::SessionStore;
use crate::transport::{RequestOptions, Transport, TransportExt};
use crate::types::{ApiEnvelope, RefreshOutcome, RefreshedTokens, Session};

pub trait Platform: Send + Sync + 'static {
    /// Performs one refresh and, on success, stores the new session.
    fn refresh(&self) -> impl Future<Output = RefreshOutcome> + Send;

    /// Runs once per failed refresh cycle.
    fn on_unauthenticated(&self);
}

/// Moves the browser to another page.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}

/// Writes the refreshed pair into `store`, keeping user fields the refresh
/// response did not include.
pub(crate) async fn persist_refreshed<S: SessionStore>(
    store: &S,
    tokens: &RefreshedTokens,
) -> Result<Session, Error> {
    let previous = store.get_user_fields().await?;
    let session = Session::refreshed(previous, tokens);
    store.save_session(&session).await?;
    Ok(session)
}

/// Server request context: refresh through a [`RefreshStrategy`], persist
/// into the request's cookie store, and leave presentation to the caller.
pub struct ServerPlatform<S, R = NoRefreshStrategy> {
    store: Arc<S>,
    strategy: R,
}

impl<S: SessionStore> ServerPlatform<S> {
    /// Platform without a strategy: every refresh fails.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            strategy: NoRefreshStrategy,
        }
    }
}

impl<S: SessionStore, R: RefreshStrategy> ServerPlatform<S, R> {
    #[must_use]
    pub fn with_strategy<R2: RefreshStrategy>(self, strategy: R2) -> ServerPlatform<S, R2> {
        ServerPlatform {
            store: self.store,
            strategy,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: SessionStore, R: RefreshStrategy> Platform for ServerPlatform<S, R> {
    async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.strategy.refresh().await;
        let RefreshOutcome::Refreshed(tokens) = &outcome else {
            return outcome;
        };
        match persist_refreshed(self.store.as_ref(), tokens).await {
            Ok(_) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store refreshed session cookies");
                RefreshOutcome::failed(e.to_string())
            }
        }
    }

    fn on_unauthenticated(&self) {
        tracing::debug!("Session refresh failed, returning 401 to caller");
    }
}

/// Browser context: refresh through the same-origin BFF endpoint and sync
/// the result into the client store; send the user to the login page when
/// that fails.
///
/// `transport` must point at the app's own origin and carry the browser's
/// cookies, since the BFF reads the refresh token from them. Outside a real
/// browser, build it with [`HttpTransport::with_cookie_store`] and log in
/// through the BFF login route with that same transport.
///
/// [`HttpTransport::with_cookie_store`]: crate::HttpTransport::with_cookie_store
pub struct BrowserPlatform<T, S, N> {
    transport: Arc<T>,
    store: Option<Arc<S>>,
    navigator: N,
    refresh_path: String,
    login_route: String,
}

impl<T: Transport, S: SessionStore, N: Navigator> BrowserPlatform<T, S, N> {
    #[must_use]
    pub fn new(transport: Arc<T>, navigator: N, config: &TransportConfig) -> Self {
        Self {
            transport,
            store: None,
            navigator,
            refresh_path: config.bff_refresh_path(),
            login_route: config.login_route.clone(),
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    async fn fetch_tokens(&self) -> Result<RefreshedTokens, Error> {
        let response = self
            .transport
            .post(&self.refresh_path, None, RequestOptions::default())
            .await?;
        response
            .json::<ApiEnvelope<RefreshedTokens>>()?
            .into_data()
            .map_err(Error::Rejected)
    }
}

impl<T: Transport, S: SessionStore, N: Navigator> Platform for BrowserPlatform<T, S, N> {
    async fn refresh(&self) -> RefreshOutcome {
        let tokens = match self.fetch_tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "BFF token refresh failed");
                return RefreshOutcome::failed(e.to_string());
            }
        };
        let Some(store) = &self.store else {
            tracing::error!("No client session store configured, cannot keep refreshed tokens");
            return RefreshOutcome::failed("no client session store configured");
        };
        match persist_refreshed(store.as_ref(), &tokens).await {
            Ok(_) => RefreshOutcome::Refreshed(tokens),
            Err(e) => {
                tracing::error!(error = %e, "Failed to store refreshed session");
                RefreshOutcome::failed(e.to_string())
            }
        }
    }

    fn on_unauthenticated(&self) {
        tracing::info!(route = %self.login_route, "Session expired, redirecting to login");
        self.navigator.navigate(&self.login_route);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::session::{ClientSessionStore, MemoryStorage};
    use crate::transport::HttpTransport;

    type Store = ClientSessionStore<MemoryStorage>;

    fn config(url: &str) -> TransportConfig {
        TransportConfig::new(url.parse().unwrap())
    }

    fn transport(url: &str) -> Arc<HttpTransport> {
        Arc::new(HttpTransport::new(url.parse().unwrap(), Duration::from_secs(5)))
    }

    struct Fixed(RefreshOutcome);

    impl RefreshStrategy for Fixed {
        async fn refresh(&self) -> RefreshOutcome {
            self.0.clone()
        }
    }

    fn tokens(access: &str, refresh: &str) -> RefreshedTokens {
        RefreshedTokens {
            access_token: access.into(),
            refresh_token: refresh.into(),
            user_id: None,
            nickname: None,
        }
    }

    #[tokio::test]
    async fn browser_refresh_syncs_client_store() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/refresh")
            .with_status(200)
            .with_body(r#"{ "success": true, "data": { "accessToken": "A2", "refreshToken": "R2" } }"#)
            .expect(1)
            .create_async()
            .await;
        let store = Arc::new(Store::new(MemoryStorage::new()));
        store
            .save_session(&Session::new("A1", "R1").with_user_id(42))
            .await
            .unwrap();

        let platform = BrowserPlatform::new(transport(&server.url()), |_: &str| {}, &config(&server.url()))
            .with_store(store.clone());
        let outcome = platform.refresh().await;

        mock.assert_async().await;
        assert!(outcome.is_success());
        assert_eq!(
            store.get_session().await.unwrap(),
            Some(Session::new("A2", "R2").with_user_id(42))
        );
    }

    #[tokio::test]
    async fn browser_refresh_without_store_fails_soft() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/refresh")
            .with_status(200)
            .with_body(r#"{ "success": true, "data": { "accessToken": "A2", "refreshToken": "R2" } }"#)
            .create_async()
            .await;

        let platform: BrowserPlatform<HttpTransport, Store, _> =
            BrowserPlatform::new(transport(&server.url()), |_: &str| {}, &config(&server.url()));

        let outcome = platform.refresh().await;
        assert_eq!(outcome.error(), Some("no client session store configured"));
    }

    #[tokio::test]
    async fn browser_refresh_http_failure_is_failed_outcome() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/refresh")
            .with_status(401)
            .with_body(r#"{ "success": false }"#)
            .create_async()
            .await;
        let store = Arc::new(Store::new(MemoryStorage::new()));
        store.save_session(&Session::new("A1", "R1")).await.unwrap();

        let platform = BrowserPlatform::new(transport(&server.url()), |_: &str| {}, &config(&server.url()))
            .with_store(store.clone());

        assert!(!platform.refresh().await.is_success());
        assert_eq!(store.get_access_token().await.unwrap().as_deref(), Some("A1"));
    }

    #[test]
    fn browser_unauthenticated_navigates_to_login() {
        let visited = Arc::new(Mutex::new(Vec::new()));
        let sink = visited.clone();
        let navigator = move |path: &str| sink.lock().unwrap().push(path.to_owned());
        let config = config("https://app.example.com").with_login_route("/signin");

        let platform: BrowserPlatform<HttpTransport, Store, _> =
            BrowserPlatform::new(transport("https://app.example.com"), navigator, &config);
        platform.on_unauthenticated();

        assert_eq!(*visited.lock().unwrap(), vec!["/signin".to_owned()]);
    }

    #[tokio::test]
    async fn server_refresh_persists_and_keeps_user_fields() {
        let store = Arc::new(Store::new(MemoryStorage::new()));
        store
            .save_session(&Session::new("A1", "R1").with_user_id(7).with_nickname("kim"))
            .await
            .unwrap();
        let platform = ServerPlatform::new(store.clone())
            .with_strategy(Fixed(RefreshOutcome::Refreshed(tokens("A2", "R2"))));

        assert!(platform.refresh().await.is_success());
        assert_eq!(
            store.get_session().await.unwrap(),
            Some(Session::new("A2", "R2").with_user_id(7).with_nickname("kim"))
        );
    }

    #[tokio::test]
    async fn server_without_strategy_fails() {
        let store = Arc::new(Store::new(MemoryStorage::new()));
        let platform = ServerPlatform::new(store);
        assert_eq!(
            platform.refresh().await.error(),
            Some("no refresh strategy configured")
        );
        platform.on_unauthenticated();
    }
}
