//! Server request context for axum applications.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use session_transport::server::{bff_routes, CookieSettings, ServerSessionStore};
//!
//! // 1. Mount the same-origin auth endpoints the browser talks to
//! let config = TransportConfig::from_env()?;
//! let app = axum::Router::new()
//!     .merge(bff_routes(config.clone(), HttpTransport::from_config(&config)));
//!
//! // 2. Call the API on behalf of a request, refreshing from its cookies
//! async fn handler(jar: CookieJar) -> impl IntoResponse {
//!     let store = Arc::new(ServerSessionStore::new(jar, CookieSettings::from_config(&config)));
//!     let upstream = Arc::new(HttpTransport::from_config(&config));
//!     let strategy = UpstreamRefresh::new(upstream, store.clone(), config.refresh_path());
//!     let api = AuthenticatedTransport::new(
//!         HttpTransport::from_config(&config),
//!         SessionTokenProvider::new(store.clone()),
//!         ServerPlatform::new(store.clone()).with_strategy(strategy),
//!     );
//!     let result = api.get("/users/me", RequestOptions::default()).await;
//!     (store.jar(), result.map(|r| Json(r.data)))
//! }
//! ```

mod cookies;
mod error;
mod routes;
mod store;

pub use cookies::{
    ACCESS_TOKEN_COOKIE, CookieSettings, DEVICE_ID_COOKIE, NICKNAME_COOKIE, REFRESH_TOKEN_COOKIE,
    USER_ID_COOKIE,
};
pub use routes::bff_routes;
pub use store::ServerSessionStore;
