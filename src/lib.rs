#![doc = include_str!("../README.md")]

pub mod auth;
pub mod authenticated;
pub mod config;
pub mod error;
pub mod platform;
pub mod refresh;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod token;
pub mod transport;
pub mod types;

// Re-exports for convenient access
pub use auth::AuthClient;
pub use authenticated::AuthenticatedTransport;
pub use config::TransportConfig;
pub use error::{Error, TransportError};
pub use platform::{BrowserPlatform, Navigator, Platform, ServerPlatform};
pub use refresh::{NoRefreshStrategy, RefreshStrategy, UpstreamRefresh};
pub use session::{ClientSessionStore, FileStorage, KeyValueStorage, MemoryStorage, SessionStore};
pub use token::{SessionTokenProvider, TokenProvider, bearer};
pub use transport::{
    CacheMode, HttpTransport, Request, RequestOptions, Response, Transport, TransportExt,
};
pub use types::{
    ApiEnvelope, Credentials, DeviceId, RefreshOutcome, RefreshedTokens, Session, UserFields,
};

// Callers need these to build signals and requests without extra deps.
pub use reqwest::{Method, header};
pub use tokio_util::sync::CancellationToken;
