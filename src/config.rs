use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints and runtime settings shared by the transports, the auth client
/// and the BFF routes.
///
/// The upstream base URL is a constructor parameter; everything else has a
/// default and can be overridden with the `with_*` methods.
///
/// ```rust,ignore
/// use session_transport::TransportConfig;
///
/// let config = TransportConfig::new("https://api.example.com".parse()?)
///     .with_timeout(std::time::Duration::from_secs(5))
///     .with_login_route("/signin");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TransportConfig {
    pub(crate) api_base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) login_path: String,
    pub(crate) refresh_path: String,
    pub(crate) logout_path: String,
    pub(crate) bff_auth_path: String,
    pub(crate) login_route: String,
    pub(crate) secure_cookies: bool,
}

impl TransportConfig {
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            timeout: DEFAULT_TIMEOUT,
            login_path: "/auth/login".into(),
            refresh_path: "/auth/refresh".into(),
            logout_path: "/auth/logout".into(),
            bff_auth_path: "/api/auth".into(),
            login_route: "/login".into(),
            secure_cookies: true,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `API_BASE_URL`: upstream API base URL
    ///
    /// # Optional env vars
    /// - `API_TIMEOUT_MS`: per-request timeout in milliseconds (default 10000)
    /// - `AUTH_LOGIN_ROUTE`: login page the browser is sent to (default `/login`)
    /// - `BFF_AUTH_PATH`: mount point of the same-origin auth routes (default `/api/auth`)
    /// - `DEV_AUTH`: `"1"` or `"true"` drops the `Secure` cookie flag
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `API_BASE_URL` is missing or a value does not parse.
    pub fn from_env() -> Result<Self, Error> {
        let base = std::env::var("API_BASE_URL")
            .map_err(|_| Error::Config("API_BASE_URL is required".into()))?;
        let base: Url = base
            .parse()
            .map_err(|e| Error::Config(format!("API_BASE_URL: {e}")))?;

        let mut config = Self::new(base);

        if let Ok(ms) = std::env::var("API_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("API_TIMEOUT_MS: {e}")))?;
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Ok(route) = std::env::var("AUTH_LOGIN_ROUTE") {
            config = config.with_login_route(route);
        }
        if let Ok(path) = std::env::var("BFF_AUTH_PATH") {
            config = config.with_bff_auth_path(path);
        }

        let dev_auth = matches!(std::env::var("DEV_AUTH").as_deref(), Ok("1") | Ok("true"));

        Ok(config.with_secure_cookies(!dev_auth))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upstream login endpoint path (default `/auth/login`).
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Upstream refresh endpoint path (default `/auth/refresh`).
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Upstream logout endpoint path (default `/auth/logout`).
    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    #[must_use]
    pub fn with_bff_auth_path(mut self, path: impl Into<String>) -> Self {
        self.bff_auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    #[must_use]
    pub fn logout_path(&self) -> &str {
        &self.logout_path
    }

    #[must_use]
    pub fn bff_auth_path(&self) -> &str {
        &self.bff_auth_path
    }

    /// Same-origin refresh endpoint the browser calls.
    #[must_use]
    pub fn bff_refresh_path(&self) -> String {
        format!("{}/refresh", self.bff_auth_path)
    }

    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}
