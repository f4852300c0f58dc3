use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::TransportConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const USER_ID_COOKIE: &str = "user_id";
pub const NICKNAME_COOKIE: &str = "nickname";
pub const DEVICE_ID_COOKIE: &str = "device_id";

/// Flags and lifetimes for the session cookies.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub(crate) secure: bool,
    pub(crate) access_ttl: Duration,
    pub(crate) refresh_ttl: Duration,
    pub(crate) profile_ttl: Duration,
    pub(crate) device_ttl: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            profile_ttl: Duration::days(7),
            device_ttl: Duration::days(365),
        }
    }
}

impl CookieSettings {
    #[must_use]
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::default().with_secure(config.secure_cookies)
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

/// HttpOnly cookie for a token.
pub(super) fn token_cookie(
    name: &'static str,
    value: String,
    ttl: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build()
}

/// Cookie that page scripts may read (user id, nickname, device id).
pub(super) fn readable_cookie(
    name: &'static str,
    value: String,
    ttl: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build()
}

/// Removal cookie matching the path the cookie was set with.
pub(super) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
