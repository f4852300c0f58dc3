use std::borrow::Cow;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use parking_lot::Mutex;

use super::cookies::{
    self, ACCESS_TOKEN_COOKIE, CookieSettings, DEVICE_ID_COOKIE, NICKNAME_COOKIE,
    REFRESH_TOKEN_COOKIE, USER_ID_COOKIE,
};
use crate::error::Error;
use crate::session::SessionStore;
use crate::types::{DeviceId, Session, UserFields};

/// Cookie-backed session store for one request/response cycle.
///
/// Built from the incoming request's cookies; every write is recorded in the
/// jar's delta, so return [`ServerSessionStore::jar`] with the response to
/// emit the `Set-Cookie` headers.
#[derive(Debug)]
pub struct ServerSessionStore {
    jar: Mutex<CookieJar>,
    settings: CookieSettings,
}

impl ServerSessionStore {
    #[must_use]
    pub fn new(jar: CookieJar, settings: CookieSettings) -> Self {
        Self {
            jar: Mutex::new(jar),
            settings,
        }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap, settings: CookieSettings) -> Self {
        Self::new(CookieJar::from_headers(headers), settings)
    }

    /// Current jar including pending changes.
    #[must_use]
    pub fn jar(&self) -> CookieJar {
        self.jar.lock().clone()
    }

    fn value(jar: &CookieJar, name: &str) -> Option<String> {
        jar.get(name)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn user_fields(jar: &CookieJar) -> UserFields {
        UserFields {
            user_id: Self::value(jar, USER_ID_COOKIE).and_then(|v| v.parse().ok()),
            nickname: Self::value(jar, NICKNAME_COOKIE)
                .and_then(|v| urlencoding::decode(&v).ok().map(Cow::into_owned)),
        }
    }

    // The jar API is by-value; swap it out under the lock.
    fn update(&self, f: impl FnOnce(CookieJar) -> CookieJar) {
        let mut guard = self.jar.lock();
        let jar = std::mem::take(&mut *guard);
        *guard = f(jar);
    }
}

impl SessionStore for ServerSessionStore {
    async fn save_session(&self, session: &Session) -> Result<(), Error> {
        let s = &self.settings;
        self.update(|jar| {
            let jar = jar
                .add(cookies::token_cookie(
                    ACCESS_TOKEN_COOKIE,
                    session.access_token.clone(),
                    s.access_ttl,
                    s.secure,
                ))
                .add(cookies::token_cookie(
                    REFRESH_TOKEN_COOKIE,
                    session.refresh_token.clone(),
                    s.refresh_ttl,
                    s.secure,
                ));
            let jar = match session.user_id {
                Some(id) => jar.add(cookies::readable_cookie(
                    USER_ID_COOKIE,
                    id.to_string(),
                    s.profile_ttl,
                    s.secure,
                )),
                None => jar.remove(cookies::removal_cookie(USER_ID_COOKIE)),
            };
            match &session.nickname {
                Some(name) => jar.add(cookies::readable_cookie(
                    NICKNAME_COOKIE,
                    urlencoding::encode(name).into_owned(),
                    s.profile_ttl,
                    s.secure,
                )),
                None => jar.remove(cookies::removal_cookie(NICKNAME_COOKIE)),
            }
        });
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, Error> {
        let jar = self.jar.lock();
        let (Some(access_token), Some(refresh_token)) = (
            Self::value(&jar, ACCESS_TOKEN_COOKIE),
            Self::value(&jar, REFRESH_TOKEN_COOKIE),
        ) else {
            return Ok(None);
        };
        let UserFields { user_id, nickname } = Self::user_fields(&jar);

        Ok(Some(Session {
            access_token,
            refresh_token,
            user_id,
            nickname,
        }))
    }

    // The access cookie expires long before the refresh cookie; refreshing
    // must not depend on it.
    async fn get_refresh_token(&self) -> Result<Option<String>, Error> {
        Ok(Self::value(&self.jar.lock(), REFRESH_TOKEN_COOKIE))
    }

    async fn get_user_fields(&self) -> Result<UserFields, Error> {
        Ok(Self::user_fields(&self.jar.lock()))
    }

    async fn clear_session(&self) -> Result<(), Error> {
        self.update(|jar| {
            jar.remove(cookies::removal_cookie(ACCESS_TOKEN_COOKIE))
                .remove(cookies::removal_cookie(REFRESH_TOKEN_COOKIE))
                .remove(cookies::removal_cookie(USER_ID_COOKIE))
                .remove(cookies::removal_cookie(NICKNAME_COOKIE))
        });
        Ok(())
    }

    async fn get_device_id(&self) -> Result<DeviceId, Error> {
        let mut guard = self.jar.lock();
        if let Some(existing) = Self::value(&guard, DEVICE_ID_COOKIE) {
            return Ok(DeviceId(existing));
        }
        let device_id = DeviceId::generate();
        let jar = std::mem::take(&mut *guard);
        *guard = jar.add(cookies::readable_cookie(
            DEVICE_ID_COOKIE,
            device_id.to_string(),
            self.settings.device_ttl,
            self.settings.secure,
        ));
        Ok(device_id)
    }
}
