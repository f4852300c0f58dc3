use std::future::Future;
use std::sync::Arc;

use reqwest::header::HeaderValue;

use crate::error::Error;
use crate::session::SessionStore;

/// Source of the access token attached to outgoing requests.
///
/// `Ok(None)` means "no session"; errors are reserved for storage failures.
pub trait TokenProvider: Send + Sync + 'static {
    fn get_token(&self) -> impl Future<Output = Result<Option<String>, Error>> + Send;
}

/// Reads the access token from a [`SessionStore`].
pub struct SessionTokenProvider<S> {
    store: Arc<S>,
}

impl<S> Clone for SessionTokenProvider<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: SessionStore> SessionTokenProvider<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: SessionStore> TokenProvider for SessionTokenProvider<S> {
    fn get_token(&self) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        self.store.get_access_token()
    }
}

/// `Bearer <token>` header value.
///
/// # Errors
///
/// Returns [`Error::Token`] if the token contains bytes not allowed in a header.
pub fn bearer(token: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| Error::Token("access token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ClientSessionStore, MemoryStorage};
    use crate::types::Session;

    #[tokio::test]
    async fn no_session_is_none_not_error() {
        let store = Arc::new(ClientSessionStore::new(MemoryStorage::new()));
        let provider = SessionTokenProvider::new(store);
        assert_eq!(provider.get_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn returns_current_access_token() {
        let store = Arc::new(ClientSessionStore::new(MemoryStorage::new()));
        store.save_session(&Session::new("A1", "R1")).await.unwrap();
        let provider = SessionTokenProvider::new(store.clone());
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("A1"));

        store.save_session(&Session::new("A2", "R2")).await.unwrap();
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("A2"));
    }

    #[test]
    fn bearer_rejects_newlines() {
        assert!(bearer("A1").is_ok());
        assert!(matches!(bearer("bad\ntoken"), Err(Error::Token(_))));
    }
}
