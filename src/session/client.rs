use std::sync::Arc;

use super::storage::KeyValueStorage;
use super::traits::SessionStore;
use crate::error::Error;
use crate::types::{DeviceId, Session};

pub const SESSION_KEY: &str = "auth_session";
pub const DEVICE_ID_KEY: &str = "device_id";

/// Browser-side store: the session as one JSON blob plus a device id string.
///
/// Everything here is readable by application code. Tokens kept here are
/// never copied into cookies from the client side.
pub struct ClientSessionStore<K> {
    storage: Arc<K>,
}

// Manual Clone: avoid derive adding a `K: Clone` bound.
impl<K> Clone for ClientSessionStore<K> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<K: KeyValueStorage> ClientSessionStore<K> {
    #[must_use]
    pub fn new(storage: K) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Share a storage handle with other code.
    #[must_use]
    pub fn from_shared(storage: Arc<K>) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl<K: KeyValueStorage> SessionStore for ClientSessionStore<K> {
    async fn save_session(&self, session: &Session) -> Result<(), Error> {
        let raw = serde_json::to_string(session).map_err(|e| Error::Store(e.to_string()))?;
        self.storage.set_item(SESSION_KEY, &raw)
    }

    async fn get_session(&self) -> Result<Option<Session>, Error> {
        let Some(raw) = self.storage.get_item(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_usable() => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "Stored session is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    async fn clear_session(&self) -> Result<(), Error> {
        self.storage.remove_item(SESSION_KEY)
    }

    async fn get_device_id(&self) -> Result<DeviceId, Error> {
        if let Some(existing) = self.storage.get_item(DEVICE_ID_KEY)?.filter(|id| !id.is_empty()) {
            return Ok(DeviceId(existing));
        }
        let generated = DeviceId::generate();
        self.storage.set_item(DEVICE_ID_KEY, generated.as_str())?;
        // A racing first call may have written its own id; both are whole
        // values, so read back whichever one won.
        Ok(self
            .storage
            .get_item(DEVICE_ID_KEY)?
            .map_or(generated, DeviceId))
    }
}
