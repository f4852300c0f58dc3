use std::future::Future;

use crate::error::Error;
use crate::types::{DeviceId, Session, UserFields};

/// Persistence for the current [`Session`] and the device identifier.
///
/// One implementation per execution context: cookies for a server request,
/// key/value storage in the browser. The authenticated transport never
/// touches session state except through this trait.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for MyStore {
///     async fn save_session(&self, session: &Session) -> Result<(), Error> {
///         self.db.put("session", serde_json::to_string(session)?).await
///     }
///
///     async fn get_session(&self) -> Result<Option<Session>, Error> {
///         Ok(self.db.get("session").await?.and_then(|raw| serde_json::from_str(&raw).ok()))
///     }
///
///     async fn clear_session(&self) -> Result<(), Error> {
///         self.db.delete("session").await
///     }
///
///     async fn get_device_id(&self) -> Result<DeviceId, Error> {
///         self.db.get_or_insert_with("device_id", DeviceId::generate).await
///     }
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Persist a session. Readers never observe a partially written one.
    fn save_session(&self, session: &Session) -> impl Future<Output = Result<(), Error>> + Send;

    /// Current session, `None` when absent or unreadable.
    ///
    /// Corrupt data (bad JSON, missing tokens) yields `Ok(None)`; `Err` is
    /// reserved for the storage layer itself failing.
    fn get_session(&self) -> impl Future<Output = Result<Option<Session>, Error>> + Send;

    /// Remove the session. Clearing an empty store is a no-op.
    fn clear_session(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Device identifier, created and persisted on first use.
    fn get_device_id(&self) -> impl Future<Output = Result<DeviceId, Error>> + Send;

    fn get_access_token(&self) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        async move { Ok(self.get_session().await?.map(|s| s.access_token)) }
    }

    /// Override when the refresh token can outlive the rest of the session.
    fn get_refresh_token(&self) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        async move { Ok(self.get_session().await?.map(|s| s.refresh_token)) }
    }

    /// User fields to carry into a refreshed session.
    fn get_user_fields(&self) -> impl Future<Output = Result<UserFields, Error>> + Send {
        async move {
            Ok(self
                .get_session()
                .await?
                .map(|s| s.user_fields())
                .unwrap_or_default())
        }
    }
}
