use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use crate::config::TransportConfig;
use crate::error::Error;
use crate::session::SessionStore;
use crate::token::bearer;
use crate::transport::{RequestOptions, Transport, TransportExt};
use crate::types::{ApiEnvelope, Credentials, DeviceId, RefreshedTokens, Session};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    #[serde(flatten)]
    credentials: &'a Credentials,
    device_id: &'a DeviceId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutBody<'a> {
    refresh_token: &'a str,
    device_id: &'a DeviceId,
}

/// Creates and destroys sessions against the upstream auth endpoints.
pub struct AuthClient<T, S> {
    transport: Arc<T>,
    store: Arc<S>,
    login_path: String,
    logout_path: String,
}

impl<T: Transport, S: SessionStore> AuthClient<T, S> {
    #[must_use]
    pub fn new(transport: Arc<T>, store: Arc<S>, config: &TransportConfig) -> Self {
        Self {
            transport,
            store,
            login_path: config.login_path.clone(),
            logout_path: config.logout_path.clone(),
        }
    }

    /// Log in and store the resulting session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on HTTP failure, [`Error::Rejected`] if the
    /// API refused the credentials, or [`Error::Store`] if saving failed.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, Error> {
        let device_id = self.store.get_device_id().await?;
        let body = serde_json::to_value(LoginBody {
            credentials,
            device_id: &device_id,
        })
        .map_err(|e| Error::Token(e.to_string()))?;

        let response = self
            .transport
            .post(&self.login_path, Some(body), RequestOptions::default())
            .await?;
        let session: Session = response
            .json::<ApiEnvelope<RefreshedTokens>>()?
            .into_data()
            .map_err(Error::Rejected)?
            .into();

        self.store.save_session(&session).await?;
        tracing::info!(user_id = ?session.user_id, "Login successful");
        Ok(session)
    }

    /// Log out upstream if possible, then clear the local session.
    ///
    /// Upstream failures are logged and ignored: the local store decides
    /// whether this device is logged in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] only if clearing the local session failed.
    pub async fn logout(&self) -> Result<(), Error> {
        if let Err(e) = self.revoke_upstream().await {
            tracing::warn!(error = %e, "Upstream logout failed, clearing local session anyway");
        }
        self.store.clear_session().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    async fn revoke_upstream(&self) -> Result<(), Error> {
        let Some(session) = self.store.get_session().await? else {
            return Ok(());
        };
        let device_id = self.store.get_device_id().await?;
        let body = serde_json::to_value(LogoutBody {
            refresh_token: &session.refresh_token,
            device_id: &device_id,
        })
        .map_err(|e| Error::Token(e.to_string()))?;

        let mut options = RequestOptions::default();
        options
            .headers
            .insert(AUTHORIZATION, bearer(&session.access_token)?);
        self.transport
            .post(&self.logout_path, Some(body), options)
            .await?;
        Ok(())
    }
}
