use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Authenticated session held by a [`SessionStore`](crate::session::SessionStore).
///
/// Serialized in camelCase, matching the browser storage blob and the
/// upstream API payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_id: None,
            nickname: None,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Session after a refresh: tokens are replaced, user fields are carried
    /// over from `previous` when the refresh response left them out.
    #[must_use]
    pub fn refreshed(previous: UserFields, tokens: &RefreshedTokens) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            user_id: tokens.user_id.or(previous.user_id),
            nickname: tokens.nickname.clone().or(previous.nickname),
        }
    }

    #[must_use]
    pub fn user_fields(&self) -> UserFields {
        UserFields {
            user_id: self.user_id,
            nickname: self.nickname.clone(),
        }
    }

    /// Both tokens present and non-empty.
    pub(crate) fn is_usable(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Profile fields stored next to the tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFields {
    pub user_id: Option<i64>,
    pub nickname: Option<String>,
}

/// Stable per-installation identifier, independent of any user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token pair returned by a successful refresh or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl From<RefreshedTokens> for Session {
    fn from(t: RefreshedTokens) -> Self {
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            user_id: t.user_id,
            nickname: t.nickname,
        }
    }
}

/// Result of one refresh attempt.
///
/// A successful outcome always carries both tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed(RefreshedTokens),
    Failed(String),
}

impl RefreshOutcome {
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Refreshed(t) => Some(&t.access_token),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Self::Refreshed(t) => Some(&t.refresh_token),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Refreshed(_) => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// Login credentials posted to the upstream login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Password stays out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// `{ success, data?, message? }` wrapper used by the upstream API and the BFF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    // A missing Option reads as None; `default` here would demand `T: Default`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// The payload when `success` is set and data is present.
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response is missing data".into()),
            (false, _) => Err(self.message.unwrap_or_else(|| "request was rejected".into())),
        }
    }
}
