use serde::Serialize;
use serde_json::Value as JsonValue;

/// Status used for failures that never produced an HTTP response.
pub const STATUS_NETWORK: u16 = 0;
/// Status used when the client-side timeout fires.
pub const STATUS_TIMEOUT: u16 = 408;
/// Status that triggers the refresh-and-retry pipeline.
pub const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Session store error: {0}")]
    Store(String),
    #[error("Token error: {0}")]
    Token(String),
    /// The API answered 2xx but with `success: false` or no data.
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a transport failure, `None` for local errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => Some(e.status),
            _ => None,
        }
    }

    /// True only for an HTTP 401 from the remote side.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }
}

/// Normalized failure of a single HTTP exchange.
///
/// `status == 0` means the request never got a response (network failure or
/// abort), `status == 408` means the client-side timeout elapsed.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct TransportError {
    pub message: String,
    pub status: u16,
    pub body: JsonValue,
}

impl TransportError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: STATUS_NETWORK,
            body: JsonValue::Null,
        }
    }

    #[must_use]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self {
            message: format!("Request timed out after {}ms", after.as_millis()),
            status: STATUS_TIMEOUT,
            body: JsonValue::Null,
        }
    }

    #[must_use]
    pub fn aborted() -> Self {
        Self::network("Request aborted")
    }

    /// Builds the error for a non-2xx response.
    ///
    /// A string `message` field in a JSON body wins over the generic text.
    #[must_use]
    pub fn from_status(status: u16, body: JsonValue) -> Self {
        let message = body
            .get("message")
            .and_then(JsonValue::as_str)
            .map_or_else(|| format!("Request failed with status {status}"), str::to_owned);
        Self {
            message,
            status,
            body,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == STATUS_UNAUTHORIZED
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self {
                message: e.to_string(),
                status: STATUS_TIMEOUT,
                body: JsonValue::Null,
            }
        } else {
            Self::network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_status_prefers_body_message() {
        let err = TransportError::from_status(422, json!({ "message": "nickname taken" }));
        assert_eq!(err.message, "nickname taken");
        assert_eq!(err.status, 422);
    }

    #[test]
    fn from_status_falls_back_to_generic_message() {
        let err = TransportError::from_status(500, JsonValue::String("boom".into()));
        assert_eq!(err.message, "Request failed with status 500");
        assert_eq!(err.body, JsonValue::String("boom".into()));
    }

    #[test]
    fn only_401_is_unauthorized() {
        let unauthorized: Error = TransportError::from_status(401, JsonValue::Null).into();
        let forbidden: Error = TransportError::from_status(403, JsonValue::Null).into();
        assert!(unauthorized.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!Error::Store("disk".into()).is_unauthorized());
    }

    #[test]
    fn network_and_timeout_statuses() {
        assert_eq!(TransportError::aborted().status, 0);
        assert_eq!(
            TransportError::timeout(std::time::Duration::from_millis(50)).status,
            408
        );
    }
}
