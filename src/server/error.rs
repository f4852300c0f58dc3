use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value as JsonValue;

use crate::error::{Error, TransportError};

/// Renders as `{ message, status, body }` so server code can hand the error
/// back to its own caller unchanged.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Transport(e) => {
                // Status 0 and other non-HTTP codes mean the upstream was unreachable.
                let status = StatusCode::from_u16(e.status)
                    .ok()
                    .filter(|s| s.as_u16() >= 400)
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, Json(e)).into_response()
            }
            Self::Rejected(ref msg) => {
                let body = TransportError {
                    message: msg.clone(),
                    status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
                    body: JsonValue::Null,
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            Self::Store(_) | Self::Token(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Session transport internal error");
                let body = TransportError {
                    message: "Internal error".into(),
                    status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    body: JsonValue::Null,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_status_is_kept() {
        let err: Error = TransportError::from_status(404, JsonValue::Null).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn network_failure_is_bad_gateway() {
        let err: Error = TransportError::network("connection refused").into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn store_failure_is_internal() {
        let response = Error::Store("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
