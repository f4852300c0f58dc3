use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use super::cookies::CookieSettings;
use super::store::ServerSessionStore;
use crate::auth::AuthClient;
use crate::config::TransportConfig;
use crate::platform::{Platform, ServerPlatform};
use crate::refresh::UpstreamRefresh;
use crate::transport::Transport;
use crate::types::{ApiEnvelope, Credentials, RefreshOutcome, Session};

/// Shared state for the BFF handlers.
pub(super) struct BffState<T> {
    upstream: Arc<T>,
    config: Arc<TransportConfig>,
    cookies: CookieSettings,
}

// Manual Clone: avoid derive adding a `T: Clone` bound.
impl<T> Clone for BffState<T> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            config: self.config.clone(),
            cookies: self.cookies.clone(),
        }
    }
}

impl<T: Transport> BffState<T> {
    fn store(&self, jar: CookieJar) -> Arc<ServerSessionStore> {
        Arc::new(ServerSessionStore::new(jar, self.cookies.clone()))
    }
}

/// Token pair returned to the browser so it can sync its own store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BffTokens {
    access_token: String,
    refresh_token: String,
}

/// Same-origin auth endpoints for the browser.
///
/// - `POST {bff_auth_path}/login`: exchanges credentials, sets session cookies
/// - `POST {bff_auth_path}/refresh`: refreshes from the cookies, returns the new pair
/// - `POST {bff_auth_path}/logout`: best-effort upstream logout, always clears cookies
///
/// `upstream` is the raw transport to the API; the handlers never go
/// through an authenticated transport themselves.
pub fn bff_routes<T: Transport>(config: TransportConfig, upstream: T) -> Router {
    let base = config.bff_auth_path.clone();
    let state = BffState {
        upstream: Arc::new(upstream),
        cookies: CookieSettings::from_config(&config),
        config: Arc::new(config),
    };

    Router::new()
        .route(&format!("{base}/login"), post(login::<T>))
        .route(&format!("{base}/refresh"), post(refresh::<T>))
        .route(&format!("{base}/logout"), post(logout::<T>))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<T: Transport>(
    State(state): State<BffState<T>>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Response {
    let store = state.store(jar);
    let client = AuthClient::new(state.upstream.clone(), store.clone(), &state.config);

    match client.login(&credentials).await {
        Ok(session) => (store.jar(), Json(ApiEnvelope::ok(session))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "BFF login failed");
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::UNAUTHORIZED);
            (status, Json(ApiEnvelope::<Session>::fail(e.to_string()))).into_response()
        }
    }
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh<T: Transport>(State(state): State<BffState<T>>, jar: CookieJar) -> Response {
    let store = state.store(jar);
    let strategy = UpstreamRefresh::new(
        state.upstream.clone(),
        store.clone(),
        state.config.refresh_path.clone(),
    );
    let platform = ServerPlatform::new(store.clone()).with_strategy(strategy);

    match platform.refresh().await {
        RefreshOutcome::Refreshed(tokens) => {
            let body = BffTokens {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            };
            (store.jar(), Json(ApiEnvelope::ok(body))).into_response()
        }
        RefreshOutcome::Failed(reason) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiEnvelope::<BffTokens>::fail(reason)),
        )
            .into_response(),
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<T: Transport>(State(state): State<BffState<T>>, jar: CookieJar) -> Response {
    let store = state.store(jar);
    let client = AuthClient::new(state.upstream.clone(), store.clone(), &state.config);

    match client.logout().await {
        Ok(()) => (store.jar(), Json(ApiEnvelope::<()>::ok(()))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::{Request, header::CONTENT_TYPE};
    use tower::ServiceExt;

    use super::*;
    use crate::transport::HttpTransport;

    fn app(server: &mockito::ServerGuard) -> Router {
        let config = TransportConfig::new(server.url().parse().unwrap()).with_secure_cookies(false);
        let upstream = HttpTransport::new(server.url().parse().unwrap(), Duration::from_secs(5));
        bff_routes(config, upstream)
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_owned())
            .collect()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn refresh_rotates_cookies_and_returns_tokens() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/auth/refresh")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "refreshToken": "R1", "deviceId": "dev-1" }),
            ))
            .with_status(200)
            .with_body(r#"{ "success": true, "data": { "accessToken": "A2", "refreshToken": "R2" } }"#)
            .expect(1)
            .create_async()
            .await;

        let request = Request::post("/api/auth/refresh")
            .header(COOKIE, "access_token=A1; refresh_token=R1; user_id=42; device_id=dev-1")
            .body(Body::empty())
            .unwrap();
        let response = app(&server).oneshot(request).await.unwrap();

        upstream.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=A2")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=R2")));
        assert!(cookies.iter().any(|c| c.starts_with("user_id=42")));
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "success": true, "data": { "accessToken": "A2", "refreshToken": "R2" } })
        );
    }

    #[tokio::test]
    async fn refresh_works_after_access_cookie_expired() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/auth/refresh")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({ "refreshToken": "R1", "deviceId": "dev-1" }),
            ))
            .with_status(200)
            .with_body(r#"{ "success": true, "data": { "accessToken": "A2", "refreshToken": "R2" } }"#)
            .expect(1)
            .create_async()
            .await;

        let request = Request::post("/api/auth/refresh")
            .header(COOKIE, "refresh_token=R1; user_id=42; device_id=dev-1")
            .body(Body::empty())
            .unwrap();
        let response = app(&server).oneshot(request).await.unwrap();

        upstream.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=A2")));
        assert!(cookies.iter().any(|c| c.starts_with("user_id=42")));
    }

    #[tokio::test]
    async fn refresh_without_cookies_is_401() {
        let mut server = mockito::Server::new_async().await;
        let upstream = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let request = Request::post("/api/auth/refresh").body(Body::empty()).unwrap();
        let response = app(&server).oneshot(request).await.unwrap();

        upstream.assert_async().await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn logout_clears_cookies_even_when_upstream_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/logout")
            .with_status(503)
            .create_async()
            .await;

        let request = Request::post("/api/auth/logout")
            .header(COOKIE, "access_token=A1; refresh_token=R1; device_id=dev-1")
            .body(Body::empty())
            .unwrap();
        let response = app(&server).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=;")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=;")));
    }

    #[tokio::test]
    async fn login_sets_session_cookies() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "email": "kim@example.com", "password": "pw" }),
            ))
            .with_status(200)
            .with_body(
                r#"{ "success": true, "data": { "accessToken": "A1", "refreshToken": "R1", "userId": 42, "nickname": "kim" } }"#,
            )
            .create_async()
            .await;

        let request = Request::post("/api/auth/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{ "email": "kim@example.com", "password": "pw" }"#))
            .unwrap();
        let response = app(&server).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=A1")));
        assert!(cookies.iter().any(|c| c.starts_with("device_id=")));
        assert_eq!(json_body(response).await["data"]["userId"], 42);
    }
}
