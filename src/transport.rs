use std::future::Future;
use std::time::Duration;

use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::TransportConfig;
use crate::error::{Error, TransportError};

/// Request cache directive, forwarded as a `Cache-Control` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    #[default]
    Default,
    NoStore,
    NoCache,
    Reload,
}

impl CacheMode {
    fn header_value(self) -> Option<HeaderValue> {
        match self {
            Self::Default => None,
            Self::NoStore => Some(HeaderValue::from_static("no-store")),
            Self::NoCache => Some(HeaderValue::from_static("no-cache")),
            Self::Reload => Some(HeaderValue::from_static("max-age=0")),
        }
    }
}

/// Per-call options shared by every verb.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    /// Cancels the call when triggered. A timeout applies either way.
    pub signal: Option<CancellationToken>,
    pub cache: CacheMode,
    pub params: Vec<(String, String)>,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    #[must_use]
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One outgoing call. Cloneable so it can be replayed after a refresh.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path relative to the transport's base URL, or an absolute URL.
    pub path: String,
    pub body: Option<JsonValue>,
    pub options: RequestOptions,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Response {
    pub data: JsonValue,
    pub status: u16,
    pub headers: HeaderMap,
}

impl Response {
    /// Deserializes `data` into `T`.
    ///
    /// # Errors
    ///
    /// Returns a transport error carrying the raw body if the shape does not match.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            TransportError {
                message: format!("unexpected response body: {e}"),
                status: self.status,
                body: self.data.clone(),
            }
            .into()
        })
    }
}

/// Anything that can perform a [`Request`].
///
/// Implemented by the raw [`HttpTransport`] and by the
/// [`AuthenticatedTransport`](crate::AuthenticatedTransport) decorator.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Error>> + Send;
}

/// HTTP verbs on top of [`Transport::send`].
pub trait TransportExt: Transport {
    fn get(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        self.send(Request::new(Method::GET, path).with_options(options))
    }

    fn post(
        &self,
        path: &str,
        body: Option<JsonValue>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        self.send(with_body(Request::new(Method::POST, path), body).with_options(options))
    }

    fn put(
        &self,
        path: &str,
        body: Option<JsonValue>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        self.send(with_body(Request::new(Method::PUT, path), body).with_options(options))
    }

    fn patch(
        &self,
        path: &str,
        body: Option<JsonValue>,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        self.send(with_body(Request::new(Method::PATCH, path), body).with_options(options))
    }

    fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> impl Future<Output = Result<Response, Error>> + Send {
        self.send(Request::new(Method::DELETE, path).with_options(options))
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

fn with_body(request: Request, body: Option<JsonValue>) -> Request {
    match body {
        Some(body) => request.with_body(body),
        None => request,
    }
}

/// reqwest-backed transport that normalizes failures into [`TransportError`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Relative request paths resolve under `base_url`, path prefix included:
    /// with `https://host/v1` both `/me` and `me` go to `https://host/v1/me`.
    #[must_use]
    pub fn new(mut base_url: Url, timeout: Duration) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            timeout,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.timeout)
    }

    /// Use a custom HTTP client (cookie store, connection pool reuse, testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Keep cookies set by responses and send them back on later calls, the
    /// way a browser does with its own origin.
    ///
    /// The transport handed to [`BrowserPlatform`](crate::BrowserPlatform)
    /// needs this: the BFF refresh endpoint reads the refresh token from the
    /// cookies its login response set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn with_cookie_store(self) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {e}")))?;
        Ok(self.with_http_client(http))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::network(format!("invalid request URL '{path}': {e}")))
    }

    async fn exchange(&self, request: Request) -> Result<Response, TransportError> {
        let url = self.resolve(&request.path)?;
        let Request {
            method,
            body,
            options,
            ..
        } = request;

        let mut headers = options.headers;
        if let Some(value) = options.cache.header_value() {
            headers.insert(CACHE_CONTROL, value);
        }

        let mut builder = self.http.request(method, url).headers(headers);
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let data = parse_body(&bytes);

        if status.is_success() {
            Ok(Response {
                data,
                status: status.as_u16(),
                headers,
            })
        } else {
            Err(TransportError::from_status(status.as_u16(), data))
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        let timeout = request.options.timeout.unwrap_or(self.timeout);
        // Cancelling the child never cancels the caller's signal.
        let abort = request
            .options
            .signal
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);

        let result = tokio::select! {
            result = self.exchange(request) => result,
            () = abort.cancelled() => Err(TransportError::aborted()),
            () = tokio::time::sleep(timeout) => {
                abort.cancel();
                Err(TransportError::timeout(timeout))
            }
        };
        result.map_err(Error::from)
    }
}

fn parse_body(bytes: &[u8]) -> JsonValue {
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned()))
}
