//! HTTP transport and the authenticated request gateway.
//!
//! The gateway owns the access/refresh token pair: it attaches the
//! bearer credential to every outbound call, absorbs first-time 401
//! responses behind a single-flight refresh, and retries the triggering
//! request once with the new token. Callers never implement their own
//! 401 handling.

use reqwest::Method;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::TokenPair;
use crate::config::ClientConfig;
use crate::error::{KardexError, Result};
use crate::refresh::{JoinOutcome, RefreshCoordinator, RefreshFailure};
use crate::session::{self, Session};
use crate::store::TokenStore;

/// Description of one outbound API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Bearer credential attached by the gateway before each send.
    pub bearer: Option<String>,
    /// Set once the request has been re-sent after a refresh; a second
    /// 401 on a retried request is propagated, never refreshed again.
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            bearer: None,
            retried: false,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Server response: status plus raw body. Deserialization happens at
/// the caller, after the gateway has finished its auth handling.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Deserialize the body, or surface an invalid-response error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            KardexError::invalid_response(format!("unparseable API response: {}", e))
        })
    }

    /// Best-effort extraction of a backend error message (`detail`,
    /// `error` or `message` keys), falling back to the raw body.
    pub fn error_detail(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| {
                ["detail", "error", "message"]
                    .iter()
                    .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(String::from))
            })
            .unwrap_or_else(|| self.body.clone())
    }

    /// Map a non-success reply into a coded API error.
    pub fn into_api_error(self) -> KardexError {
        KardexError::api(self.status, self.error_detail())
    }
}

/// Transport seam between the gateway and the network. The production
/// implementation wraps reqwest; tests substitute a scripted mock.
///
/// `Err` means the transport produced no server response at all; such
/// failures are propagated unchanged and never trigger a refresh.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> impl Future<Output = Result<ApiReply>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout));
        if !config.use_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiReply> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header("Content-Type", "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiReply { status, body })
    }
}

/// Authenticated request gateway.
///
/// Both mutexes guard purely synchronous state and are never held
/// across an await point.
pub struct Gateway<T: Transport> {
    transport: T,
    config: ClientConfig,
    store: Mutex<TokenStore>,
    coordinator: Mutex<RefreshCoordinator>,
    on_session_expired: Option<Box<dyn Fn() + Send + Sync>>,
}

impl Gateway<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        let store = TokenStore::open(config.token_path.clone())?;
        Ok(Self::with_transport(transport, config, store))
    }
}

impl<T: Transport> Gateway<T> {
    pub fn with_transport(transport: T, config: ClientConfig, store: TokenStore) -> Self {
        Self {
            transport,
            config,
            store: Mutex::new(store),
            coordinator: Mutex::new(RefreshCoordinator::new()),
            on_session_expired: None,
        }
    }

    /// Register the host callback fired when the session is torn down.
    /// The gateway itself never performs navigation.
    pub fn on_session_expired(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decoded view of the stored access token, if one decodes.
    pub fn session(&self) -> Option<Session> {
        let token = self.store.lock().unwrap().access()?;
        session::decode(&token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Whether the stored access token is missing, undecodable or
    /// within `grace_seconds` of its expiry.
    pub fn is_expired(&self, grace_seconds: i64) -> bool {
        let token = self.store.lock().unwrap().access();
        session::is_expired(token.as_deref(), grace_seconds)
    }

    /// Persist a freshly issued pair (login). The refresh token is
    /// replaced only when supplied.
    pub fn set_tokens(&self, access: String, refresh: Option<String>) -> Result<()> {
        self.store.lock().unwrap().set(access, refresh)
    }

    /// Clear both tokens (logout). Purely local.
    pub fn clear_tokens(&self) -> Result<()> {
        self.store.lock().unwrap().clear()
    }

    /// Send a request without bearer attachment or 401 recovery. Used
    /// for the login call, which establishes the session rather than
    /// consuming it.
    pub async fn execute_unauthenticated(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiReply> {
        let mut request = ApiRequest::new(method, self.config.endpoint_url(path));
        if let Some(body) = body {
            request = request.with_body(body);
        }
        self.transport.send(&request).await
    }

    /// Send an authenticated request, transparently recovering from a
    /// first-time 401 via the single-flight refresh protocol.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<serde_json::Value>,
    ) -> Result<ApiReply> {
        let mut request =
            ApiRequest::new(method, self.config.endpoint_url(path)).with_query(query);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        // Pre-send hook: attach the bearer credential when present. A
        // missing token does not skip the send; the backend rejects it.
        request.bearer = self.store.lock().unwrap().access();

        let reply = self.transport.send(&request).await?;

        if !reply.is_unauthorized() || request.retried {
            return Ok(reply);
        }

        debug!(url = %request.url, "401 received, entering refresh protocol");
        self.recover_unauthorized(request, reply).await
    }

    /// Refresh protocol entry point for a first-time 401.
    async fn recover_unauthorized(
        &self,
        mut request: ApiRequest,
        original: ApiReply,
    ) -> Result<ApiReply> {
        let refresh_token = self.store.lock().unwrap().refresh();
        let Some(refresh_token) = refresh_token else {
            // Nothing to refresh with: tear the session down and fail
            // with the triggering error. Zero refresh calls.
            warn!("401 with no refresh token on hand; clearing session");
            self.teardown_session();
            return Err(KardexError::session_expired(format!(
                "authentication required: {}",
                original.error_detail()
            )));
        };

        let outcome = self.coordinator.lock().unwrap().begin_or_join();
        match outcome {
            JoinOutcome::Leader => {
                request.retried = true;
                match self.call_refresh_endpoint(&refresh_token).await {
                    Ok(new_access) => {
                        self.coordinator
                            .lock()
                            .unwrap()
                            .complete(Ok(new_access.clone()));
                        debug!("token refresh succeeded, retrying original request");
                        request.bearer = Some(new_access);
                        self.transport.send(&request).await
                    }
                    Err(err) => {
                        self.coordinator
                            .lock()
                            .unwrap()
                            .complete(Err(RefreshFailure::new(err.to_string())));
                        warn!(error = %err, "token refresh failed; clearing session");
                        self.teardown_session();
                        Err(KardexError::session_expired_with_source(
                            "session refresh failed",
                            err,
                        ))
                    }
                }
            }
            JoinOutcome::Follower(rx) => match rx.await {
                Ok(Ok(new_access)) => {
                    request.retried = true;
                    request.bearer = Some(new_access);
                    self.transport.send(&request).await
                }
                Ok(Err(failure)) => Err(KardexError::session_expired(failure.message)),
                Err(_) => Err(KardexError::internal(
                    "refresh leader dropped without completing",
                )),
            },
        }
    }

    /// POST the stored refresh token to the refresh endpoint and
    /// persist the normalized result. Returns the new access token.
    async fn call_refresh_endpoint(&self, refresh_token: &str) -> Result<String> {
        let request = ApiRequest::new(Method::POST, self.config.refresh_url())
            .with_body(serde_json::json!({ "refresh": refresh_token }));

        let reply = self.transport.send(&request).await?;
        if !reply.is_success() {
            return Err(reply.into_api_error());
        }

        let value: serde_json::Value = reply.json()?;
        let pair = TokenPair::from_wire(&value).ok_or_else(|| {
            KardexError::invalid_response("refresh response carried no access token")
        })?;

        self.store
            .lock()
            .unwrap()
            .set(pair.access.clone(), pair.refresh)?;
        Ok(pair.access)
    }

    fn teardown_session(&self) {
        if let Err(err) = self.store.lock().unwrap().clear() {
            warn!(error = %err, "failed to clear token storage");
        }
        if let Some(callback) = &self.on_session_expired {
            callback();
        }
    }
}

#[cfg(test)]
impl<T: Transport> Gateway<T> {
    pub(crate) fn transport_ref(&self) -> &T {
        &self.transport
    }

    pub(crate) fn stored_tokens(&self) -> (Option<String>, Option<String>) {
        let store = self.store.lock().unwrap();
        (store.access(), store.refresh())
    }
}
