use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiRequest, ClientOptions, ConnectionConfig, Result, WaError};

/// Result-count cap header understood by the Workload Automation API.
pub const HOW_MANY: HeaderName = HeaderName::from_static("how-many");
/// Correlation header carrying the client's request id.
pub const REQUEST_ID: HeaderName = HeaderName::from_static("request-id");

#[derive(Clone)]
/// HTTP client for the Workload Automation REST API with host failover.
///
/// Requests start at the last host that answered. When a host refuses the
/// connection, the client moves on to the next one (wrapping around) until
/// a response arrives or every host has been tried once. A response with a
/// failure status is never retried.
///
/// Clones share the connection pool and the preferred-host cursor. The
/// cursor is re-read before every attempt, so when clones fail over at the
/// same time one request may try a host twice or skip one. Each request
/// still stops after as many attempts as there are hosts.
pub struct WaConn {
    http: reqwest::Client,
    config: Arc<ConnectionConfig>,
    prefix: String,
    request_id: HeaderValue,
    host_idx: Arc<AtomicUsize>,
    options: ClientOptions,
}

impl fmt::Debug for WaConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaConn")
            .field("config", &self.config)
            .field("prefix", &self.prefix)
            .field("request_id", &self.request_id)
            .field("host_idx", &self.host_idx.load(Ordering::Relaxed))
            .field("options", &self.options)
            .finish()
    }
}

impl WaConn {
    /// Creates a client for `config`, prefixing every request path with
    /// `prefix` (for example `/twsd`).
    pub fn new(config: ConnectionConfig, prefix: impl Into<String>) -> Result<Self> {
        let options = ClientOptions::default();
        let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string())
            .map_err(|err| WaError::Decode(format!("invalid request id: {err}")))?;
        Ok(Self {
            http: build_http(&config, &options)?,
            config: Arc::new(config),
            prefix: prefix.into().trim_end_matches('/').to_owned(),
            request_id,
            host_idx: Arc::new(AtomicUsize::new(0)),
            options,
        })
    }

    /// Loads connection properties from an INI file and creates a client.
    ///
    /// See [`ConnectionConfig::load`] for the file format and the one-time
    /// password rewrite.
    pub fn from_config_file(path: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self> {
        Self::new(ConnectionConfig::load(path)?, prefix)
    }

    /// Applies client options such as timeouts and the default `How-Many`.
    pub fn with_options(mut self, opts: ClientOptions) -> Result<Self> {
        self.http = build_http(&self.config, &opts)?;
        self.options = opts;
        Ok(self)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Correlation id sent as `Request-Id` on every request of this client.
    pub fn request_id(&self) -> &str {
        self.request_id.to_str().unwrap_or_default()
    }

    /// Host the next request will try first.
    pub fn current_host(&self) -> Option<&str> {
        let hosts = &self.config.hosts;
        if hosts.is_empty() {
            return None;
        }
        let idx = self.host_idx.load(Ordering::SeqCst) % hosts.len();
        Some(hosts[idx].as_str())
    }

    /// Sends `GET prefix + path` with optional query parameters.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut req = ApiRequest::get(path);
        for (key, value) in query {
            req = req.query(*key, *value);
        }
        self.request(req).await
    }

    /// Sends `POST prefix + path` with a JSON body.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.request(ApiRequest::post(path).json(body)?).await
    }

    /// Sends `PUT prefix + path` with a JSON body.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        self.request(ApiRequest::put(path).json(body)?).await
    }

    /// Sends one logical request, failing over between hosts on connection
    /// errors.
    ///
    /// Returns the response when its status is a success. A failure status
    /// becomes [`WaError::Http`], carrying any `messages` the server put in
    /// the JSON body. [`WaError::NoHostReachable`] means every host refused
    /// the connection, one attempt each.
    pub async fn request(&self, req: ApiRequest) -> Result<Response> {
        let hosts = &self.config.hosts;
        if hosts.is_empty() {
            return Err(WaError::NoHosts);
        }

        let headers = self.default_headers(req.headers);
        let mut attempts = 0usize;
        loop {
            let idx = self.host_idx.load(Ordering::SeqCst) % hosts.len();
            let url = format!("{}{}{}", hosts[idx], self.prefix, req.path);
            attempts += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(method = %req.method, %url, attempt = attempts, "connecting");

            let mut builder = self
                .http
                .request(req.method.clone(), &url)
                .headers(headers.clone())
                .basic_auth(&self.config.user, Some(&self.config.password));
            if !req.query.is_empty() {
                builder = builder.query(&req.query);
            }
            if let Some(body) = &req.json {
                builder = builder.json(body);
            }

            match builder.send().await {
                Ok(response) => return check_status(response).await,
                Err(err) if is_connect_failure(&err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%url, error = %err, "connection error");

                    self.advance_host(idx, hosts.len());
                    if attempts >= hosts.len() {
                        return Err(WaError::NoHostReachable {
                            attempts,
                            source: err,
                        });
                    }
                }
                Err(err) => return Err(WaError::Transport(err)),
            }
        }
    }

    fn default_headers(&self, mut headers: HeaderMap) -> HeaderMap {
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json"));
        headers
            .entry(header::ACCEPT)
            .or_insert_with(|| HeaderValue::from_static("application/json"));
        headers
            .entry(HOW_MANY)
            .or_insert_with(|| HeaderValue::from(self.options.how_many));
        headers
            .entry(REQUEST_ID)
            .or_insert_with(|| self.request_id.clone());
        headers
    }

    /// Moves the cursor past `failed`. A concurrent caller that already
    /// moved it wins, so one dead host only advances the cursor once.
    fn advance_host(&self, failed: usize, len: usize) {
        let next = (failed + 1) % len;
        let _ = self
            .host_idx
            .compare_exchange(failed, next, Ordering::SeqCst, Ordering::SeqCst);
    }
}

fn build_http(config: &ConnectionConfig, options: &ClientOptions) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!config.verify)
        .timeout(Duration::from_millis(options.timeout_ms))
        .connect_timeout(Duration::from_millis(options.connect_timeout_ms))
        .build()
        .map_err(WaError::Transport)
}

/// Refused connections, DNS failures, TLS handshake errors and connect
/// timeouts. Nothing was sent to the server, so another host may be tried.
fn is_connect_failure(err: &reqwest::Error) -> bool {
    err.is_connect()
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    #[cfg(feature = "tracing")]
    tracing::debug!(status = status.as_u16(), url = %response.url(), "result");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.map_err(WaError::Transport)?;
    let messages = server_messages(&body);

    #[cfg(feature = "tracing")]
    {
        for message in &messages {
            tracing::warn!(status = status.as_u16(), "error from server: {message}");
        }
    }

    Err(WaError::Http {
        status: status.as_u16(),
        body,
        messages,
    })
}

/// Extracts the `messages` list from an error body.
///
/// Bodies that are not JSON, or carry no `messages` array, yield nothing.
pub(crate) fn server_messages(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };
    value
        .get("messages")
        .and_then(serde_json::Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .map(|message| match message.as_str() {
                    Some(text) => text.to_owned(),
                    None => message.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}
