//! Webex front end: webhook router and a minimal messages client.
//!
//! Enabled with the `webex` feature.
//!
//! Webex only sends the message id in the webhook payload, so every
//! notification costs one `GET /v1/messages/{id}` before the command can be
//! read, and one `POST /v1/messages` for the reply.

use std::{fmt, path::Path, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::{bot::Responder, config::{load_ini, lookup}, Result, WaError};

pub const DEFAULT_API_URL: &str = "https://webexapis.com";

/// Largest accepted `[BOT] timezone_offset`, in hours.
pub const MAX_TIMEZONE_OFFSET: i64 = 24;

/// Settings read from the `[WEBEX]` and `[BOT]` sections.
#[derive(Clone, PartialEq, Eq)]
pub struct WebexSettings {
    pub access_token: String,
    /// Only messages from this room are answered, when set.
    pub allowed_room_id: Option<String>,
    /// Hours added to UTC start times in replies.
    pub timezone_offset: i64,
}

impl fmt::Debug for WebexSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebexSettings")
            .field("access_token", &"<redacted>")
            .field("allowed_room_id", &self.allowed_room_id)
            .field("timezone_offset", &self.timezone_offset)
            .finish()
    }
}

impl WebexSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conf = load_ini(path)?;
        let config_error = |message: String| WaError::Config {
            path: path.to_path_buf(),
            message,
        };

        let access_token = conf
            .section(Some("WEBEX"))
            .and_then(|section| lookup(section, "access_token"))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| config_error("WEBEX section must define access_token".to_owned()))?
            .to_owned();
        let allowed_room_id = conf
            .section(Some("WEBEX"))
            .and_then(|section| lookup(section, "allowed_room_id"))
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .map(str::to_owned);
        let timezone_offset = match conf
            .section(Some("BOT"))
            .and_then(|section| lookup(section, "timezone_offset"))
        {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|err| config_error(format!("invalid timezone_offset '{raw}': {err}")))?,
            None => 0,
        };
        if !(-MAX_TIMEZONE_OFFSET..=MAX_TIMEZONE_OFFSET).contains(&timezone_offset) {
            return Err(config_error(format!(
                "timezone_offset must be within +/-{MAX_TIMEZONE_OFFSET} hours, got {timezone_offset}"
            )));
        }

        Ok(Self {
            access_token,
            allowed_room_id,
            timezone_offset,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebexMessage {
    #[serde(default)]
    pub text: String,
    pub room_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingMessage<'a> {
    room_id: &'a str,
    text: &'a str,
}

#[derive(Clone)]
/// Client for the Webex messages API.
pub struct WebexClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for WebexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebexClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl WebexClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_API_URL, token)
    }

    /// Points the client at another API root, e.g. a local mock.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    pub async fn get_message(&self, id: &str) -> Result<WebexMessage> {
        let response = self
            .http
            .get(format!("{}/v1/messages/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(WaError::Transport)?;
        let body = success_body(response).await?;
        serde_json::from_str(&body)
            .map_err(|err| WaError::Decode(format!("invalid Webex message: {err}; body: {body}")))
    }

    pub async fn send_message(&self, room_id: &str, text: &str) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&OutgoingMessage { room_id, text })
            .send()
            .await
            .map_err(WaError::Transport)?;
        success_body(response).await.map(|_| ())
    }
}

async fn success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await.map_err(WaError::Transport)?;
    if !status.is_success() {
        return Err(WaError::Http {
            status: status.as_u16(),
            body,
            messages: Vec::new(),
        });
    }
    Ok(body)
}

/// Shared state of the webhook router.
#[derive(Clone, Debug)]
pub struct BotState {
    pub responder: Responder,
    pub webex: WebexClient,
    pub allowed_room_id: Option<String>,
}

/// Builds the webhook router: `POST /webex` and `GET /health`.
pub fn router(state: BotState) -> Router {
    Router::new()
        .route("/webex", post(webhook))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn webhook(
    State(state): State<Arc<BotState>>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    let Some(id) = payload
        .get("data")
        .and_then(|data| data.get("id"))
        .and_then(serde_json::Value::as_str)
    else {
        return StatusCode::BAD_REQUEST;
    };

    let message = match state.webex.get_message(id).await {
        Ok(message) => message,
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::error!(message_id = id, error = %err, "could not fetch Webex message");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
            return StatusCode::BAD_GATEWAY;
        }
    };

    let Some(room_id) = message.room_id.as_deref() else {
        return StatusCode::OK;
    };
    if let Some(allowed) = &state.allowed_room_id {
        if allowed != room_id {
            #[cfg(feature = "tracing")]
            tracing::info!(room_id, "ignoring message from room (not allowed)");
            return StatusCode::OK;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(room_id, text = %message.text, "message received");

    let today = chrono::Utc::now().date_naive();
    if let Some(reply) = state.responder.respond(&message.text, today).await {
        if let Err(err) = state.webex.send_message(room_id, &reply).await {
            #[cfg(feature = "tracing")]
            tracing::error!(room_id, error = %err, "could not send Webex reply");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
        }
    }

    StatusCode::OK
}
