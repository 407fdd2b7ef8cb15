//! Streaming queries against the Gemini `streamGenerateContent` endpoint.

pub mod request;
pub mod stream;
pub mod worker;

pub use request::QueryRequest;
pub use worker::{QueryWorker, WorkerEvent, WorkerMessage};

use crate::settings::AppConfig;
use anyhow::Result;
use reqwest::blocking::Client;
use std::io::BufReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiError {
    /// The provider answered with a non-success status (bad key, quota, bad
    /// model name, ...).
    Status { status: u16, message: String },
    /// Connection, TLS or read failure.
    Transport(String),
    /// A stream payload that is not valid JSON.
    Malformed(String),
    /// An error object delivered inside the stream.
    Provider { code: Option<u16>, message: String },
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::Status { status, message } if status == &401 || status == &403 => {
                write!(f, "authentication failed ({status}): {message}")
            }
            GeminiError::Status { status, message } => {
                write!(f, "request failed with status {status}: {message}")
            }
            GeminiError::Transport(msg) => write!(f, "network error: {msg}"),
            GeminiError::Malformed(msg) => write!(f, "malformed response: {msg}"),
            GeminiError::Provider {
                code: Some(code),
                message,
            } => write!(f, "provider error {code}: {message}"),
            GeminiError::Provider { code: None, message } => {
                write!(f, "provider error: {message}")
            }
        }
    }
}

impl std::error::Error for GeminiError {}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::Transport(err.to_string())
    }
}

/// A remote model that streams generated text.
pub trait ModelClient: Send + Sync + 'static {
    /// Issue one streaming generation call. `on_fragment` receives each text
    /// fragment in arrival order and returns `false` to stop relaying.
    fn stream_generate(
        &self,
        request: &QueryRequest,
        on_fragment: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), GeminiError>;
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ink_ask/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn stream_url(&self, model_id: &str) -> String {
        stream_url(&self.base_url, model_id)
    }
}

pub fn stream_url(base_url: &str, model_id: &str) -> String {
    let model = model_id.strip_prefix("models/").unwrap_or(model_id);
    format!(
        "{}/models/{}:streamGenerateContent?alt=sse",
        base_url.trim_end_matches('/'),
        model
    )
}

/// Best-effort extraction of `error.message` from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<stream::ErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no details".into()
            } else {
                trimmed.chars().take(300).collect()
            }
        }
    }
}

impl ModelClient for GeminiClient {
    fn stream_generate(
        &self,
        request: &QueryRequest,
        on_fragment: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), GeminiError> {
        let body = serde_json::to_vec(&request.body())
            .map_err(|e| GeminiError::Malformed(e.to_string()))?;
        let url = self.stream_url(&request.model_id);
        tracing::debug!(model = %request.model_id, with_image = request.image.is_some(), "sending stream request");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", self.api_key.as_str())
            .body(body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let fragments = stream::relay_events(BufReader::new(resp), |f| on_fragment(f))?;
        tracing::debug!(fragments, "stream finished");
        Ok(())
    }
}
