use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// What to do when a query is requested while another one is still streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPolicy {
    /// Stop the running query and start the new one.
    Replace,
    /// Keep the running query and refuse the new one.
    Reject,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        QueryPolicy::Replace
    }
}

impl std::fmt::Display for QueryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryPolicy::Replace => write!(f, "replace"),
            QueryPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// API key for the model provider. `GEMINI_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Sampling temperature. Low values keep answers deterministic.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Thinking budget passed to the model. `0` asks for a direct answer.
    #[serde(default)]
    pub thinking_budget: i32,
    /// System instruction sent with every query. Omitted when empty.
    #[serde(default)]
    pub system_instruction: String,
    /// Delay between two revealed characters in milliseconds.
    #[serde(default = "default_reveal_rate_ms")]
    pub reveal_rate_ms: u64,
    /// Text pre-filled in the prompt dialog.
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
    #[serde(default = "default_pen_color")]
    pub pen_color: [u8; 4],
    #[serde(default = "default_pen_width")]
    pub pen_width: f32,
    #[serde(default = "default_response_window_pos")]
    pub response_window_pos: (f32, f32),
    #[serde(default = "default_response_window_size")]
    pub response_window_size: (f32, f32),
    #[serde(default)]
    pub query_policy: QueryPolicy,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enable toast notifications in the overlay.
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_model_id() -> String {
    "gemini-2.5-flash".into()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_reveal_rate_ms() -> u64 {
    10
}

fn default_prompt() -> String {
    "Explain the marked portion on the screen.".into()
}

fn default_pen_color() -> [u8; 4] {
    [255, 0, 0, 200]
}

fn default_pen_width() -> f32 {
    4.0
}

fn default_response_window_pos() -> (f32, f32) {
    (925.0, 40.0)
}

fn default_response_window_size() -> (f32, f32) {
    (350.0, 625.0)
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model_id: default_model_id(),
            temperature: default_temperature(),
            thinking_budget: 0,
            system_instruction: String::new(),
            reveal_rate_ms: default_reveal_rate_ms(),
            default_prompt: default_prompt(),
            pen_color: default_pen_color(),
            pen_width: default_pen_width(),
            response_window_pos: default_response_window_pos(),
            response_window_size: default_response_window_size(),
            query_policy: QueryPolicy::default(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            enable_toasts: default_toasts(),
            toast_duration: default_toast_duration(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The API key from `GEMINI_API_KEY`, falling back to the settings file.
    ///
    /// An absent key is not an error here; the provider rejects the first
    /// query instead.
    pub fn resolve_api_key(&self) -> String {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => self.api_key.clone().unwrap_or_default(),
        }
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            api_key: self.resolve_api_key(),
            ..self.file_config()
        }
    }

    /// Build the configuration from the file values only, ignoring the
    /// environment.
    pub fn file_config(&self) -> AppConfig {
        AppConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            model_id: self.model_id.clone(),
            temperature: self.temperature,
            thinking_budget: self.thinking_budget,
            system_instruction: self.system_instruction.clone(),
            reveal_rate_ms: self.reveal_rate_ms.max(1),
            default_prompt: self.default_prompt.clone(),
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            query_policy: self.query_policy,
        }
    }
}

/// Configuration handed to the controller and the model client at
/// construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub model_id: String,
    pub temperature: f32,
    pub thinking_budget: i32,
    pub system_instruction: String,
    pub reveal_rate_ms: u64,
    pub default_prompt: String,
    pub api_base_url: String,
    pub timeout: Duration,
    pub query_policy: QueryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Settings::default().file_config()
    }
}
