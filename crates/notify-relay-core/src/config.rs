use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_SOURCE: &str = "com.tencent.mm";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-coder";
pub const DEFAULT_PORT: u16 = 18790;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 180;
pub const ENV_PREFIX: &str = "NOTIFY_RELAY_";

/// Top-level config (relay.toml + NOTIFY_RELAY_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Which events the pipeline accepts and how their fragments are parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Only events whose `source_id` equals this string are processed.
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub malformed: MalformedPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            malformed: MalformedPolicy::default(),
        }
    }
}

/// What the extractor does when a fragment lacks the `label:body` shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    /// Stop extracting: no payloads from this fragment or any after it.
    #[default]
    Abort,
    /// Drop only the offending fragment and keep going.
    Skip,
}

/// Outbound completion endpoint and the fixed sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Full URL of the chat-completions endpoint.
    #[serde(default = "default_completion_url")]
    pub url: String,
    /// Bearer credential. Required; there is deliberately no default.
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Role attached to the single message in each request.
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_one")]
    pub temperature: f32,
    #[serde(default = "default_one")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound on a whole request, connect through body read.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Cap on concurrent completion calls. Unset means one task per payload.
    pub max_in_flight: Option<usize>,
    /// Drop events outright (no completion call) while nobody is listening.
    #[serde(default = "bool_true")]
    pub skip_without_consumer: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            url: default_completion_url(),
            api_key: None,
            model: default_model(),
            role: default_role(),
            temperature: default_one(),
            top_p: default_one(),
            max_tokens: default_max_tokens(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_in_flight: None,
            skip_without_consumer: true,
        }
    }
}

impl CompletionConfig {
    /// The configured bearer credential, or a `Config` error if it is missing or blank.
    pub fn credential(&self) -> crate::error::Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(crate::error::RelayError::Config(
                "completion.api_key is not set".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_one() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_target() -> String {
    DEFAULT_TARGET_SOURCE.to_string()
}
fn default_completion_url() -> String {
    DEFAULT_COMPLETION_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_role() -> String {
    "system".to_string()
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl RelayConfig {
    /// Load config from a TOML file with NOTIFY_RELAY_* env var overrides.
    ///
    /// Nested keys use a double underscore: `NOTIFY_RELAY_COMPLETION__API_KEY`.
    /// Falls back to `~/.notify-relay/relay.toml` when no path is given; a
    /// missing file is not an error.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let figment = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> crate::error::Result<Self> {
        let config: RelayConfig = figment
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))?;

        tracing::debug!(
            target_source = %config.source.target,
            url = %config.completion.url,
            model = %config.completion.model,
            "relay config loaded"
        );
        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.notify-relay/relay.toml", home)
}
