use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18990;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Maximum age of a signed inbound request before it is rejected as a replay.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;
/// Per-request timeout on the completion call, separate from the hosting
/// runtime's own request timeout.
pub const COMPLETION_TIMEOUT_SECS: u64 = 45;

/// Top-level config (threadrelay.toml + THREADRELAY_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Slack workspace credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SlackConfig {
    /// Signing secret used to verify inbound event requests.
    #[serde(default)]
    pub signing_secret: String,
    /// Bot token (`xoxb-...`) for Web API calls.
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Completion model identifier. Must name one of the supported models.
    #[serde(default = "default_model")]
    pub model: String,
    /// System instruction expressing the bot's persona.
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            persona: default_persona(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_persona() -> String {
    "You are a helpful Slack bot.".to_string()
}

impl RelayConfig {
    /// Load config from a TOML file with THREADRELAY_* env var overrides
    /// (double underscore separates nesting: THREADRELAY_SLACK__BOT_TOKEN).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: RelayConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("THREADRELAY_").split("__"))
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Reject missing credentials at startup. An empty secret must never be
    /// carried forward as a live credential.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.slack.signing_secret.is_empty() {
            return Err(missing("slack.signing_secret"));
        }
        if self.slack.bot_token.is_empty() {
            return Err(missing("slack.bot_token"));
        }
        if self.openai.api_key.is_empty() {
            return Err(missing("openai.api_key"));
        }
        Ok(())
    }
}

fn missing(key: &str) -> crate::error::RelayError {
    crate::error::RelayError::Config(format!("required setting `{key}` is missing or empty"))
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.threadrelay/threadrelay.toml", home)
}
