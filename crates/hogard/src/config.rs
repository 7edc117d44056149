//! Configuration file parsing and structures.
//!
//! hogard reads a single TOML file. Every section is optional so that a
//! deployment can run from environment variables alone; secrets are usually
//! supplied that way and override whatever the file says.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Default config file looked up when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "hogard.toml";

/// Top-level configuration structure
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,

    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub areas: AreasConfig,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `hogard::ha = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the tracing filter for this logging configuration
    pub fn targets(&self) -> Targets {
        self.overrides.iter().fold(
            Targets::new().with_default(LevelFilter::from(self.level)),
            |targets, (target, level)| targets.with_target(target.clone(), LevelFilter::from(*level)),
        )
    }
}

/// HTTP listener for the webhook and service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Home Assistant REST API access
#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantConfig {
    /// Base URL, e.g. `https://ha.example.net`
    #[serde(default)]
    pub base_url: String,

    /// Long-lived access token
    #[serde(default)]
    pub token: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_ha_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout_ms: default_ha_timeout_ms(),
        }
    }
}

fn default_ha_timeout_ms() -> u64 {
    5000
}

/// WhatsApp Cloud API credentials and sender policy
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Token echoed back during webhook verification
    #[serde(default)]
    pub verify_token: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub phone_number_id: String,

    #[serde(default = "default_graph_api_base")]
    pub api_base: String,

    /// Phone numbers allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allowed_numbers: Vec<String>,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: String::new(),
            access_token: String::new(),
            phone_number_id: String::new(),
            api_base: default_graph_api_base(),
            allowed_numbers: Vec::new(),
        }
    }
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com/v20.0".to_string()
}

/// OpenAI-compatible chat completion endpoint driving the tool loop
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on model round trips per message
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    #[serde(default = "default_agent_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_steps: default_max_steps(),
            timeout_ms: default_agent_timeout_ms(),
        }
    }
}

fn default_agent_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_steps() -> usize {
    4
}

fn default_agent_timeout_ms() -> u64 {
    30_000
}

/// Rooms, their spoken aliases and the lights they group
#[derive(Debug, Clone, Deserialize)]
pub struct AreasConfig {
    /// Area used when the user does not name one
    #[serde(default = "default_area")]
    pub default: String,

    /// Areas in registration order; order decides alias tie-breaks
    #[serde(default = "default_areas", rename = "area")]
    pub areas: Vec<AreaConfig>,
}

impl Default for AreasConfig {
    fn default() -> Self {
        Self {
            default: default_area(),
            areas: default_areas(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AreaConfig {
    /// Canonical identifier
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Entity ids, e.g. `light.kitchen`
    #[serde(default)]
    pub devices: Vec<String>,
}

impl AreaConfig {
    pub fn new(name: &str, aliases: &[&str], devices: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            devices: devices.iter().map(|d| d.to_string()).collect(),
        }
    }
}

fn default_area() -> String {
    "living".to_string()
}

fn default_areas() -> Vec<AreaConfig> {
    vec![
        AreaConfig::new(
            "living",
            &["living", "estar", "sala"],
            &["light.living_ceiling", "light.living_lamp"],
        ),
        AreaConfig::new(
            "dormitorio",
            &["dormitorio", "cuarto", "pieza", "habitación", "habitacion"],
            &["light.bedroom_ceiling"],
        ),
        AreaConfig::new("cocina", &["cocina", "kitchen"], &["light.kitchen"]),
    ]
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Load the file if present, apply environment overrides and validate.
    ///
    /// An explicit path must exist. Without one, `hogard.toml` in the working
    /// directory is used when it exists and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override file values with environment variables.
    ///
    /// Takes the lookup as a function so tests don't need to touch the
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HA_BASE_URL") {
            self.home_assistant.base_url = v;
        }
        if let Some(v) = get("HA_TOKEN") {
            self.home_assistant.token = v;
        }
        if let Some(v) = get("HA_TIMEOUT_MS") {
            self.home_assistant.timeout_ms = parse_env("HA_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("WA_VERIFY_TOKEN") {
            self.whatsapp.verify_token = v;
        }
        if let Some(v) = get("WA_ACCESS_TOKEN") {
            self.whatsapp.access_token = v;
        }
        if let Some(v) = get("WA_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = v;
        }
        if let Some(v) = get("ALLOWED_NUMBERS") {
            self.whatsapp.allowed_numbers = v
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("DEFAULT_AREA") {
            self.areas.default = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.agent.api_key = v;
        }

        Ok(())
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for area in &self.areas.areas {
            let name = area.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "areas.area.name must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "area '{}' is defined more than once",
                    name
                )));
            }
            if area.devices.iter().all(|d| d.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "area '{}' has no devices",
                    name
                )));
            }
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::Validation(
                "agent.max_steps must be at least 1".to_string(),
            ));
        }

        let default = self.areas.default.trim().to_lowercase();
        if !seen.contains(&default) {
            return Err(ConfigError::Validation(format!(
                "default area '{}' not found in areas",
                self.areas.default
            )));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("{0} is not configured")]
    Missing(&'static str),
}
