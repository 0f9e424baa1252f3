use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WatcherConfig {
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Live metrics endpoint; absent means every snapshot is simulated.
    #[serde(default)]
    pub metrics_url: Option<String>,
    /// Analytics backend supplying server-known rules and alerts.
    #[serde(default)]
    pub backend_url: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            cooldown_ms: default_cooldown_ms(),
            max_alerts: default_max_alerts(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            metrics_url: None,
            backend_url: None,
        }
    }
}

fn default_check_interval_ms() -> u64 {
    30_000
}

fn default_cooldown_ms() -> i64 {
    300_000
}

fn default_max_alerts() -> usize {
    50
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<WatcherConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<WatcherConfig, ConfigError> {
    let cfg: WatcherConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &WatcherConfig) -> Result<(), ConfigError> {
    if cfg.check_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "check_interval_ms must be > 0".into(),
        ));
    }
    if cfg.max_alerts == 0 {
        return Err(ConfigError::Validation("max_alerts must be > 0".into()));
    }
    if cfg.cooldown_ms < 0 {
        return Err(ConfigError::Validation("cooldown_ms must be >= 0".into()));
    }
    if cfg.fetch_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_ms must be > 0".into(),
        ));
    }
    Ok(())
}
