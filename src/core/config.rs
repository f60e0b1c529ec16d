use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::core::fingerprint::FingerprintPolicy;

const CONFIG_ENV: &str = "FIELDWORK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "fieldwork.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub fingerprint_policy: FingerprintPolicy,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Endpoint of the analysis service. Required for submissions; the
    /// read-only commands never touch it.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// Delivery endpoint. Unset means notifications are skipped entirely.
    #[serde(default)]
    pub url: Option<String>,

    /// Recipient forwarded verbatim to the delivery web app.
    #[serde(default)]
    pub to: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("workorders.db")
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            fingerprint_policy: FingerprintPolicy::default(),
            classifier: ClassifierConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_token: None,
            timeout_secs: default_timeout_secs(),
            attempts: default_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            to: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load from `fieldwork.toml` (path overridable via `FIELDWORK_CONFIG`).
    /// A missing file means all defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
