use crate::domain::constants::{
    API_URL_ENV, CONFIG_FILE, DEFAULT_API_BASE_URL, DEFAULT_REFRESH_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::services::storage::config_dir;
use serde::Deserialize;
use std::time::Duration;

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl ConfigFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let cfg: ConfigFile = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.feed.interval_secs == 0 {
            anyhow::bail!("feed.interval_secs must be positive");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.feed.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn with_api_override(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.api.base_url = url.to_string();
        }
        self
    }
}

/// `$HOME/.config/satark/config.toml`, then `SATARK_API_URL`.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let path = config_dir()?.join(CONFIG_FILE);
    let cfg = if path.exists() {
        ConfigFile::parse(&std::fs::read_to_string(path)?)?
    } else {
        ConfigFile::default()
    };
    let env_url = std::env::var(API_URL_ENV).ok();
    Ok(cfg.with_api_override(env_url.as_deref()))
}
