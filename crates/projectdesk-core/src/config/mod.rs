//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Projectdesk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mock: MockConfig,
    pub external: ExternalConfig,
}

/// Simulated backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Artificial delay applied to every mock call
    pub latency_ms: u64,
}

/// Demo REST API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Cached reads are served without I/O for this long
    pub stale_secs: u64,
    /// Unused cache entries are dropped after this long
    pub cache_secs: u64,
    /// Extra attempts after a failed read
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub posts_limit: usize,
    pub members_limit: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { latency_ms: 500 }
    }
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jsonplaceholder.typicode.com".to_string(),
            timeout_secs: 10,
            stale_secs: 5 * 60,
            cache_secs: 10 * 60,
            retry_attempts: 2,
            retry_base_delay_ms: 1000,
            posts_limit: 10,
            members_limit: 6,
        }
    }
}

const KEYS: [&str; 9] = [
    "mock.latency_ms",
    "external.base_url",
    "external.timeout_secs",
    "external.stale_secs",
    "external.cache_secs",
    "external.retry_attempts",
    "external.retry_base_delay_ms",
    "external.posts_limit",
    "external.members_limit",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("PROJECTDESK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("projectdesk")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or return defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path without env overrides
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Apply `PROJECTDESK_*` environment overrides
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(value) = env::var("PROJECTDESK_MOCK_LATENCY_MS") {
            self.set("mock.latency_ms", &value)
                .context("Invalid PROJECTDESK_MOCK_LATENCY_MS")?;
        }
        if let Ok(value) = env::var("PROJECTDESK_API_BASE_URL") {
            self.set("external.base_url", &value)
                .context("Invalid PROJECTDESK_API_BASE_URL")?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.external.base_url.trim().is_empty() {
            return Err(anyhow!("external.base_url cannot be empty"));
        }
        if self.external.timeout_secs == 0 {
            return Err(anyhow!("external.timeout_secs must be greater than zero"));
        }
        if self.external.cache_secs < self.external.stale_secs {
            return Err(anyhow!(
                "external.cache_secs ({}) must be at least external.stale_secs ({})",
                self.external.cache_secs,
                self.external.stale_secs
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "mock.latency_ms" => Ok(self.mock.latency_ms.to_string()),
            "external.base_url" => Ok(self.external.base_url.clone()),
            "external.timeout_secs" => Ok(self.external.timeout_secs.to_string()),
            "external.stale_secs" => Ok(self.external.stale_secs.to_string()),
            "external.cache_secs" => Ok(self.external.cache_secs.to_string()),
            "external.retry_attempts" => Ok(self.external.retry_attempts.to_string()),
            "external.retry_base_delay_ms" => Ok(self.external.retry_base_delay_ms.to_string()),
            "external.posts_limit" => Ok(self.external.posts_limit.to_string()),
            "external.members_limit" => Ok(self.external.members_limit.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `projectdesk config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "mock.latency_ms" => {
                self.mock.latency_ms = parse_value(key, value)?;
            }
            "external.base_url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(anyhow!("Base URL must start with http:// or https://"));
                }
                self.external.base_url = url.to_string();
            }
            "external.timeout_secs" => {
                let secs: u64 = parse_value(key, value)?;
                if secs == 0 {
                    return Err(anyhow!("Timeout must be greater than zero"));
                }
                self.external.timeout_secs = secs;
            }
            "external.stale_secs" => {
                self.external.stale_secs = parse_value(key, value)?;
            }
            "external.cache_secs" => {
                self.external.cache_secs = parse_value(key, value)?;
            }
            "external.retry_attempts" => {
                let attempts: u32 = parse_value(key, value)?;
                if attempts > 10 {
                    return Err(anyhow!("Retry attempts must be between 0 and 10"));
                }
                self.external.retry_attempts = attempts;
            }
            "external.retry_base_delay_ms" => {
                self.external.retry_base_delay_ms = parse_value(key, value)?;
            }
            "external.posts_limit" => {
                self.external.posts_limit = parse_value(key, value)?;
            }
            "external.members_limit" => {
                self.external.members_limit = parse_value(key, value)?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `projectdesk config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))
}
