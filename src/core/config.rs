use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::deadline::{FETCH_BUDGET, STORE_BUDGET};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            quote_url: default_quote_url(),
            output_path: default_output_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_fetch_ms")]
    pub fetch_ms: u64,
    #[serde(default = "default_store_ms")]
    pub store_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_ms: default_fetch_ms(),
            store_ms: default_store_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_quote_url() -> String {
    "http://localhost:3000/quote".to_string()
}

fn default_output_path() -> String {
    "current-quotation.txt".to_string()
}

fn default_fetch_ms() -> u64 {
    FETCH_BUDGET.as_millis() as u64
}

fn default_store_ms() -> u64 {
    STORE_BUDGET.as_millis() as u64
}

fn default_pool_size() -> u32 {
    5
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Provider endpoint returning the `USDBRL` envelope.
    pub quoting_api_url: String,
    /// SQLite file path, or `:memory:` for a process-local store.
    pub database: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Loads from `path` if given, else the default config file, else the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let default_path = Self::default_config_path()?;
        if default_path.exists() {
            debug!("Loading default config from {}", default_path.display());
            return Self::load_from_path(&default_path);
        }

        debug!("No config file found, reading environment");
        Self::from_env()
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "quoting", "quoting")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from named values, as found in the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Missing required configuration value: {key}"))
        };

        let config = Self {
            quoting_api_url: required("QUOTING_API_URL")?,
            database: required("SQLITE_DATABASE_NAME")?,
            server: ServerConfig {
                listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(default_listen_addr),
            },
            client: ClientConfig {
                quote_url: lookup("QUOTE_SERVER_URL").unwrap_or_else(default_quote_url),
                output_path: lookup("QUOTATION_OUTPUT_PATH").unwrap_or_else(default_output_path),
            },
            timeouts: TimeoutConfig {
                fetch_ms: parse_number(&lookup, "FETCH_TIMEOUT_MS", default_fetch_ms())?,
                store_ms: parse_number(&lookup, "STORE_TIMEOUT_MS", default_store_ms())?,
            },
            store: StoreConfig {
                pool_size: parse_number(&lookup, "STORE_POOL_SIZE", default_pool_size())?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.quoting_api_url.trim().is_empty() {
            bail!("Configuration value quoting_api_url must not be empty");
        }
        if self.database.trim().is_empty() {
            bail!("Configuration value database must not be empty");
        }
        if self.store.pool_size == 0 {
            bail!("Configuration value store.pool_size must be at least 1");
        }
        Ok(())
    }
}

/// Parses `value` into the field's own type, so out-of-range input fails instead of wrapping.
fn parse_number<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("Invalid number for {key}: {v}")),
        None => Ok(default),
    }
}
