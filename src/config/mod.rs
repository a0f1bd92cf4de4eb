use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::codegen::DEFAULT_CODE_LENGTH;
use crate::registry::{RegistryOptions, DEFAULT_BASE_URL, DEFAULT_STORAGE_KEY};
use crate::sweeper::DEFAULT_SWEEP_INTERVAL_SECS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub registry: RegistryConfig,
    pub api_server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the file backend, database URL for the SQL backends
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub storage_key: String,
    pub base_url: String,
    pub code_length: usize,
    pub create_delay_ms: u64,
    pub sweep_interval_secs: u64,
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl RegistryConfig {
    pub const DEFAULT_RECENT_LIMIT: usize = 5;

    pub fn options(&self) -> RegistryOptions {
        RegistryOptions {
            storage_key: self.storage_key.clone(),
            base_url: self.base_url.clone(),
            code_length: self.code_length,
        }
    }

    /// Latency awaited before each create, outside the registry lock.
    pub fn create_delay(&self) -> Duration {
        Duration::from_millis(self.create_delay_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let backend_str = var("STORE_BACKEND", "file");
        let backend = match backend_str.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File,
            "sqlite" => StorageBackend::Sqlite,
            "postgres" | "postgresql" => StorageBackend::Postgres,
            other => {
                tracing::warn!(
                    "Unknown STORE_BACKEND '{other}', falling back to 'file'. Supported values: memory, file, sqlite, postgres"
                );
                StorageBackend::File
            }
        };

        let default_url = match backend {
            StorageBackend::Sqlite => "sqlite://./linkkeep.db",
            StorageBackend::Postgres => "postgres://localhost/linkkeep",
            StorageBackend::Memory | StorageBackend::File => "./linkkeep-data",
        };
        let storage_url = var("STORE_URL", default_url);

        let max_connections = var("STORE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("STORE_MAX_CONNECTIONS must be a positive integer")?;

        let storage_key = var("STORE_KEY", DEFAULT_STORAGE_KEY);
        let base_url = var("BASE_URL", DEFAULT_BASE_URL);

        let code_length = var("CODE_LENGTH", &DEFAULT_CODE_LENGTH.to_string())
            .parse::<usize>()
            .context("CODE_LENGTH must be a positive integer")?;
        if code_length == 0 {
            anyhow::bail!("CODE_LENGTH must be at least 1");
        }

        let create_delay_ms = var("CREATE_DELAY_MS", "0")
            .parse::<u64>()
            .context("CREATE_DELAY_MS must be a non-negative integer")?;

        let sweep_interval_secs = var(
            "SWEEP_INTERVAL_SECS",
            &DEFAULT_SWEEP_INTERVAL_SECS.to_string(),
        )
        .parse::<u64>()
        .context("SWEEP_INTERVAL_SECS must be a positive integer")?;

        let recent_limit = var(
            "RECENT_LIMIT",
            &RegistryConfig::DEFAULT_RECENT_LIMIT.to_string(),
        )
        .parse::<usize>()
        .context("RECENT_LIMIT must be a non-negative integer")?;

        let api_host = var("API_HOST", "127.0.0.1");
        let api_port = var("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        Ok(Config {
            storage: StorageConfig {
                backend,
                url: storage_url,
                max_connections,
            },
            registry: RegistryConfig {
                storage_key,
                base_url,
                code_length,
                create_delay_ms,
                sweep_interval_secs,
                recent_limit,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.url, "./linkkeep-data");
        assert_eq!(config.registry.storage_key, "url-shortener-links");
        assert_eq!(config.registry.code_length, 6);
        assert_eq!(config.registry.create_delay_ms, 0);
        assert_eq!(config.registry.sweep_interval_secs, 60);
        assert_eq!(config.registry.recent_limit, 5);
        assert_eq!(config.api_server.port, 8080);
    }

    #[test]
    fn test_backend_selection_and_default_urls() {
        let config = config_from(&[("STORE_BACKEND", "PostgreSQL")]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.storage.url.starts_with("postgres://"));

        let config = config_from(&[("STORE_BACKEND", "sqlite"), ("STORE_URL", "sqlite::memory:")])
            .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.url, "sqlite::memory:");

        let config = config_from(&[("STORE_BACKEND", "carrier-pigeon")]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_registry_options_follow_config() {
        let config = config_from(&[
            ("BASE_URL", "https://sho.rt/"),
            ("CODE_LENGTH", "8"),
            ("CREATE_DELAY_MS", "800"),
            ("STORE_KEY", "links-v2"),
        ])
        .unwrap();

        let options = config.registry.options();
        assert_eq!(options.base_url, "https://sho.rt/");
        assert_eq!(options.code_length, 8);
        assert_eq!(options.storage_key, "links-v2");
        assert_eq!(config.registry.create_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        assert!(config_from(&[("API_PORT", "http")]).is_err());
        assert!(config_from(&[("CODE_LENGTH", "0")]).is_err());
        assert!(config_from(&[("CREATE_DELAY_MS", "-1")]).is_err());
    }

    #[test]
    fn test_sweep_interval_never_zero() {
        let config = config_from(&[("SWEEP_INTERVAL_SECS", "0")]).unwrap();
        assert_eq!(config.registry.sweep_interval(), Duration::from_secs(1));
    }
}
