//! Configuration management
//!
//! Every setting comes from the environment (after loading `.env`) and falls
//! back to the `DEFAULT_*` constants below.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::ingest::config::{DEFAULT_BATCH_SIZE, DEFAULT_WORKER_COUNT};
use crate::ingest::queue::DEFAULT_QUEUE_CAPACITY;
use crate::ingest::PipelineConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/ohlc";

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin (any).
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Default time budget for one upload, in seconds.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Default request body limit for uploads (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub ingest: IngestConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Upload pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub worker_count: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub upload_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl IngestConfig {
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            worker_count: self.worker_count,
            batch_size: self.batch_size,
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed_with<F, T>(lookup: &F, key: &str) -> Option<T>
        where
            F: Fn(&str) -> Option<String>,
            T: FromStr,
        {
            lookup(key).and_then(|raw| raw.trim().parse().ok())
        }

        Config {
            server: ServerConfig {
                host: lookup("OHLC_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parsed_with(&lookup, "OHLC_PORT").unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: parsed_with(&lookup, "OHLC_SHUTDOWN_TIMEOUT")
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: parsed_with(&lookup, "DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: parsed_with(&lookup, "DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: parsed_with(&lookup, "DATABASE_CONNECT_TIMEOUT")
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
                idle_timeout_secs: parsed_with(&lookup, "DATABASE_IDLE_TIMEOUT")
                    .unwrap_or(DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: split_list(
                    &lookup("CORS_ALLOWED_ORIGINS")
                        .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string()),
                ),
                allow_credentials: parsed_with(&lookup, "CORS_ALLOW_CREDENTIALS").unwrap_or(false),
            },
            ingest: IngestConfig {
                worker_count: parsed_with(&lookup, "INGEST_WORKER_COUNT").unwrap_or(DEFAULT_WORKER_COUNT),
                batch_size: parsed_with(&lookup, "INGEST_BATCH_SIZE").unwrap_or(DEFAULT_BATCH_SIZE),
                queue_capacity: parsed_with(&lookup, "INGEST_QUEUE_CAPACITY").unwrap_or(DEFAULT_QUEUE_CAPACITY),
                upload_timeout_secs: parsed_with(&lookup, "INGEST_UPLOAD_TIMEOUT")
                    .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
                max_upload_bytes: parsed_with(&lookup, "INGEST_MAX_UPLOAD_BYTES")
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.trim().is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if let Err(reason) = self.ingest.pipeline().validate() {
            anyhow::bail!("Invalid ingest settings: {}", reason);
        }

        if self.ingest.upload_timeout_secs == 0 {
            anyhow::bail!("Upload timeout must be greater than 0");
        }

        if self.ingest.max_upload_bytes == 0 {
            anyhow::bail!("Max upload size must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
