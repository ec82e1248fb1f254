//! # Configuration
//!
//! Settings are layered, highest precedence first:
//!
//! 1. command-line flags
//! 2. environment (`ACCESSION_DATABASE`)
//! 3. TOML config file (`--config <path>`, else `accession.toml` if present)
//! 4. built-in defaults
//!
//! ```toml
//! [database]
//! path = "accession.redb"
//! backend = "redb"        # or "memory"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! Server security settings (`ACCESSION_API_KEY`, `ACCESSION_RATE_LIMIT`,
//! `ACCESSION_CORS_ORIGINS`) are read by the API module at router build.

use crate::error::AppError;
use accession_core::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILENAME: &str = "accession.toml";

pub const DEFAULT_DATABASE: &str = "accession.redb";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "ACCESSION_DATABASE";

// =============================================================================
// FILE LAYER
// =============================================================================

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: DatabaseSection,
    pub server: ServerSection,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
    pub backend: Option<BackendKind>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Storage backend selector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// redb database file (ACID, persistent)
    #[default]
    Redb,
    /// In-memory ledger (volatile; for testing)
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::Memory => "memory",
        }
    }
}

/// Parse config file contents.
pub fn parse_config(raw: &str) -> Result<FileConfig, AppError> {
    toml::from_str(raw).map_err(|e| AppError::Config(format!("Invalid config: {}", e)))
}

/// Load the config file.
///
/// An explicit `path` must exist. Without one, `accession.toml` in the
/// working directory is used if present, and defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, AppError> {
    let config_path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILENAME));

    if !config_path.exists() {
        if path.is_some() {
            return Err(AppError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        }
        return Ok(FileConfig::default());
    }

    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| AppError::Config(format!("Failed to read config: {}", e)))?;
    let config = parse_config(&raw)?;
    tracing::debug!(path = %config_path.display(), "Loaded config file");
    Ok(config)
}

/// Read a non-empty environment variable.
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Values given on the command line; `None` means not given.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Merge the layers. `env` is the environment lookup (see `env_var`).
    pub fn resolve(
        overrides: &Overrides,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let database = overrides
            .database
            .clone()
            .or_else(|| env(DATABASE_ENV).map(PathBuf::from))
            .or_else(|| file.database.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        Self {
            database,
            backend: overrides
                .backend
                .or(file.database.backend)
                .unwrap_or_default(),
            host: overrides
                .host
                .clone()
                .or_else(|| file.server.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides
                .port
                .or(file.server.port)
                .unwrap_or(DEFAULT_PORT),
        }
    }

    /// `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open the configured storage backend.
    pub fn open_backend(&self) -> Result<StorageBackend, AppError> {
        match self.backend {
            BackendKind::Redb => StorageBackend::with_redb(&self.database).map_err(|e| {
                AppError::Io(format!(
                    "Cannot open database {}: {}",
                    self.database.display(),
                    e
                ))
            }),
            BackendKind::Memory => {
                tracing::warn!("Using in-memory backend; nothing will be persisted");
                Ok(StorageBackend::in_memory())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
