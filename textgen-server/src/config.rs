use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, ServerError};

/// Main configuration for the text generation server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Model checkpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory with one subdirectory per run
    pub checkpoint_dir: String,
    /// Run used when a request does not name one
    pub default_run_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4850,
            },
            models: ModelsConfig {
                checkpoint_dir: "checkpoint".to_string(),
                default_run_name: "dailydialog_run".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_to_file: false,
                log_dir: "~/.textgen/logs".to_string(),
            },
        }
    }
}

impl Config {
    /// Get default configuration file path: `~/.textgen/server.toml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ServerError::Config("Cannot determine home directory".into()))?;
        Ok(home.join(".textgen").join("server.toml"))
    }

    /// Config file to use: the `--config` argument (tilde-expanded) when
    /// given, otherwise [`Config::default_path`]
    pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
            None => Self::default_path(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "Loading configuration");

        let content = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to read config file");
            e
        })?;

        let config: Config = toml::from_str(&content)?;

        config.validate()?;

        tracing::info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config("port must be between 1 and 65535".into()));
        }

        if self.server.host.trim().is_empty() {
            return Err(ServerError::Config("host cannot be empty".into()));
        }

        if self.models.checkpoint_dir.trim().is_empty() {
            return Err(ServerError::Config("checkpoint_dir cannot be empty".into()));
        }

        if self.models.default_run_name.trim().is_empty() {
            return Err(ServerError::Config("default_run_name cannot be empty".into()));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ServerError::Config(
                    "log level must be one of: trace, debug, info, warn, error".into(),
                ))
            }
        }

        Ok(())
    }

    /// Listen address as `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Checkpoint directory with `~` expanded
    pub fn checkpoint_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.models.checkpoint_dir).as_ref())
    }

    /// Log directory with `~` expanded
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.logging.log_dir).as_ref())
    }

    /// Save configuration to file (atomic write)
    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "Saving configuration");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create config directory"
                );
                e
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &toml_string).map_err(|e| {
            tracing::error!(
                path = %temp_path.display(),
                error = %e,
                "Failed to write temp config file"
            );
            e
        })?;

        std::fs::rename(&temp_path, path).map_err(|e| {
            tracing::error!(
                from = %temp_path.display(),
                to = %path.display(),
                error = %e,
                "Failed to rename temp config file"
            );
            e
        })?;

        tracing::info!(path = %path.display(), "Configuration saved successfully");
        Ok(())
    }
}
