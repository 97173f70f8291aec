// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
const MAX_WORKERS: usize = 64;
const MAX_PER_PAGE_LIMIT: usize = 1000;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ServerConfig {
    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Public prefix for stored images (`image_url`, `featured_image_url`).
    #[serde(default = "default_storage_url")]
    pub storage_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            storage_url: default_storage_url(),
        }
    }
}

fn default_app_name() -> String {
    "Quire".to_string()
}

fn default_storage_url() -> String {
    "/storage".to_string()
}

impl AppConfig {
    /// Join a stored relative path onto the storage prefix.
    pub fn storage_url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.storage_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_per_page() -> usize {
    15
}

fn default_max_per_page() -> usize {
    100
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub log_level: LevelFilter,
    pub app: AppConfig,
    pub pagination: PaginationConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        let log_level = Self::validate_logging(&self.logging)?;
        Self::validate_pagination(&self.pagination)?;

        Ok(ValidatedConfig {
            server: self.server,
            logging: self.logging,
            log_level,
            app: self.app,
            pagination: self.pagination,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if !(1..=MAX_WORKERS).contains(&server.workers) {
            return Err(ConfigError::ValidationError(format!(
                "server.workers must be between 1 and {}, got: {}",
                MAX_WORKERS, server.workers
            )));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<LevelFilter, ConfigError> {
        match logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LevelFilter::Trace),
            "debug" => Ok(LevelFilter::Debug),
            "info" => Ok(LevelFilter::Info),
            "warn" => Ok(LevelFilter::Warn),
            "error" => Ok(LevelFilter::Error),
            other => Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error; got: '{}'",
                other
            ))),
        }
    }

    fn validate_pagination(pagination: &PaginationConfig) -> Result<(), ConfigError> {
        if pagination.default_per_page < 1 {
            return Err(ConfigError::ValidationError(
                "pagination.default_per_page must be at least 1".to_string(),
            ));
        }
        if pagination.default_per_page > pagination.max_per_page {
            return Err(ConfigError::ValidationError(format!(
                "pagination.default_per_page ({}) cannot exceed pagination.max_per_page ({})",
                pagination.default_per_page, pagination.max_per_page
            )));
        }
        if pagination.max_per_page > MAX_PER_PAGE_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "pagination.max_per_page must be at most {}, got: {}",
                MAX_PER_PAGE_LIMIT, pagination.max_per_page
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;
    use std::fs;

    const MINIMAL: &str = "server:\n  host: \"127.0.0.1\"\n  port: 8080\nlogging:\n  level: \"info\"\n";

    #[test]
    fn minimal_config_gets_defaults() {
        let fixture = TestFixtureRoot::new_unique("config-minimal").unwrap();
        fs::write(fixture.path().join(CONFIG_FILE_NAME), MINIMAL).unwrap();

        let config = Config::load_and_validate(fixture.path()).unwrap();
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.app.name, "Quire");
        assert_eq!(config.app.storage_url, "/storage");
        assert_eq!(config.pagination.default_per_page, 15);
        assert_eq!(config.pagination.max_per_page, 100);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let fixture = TestFixtureRoot::new_unique("config-missing").unwrap();
        let err = Config::load_and_validate(fixture.path()).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let fixture = TestFixtureRoot::new_unique("config-level").unwrap();
        fs::write(
            fixture.path().join(CONFIG_FILE_NAME),
            MINIMAL.replace("info", "loud"),
        )
        .unwrap();
        let err = Config::load_and_validate(fixture.path()).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn rejects_worker_count_out_of_range() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: 0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            app: AppConfig::default(),
            pagination: PaginationConfig::default(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_inverted_pagination_bounds() {
        let pagination = PaginationConfig {
            default_per_page: 50,
            max_per_page: 20,
        };
        assert!(Config::validate_pagination(&pagination).is_err());
    }

    #[test]
    fn storage_url_joins_cleanly() {
        let app = AppConfig {
            name: "Quire".to_string(),
            storage_url: "https://cdn.example.com/storage/".to_string(),
        };
        assert_eq!(
            app.storage_url_for("/posts/cover.png"),
            "https://cdn.example.com/storage/posts/cover.png"
        );
    }
}
