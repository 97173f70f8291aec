// This file is part of the product Quire.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{AppConfig, LoggingConfig, PaginationConfig, ServerConfig, ValidatedConfig};
use log::LevelFilter;

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5466,
                    workers: 1,
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                log_level: LevelFilter::Info,
                app: AppConfig {
                    name: "Test Blog".to_string(),
                    storage_url: "/storage".to_string(),
                },
                pagination: PaginationConfig::default(),
            },
        }
    }

    pub fn with_storage_url(mut self, storage_url: &str) -> Self {
        self.config.app.storage_url = storage_url.to_string();
        self
    }

    pub fn with_pagination(mut self, default_per_page: usize, max_per_page: usize) -> Self {
        self.config.pagination = PaginationConfig {
            default_per_page,
            max_per_page,
        };
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
