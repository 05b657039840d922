//! API configuration

use std::path::PathBuf;

use core_kernel::Timezone;
use domain_underwriting::{AggregationConfig, FlatExtraComposition};
use serde::Deserialize;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// JSON rule catalog loaded at startup
    pub rule_catalog_path: Option<PathBuf>,
    /// Jurisdiction timezone that decides "today" for evaluations
    pub timezone: Timezone,
    /// How flat extras of the winning tier are combined
    pub flat_extra_composition: FlatExtraComposition,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            rule_catalog_path: None,
            timezone: Timezone::default(),
            flat_extra_composition: FlatExtraComposition::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_`-prefixed environment variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Aggregation settings handed to the underwriting service
    pub fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            flat_extra_composition: self.flat_extra_composition,
        }
    }
}
