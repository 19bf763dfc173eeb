//! Application settings and configuration
//!
//! This module provides configuration management for the application,
//! loading settings from environment variables with sensible defaults.

use crate::auth::RoutingStrategy;
use crate::logging::LogFormat;
use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Deployment environment; selects the default log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Human-readable logs
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Log format used unless the CLI overrides it
    pub fn default_log_format(&self) -> LogFormat {
        match self {
            Environment::Development => LogFormat::Pretty,
            Environment::Staging | Environment::Production => LogFormat::Json,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Environment as ValueEnum>::from_str(s.trim(), true).map_err(|_| {
            anyhow::anyhow!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            )
        })
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Routing
    /// Raw routing strategy value; resolved by `routing_strategy()`
    pub routing_strategy: String,

    // Credential source
    pub auth_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let settings = Self {
            app_name: env_or_default("APP_NAME", "credential-router"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: env_or_default("LOG_LEVEL", "info"),
            routing_strategy: env_or_default("ROUTING_STRATEGY", ""),
            auth_dir: env::var("AUTH_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            anyhow::bail!("APP_NAME cannot be empty");
        }

        if let Some(dir) = &self.auth_dir {
            if dir.is_file() {
                anyhow::bail!("AUTH_DIR must be a directory: {}", dir.display());
            }
        }

        Ok(())
    }

    /// Resolve the configured routing strategy, warning on unknown values
    pub fn routing_strategy(&self) -> RoutingStrategy {
        let (strategy, known) = RoutingStrategy::normalize_with_known(&self.routing_strategy);
        if !known {
            tracing::warn!(
                value = %self.routing_strategy,
                fallback = %strategy,
                "Unrecognized routing strategy, using default"
            );
        }
        strategy
    }

    /// Log format for the configured environment
    pub fn log_format(&self) -> LogFormat {
        self.environment.default_log_format()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "credential-router".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            routing_strategy: String::new(),
            auth_dir: None,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "credential-router");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.routing_strategy(), RoutingStrategy::Weighted);
        assert_eq!(settings.log_format(), LogFormat::Pretty);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("development".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("stage".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(" PROD ".parse::<Environment>().unwrap(), Environment::Production);
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_environment_selects_log_format() {
        let mut settings = Settings::default();
        settings.environment = Environment::Staging;
        assert_eq!(settings.log_format(), LogFormat::Json);
        settings.environment = Environment::Production;
        assert_eq!(settings.log_format(), LogFormat::Json);
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn test_routing_strategy_resolution() {
        let mut settings = Settings::default();
        settings.routing_strategy = " RR ".to_string();
        assert_eq!(settings.routing_strategy(), RoutingStrategy::RoundRobin);

        settings.routing_strategy = "fill-first".to_string();
        assert_eq!(settings.routing_strategy(), RoutingStrategy::FillFirst);

        settings.routing_strategy = "least-busy".to_string();
        assert_eq!(settings.routing_strategy(), RoutingStrategy::Weighted);
    }

    #[test]
    fn test_validate_rejects_file_auth_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("auth.json");
        std::fs::write(&file, b"{}").unwrap();

        let mut settings = Settings::default();
        settings.auth_dir = Some(file);
        assert!(settings.validate().is_err());

        settings.auth_dir = Some(dir.path().to_path_buf());
        assert!(settings.validate().is_ok());

        settings.app_name = "  ".to_string();
        assert!(settings.validate().is_err());
    }
}
