//! # Service Configuration Module
//!
//! Static configuration the extractors need at classification time: which
//! deployment this instance is (to recognize its own GitHub App), the bot
//! account identities whose comments must be filtered out, and the URL
//! templates used when a payload does not carry a repository URL.
//!
//! Configuration is immutable after loading and validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// Deployment
// ============================================================================

/// Deployment environment this service instance runs as.
///
/// Determines which GitHub App slug is recognized as "ours" when filtering
/// check-run rerun requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    Production,
    Staging,
}

impl Deployment {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }
}

impl FromStr for Deployment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "stg" => Ok(Self::Staging),
            _ => Err(ParseError::InvalidFormat {
                expected: "production or staging".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// ServiceConfig
// ============================================================================

/// Complete service configuration loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Which deployment this instance is
    pub deployment: Deployment,

    /// GitHub App slug of the production deployment
    #[serde(default = "default_app_slug")]
    pub github_app_slug: String,

    /// GitHub App slug of the staging deployment
    #[serde(default = "default_app_slug_stg")]
    pub github_app_slug_stg: String,

    /// Account names under which this service posts comments, on any forge.
    ///
    /// Comments authored by one of these identities are declined during
    /// classification to prevent feedback loops. Both deployments' accounts
    /// are listed so that staging ignores production's comments and vice
    /// versa.
    #[serde(default = "default_bot_accounts")]
    pub bot_accounts: Vec<String>,

    /// Base URL of the dist-git instance, used to derive repository URLs for
    /// payloads that do not carry one (dist-git pushes, version updates).
    /// Must end with a slash.
    #[serde(default = "default_distgit_base_url")]
    pub distgit_base_url: String,

    /// Koji web UI base URL for constructing task links
    #[serde(default = "default_koji_web_url")]
    pub koji_web_url: String,
}

fn default_app_slug() -> String {
    "forge-intake".to_string()
}

fn default_app_slug_stg() -> String {
    "forge-intake-stg".to_string()
}

fn default_bot_accounts() -> Vec<String> {
    vec![
        "forge-intake".to_string(),
        "forge-intake-stg".to_string(),
        "forge-intake[bot]".to_string(),
        "forge-intake-stg[bot]".to_string(),
    ]
}

fn default_distgit_base_url() -> String {
    "https://src.fedoraproject.org/".to_string()
}

fn default_koji_web_url() -> String {
    "https://koji.fedoraproject.org".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            deployment: Deployment::Production,
            github_app_slug: default_app_slug(),
            github_app_slug_stg: default_app_slug_stg(),
            bot_accounts: default_bot_accounts(),
            distgit_base_url: default_distgit_base_url(),
            koji_web_url: default_koji_web_url(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file path
    ///
    /// # Errors
    /// - `ConfigError::FileNotFound` - Configuration file missing
    /// - `ConfigError::ParseError` - Invalid YAML/JSON syntax
    /// - `ConfigError::ValidationError` - Invalid configuration values
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read file: {}", e),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: ServiceConfig = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                    message: format!("Invalid YAML: {}", e),
                })?
            }
            "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                message: format!("Invalid JSON: {}", e),
            })?,
            _ => serde_json::from_str(&contents)
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| ConfigError::ParseError {
                    message: format!("Failed to parse as JSON or YAML: {}", e),
                })?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from the `SERVICE_CONFIGURATION` environment
    /// variable (JSON string).
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let config_str = std::env::var("SERVICE_CONFIGURATION").map_err(|_| {
            ConfigError::SourceUnavailable(
                "SERVICE_CONFIGURATION environment variable not set".to_string(),
            )
        })?;

        let config: ServiceConfig =
            serde_json::from_str(&config_str).map_err(|e| ConfigError::ParseError {
                message: format!("Invalid JSON in SERVICE_CONFIGURATION: {}", e),
            })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.github_app_slug.is_empty() {
            errors.push("github_app_slug must not be empty".to_string());
        }

        if self.bot_accounts.is_empty() {
            errors.push("bot_accounts must not be empty".to_string());
        }

        if !self.distgit_base_url.ends_with('/') {
            errors.push(format!(
                "distgit_base_url must end with a slash: {}",
                self.distgit_base_url
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationError { errors });
        }

        Ok(())
    }

    /// GitHub App slug that identifies this deployment's own check runs.
    pub fn own_app_slug(&self) -> &str {
        match self.deployment {
            Deployment::Production => &self.github_app_slug,
            Deployment::Staging => &self.github_app_slug_stg,
        }
    }

    /// Whether the given login belongs to one of the service's own accounts.
    pub fn is_bot_account(&self, login: &str) -> bool {
        self.bot_accounts.iter().any(|a| a == login)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },

    #[error("Configuration validation failed: {errors:?}")]
    ValidationError { errors: Vec<String> },

    #[error("Configuration source unavailable: {0}")]
    SourceUnavailable(String),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
