//! # Forge-Intake Core
//!
//! Core logic for recognizing, validating, and normalizing inbound forge
//! and build-system notifications into a closed set of typed events.
//!
//! Raw payloads arrive from four source systems (GitHub and GitLab webhooks,
//! fedora-messaging topics, Testing Farm callbacks), each with its own
//! vocabulary and shape. The [`dispatch::EventClassifier`] picks the matching
//! extractor, the extractor validates and pulls fields out of the nested
//! payload, and the result is one member of [`events::Event`] that downstream
//! handlers can consume uniformly.
//!
//! ## Architecture
//!
//! - Classification is a pure computation over one payload at a time; the
//!   only I/O happens at the [`binder::ProjectEventStore`] boundary (check
//!   rerun resolution and project-event binding) and the
//!   [`dispatch::TestingFarmClient`] detail fetch.
//! - Extractors never raise for payloads that merely fail to match; a
//!   decline is silent at the classification boundary and logged for
//!   observability.
//! - Store and detail-fetch failures surface as retryable errors distinct
//!   from "unrecognized", because the caller's retry policy differs.
//!
//! ## Usage
//!
//! ```rust
//! use forge_intake_core::{Forge, SourceSystem};
//!
//! let source: SourceSystem = "fedora-messaging".parse().unwrap();
//! assert_eq!(source, SourceSystem::FedoraMessaging);
//! assert_eq!(Forge::GitHub.as_str(), "github");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Domain Tag Types
// ============================================================================

/// Hosted git platform a normalized event originates from.
///
/// Variants that share one wire-independent shape (pushes, releases,
/// comments) carry this tag instead of being duplicated per forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Forge {
    GitHub,
    GitLab,
    Pagure,
}

impl Forge {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Pagure => "pagure",
        }
    }
}

impl fmt::Display for Forge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Forge {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "pagure" => Ok(Self::Pagure),
            _ => Err(ParseError::InvalidFormat {
                expected: "github, gitlab, or pagure".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Transport-level origin of a raw payload.
///
/// Keyed dispatch ([`dispatch::EventClassifier::classify_by_kind`]) uses this
/// together with the wire event kind (hook name, topic) to pick exactly one
/// extractor without scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceSystem {
    GitHub,
    GitLab,
    FedoraMessaging,
    TestingFarm,
}

impl SourceSystem {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::FedoraMessaging => "fedora-messaging",
            Self::TestingFarm => "testing-farm",
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceSystem {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            "fedora-messaging" => Ok(Self::FedoraMessaging),
            "testing-farm" => Ok(Self::TestingFarm),
            _ => Err(ParseError::InvalidFormat {
                expected: "github, gitlab, fedora-messaging, or testing-farm".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Service configuration: deployment identity, bot accounts, URL templates
pub mod config;

/// Variant registry: the closed set of normalized event types
pub mod events;

/// Check-name grammar for compound CI check-run identifiers
pub mod check_name;

/// Per-source payload extractors
pub mod extractors;

/// Classification entry points: ordered fallback and keyed dispatch
pub mod dispatch;

/// Project-event binding boundary to the persistence collaborator
pub mod binder;

// Re-export key types for convenience
pub use binder::{
    BoundEvent, EventBinder, InMemoryProjectEventStore, ProjectEvent, ProjectEventObject,
    ProjectEventStore, ProjectRef, StoreError, TriggerKind,
};
pub use check_name::{parse_check_name, CheckName, CheckNameError, JobKind};
pub use config::{ConfigError, Deployment, ServiceConfig};
pub use dispatch::{
    Classification, ClassifyError, EventClassifier, TestingFarmClient, TestingFarmClientError,
    TestingFarmRequestDetails,
};
pub use events::Event;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
