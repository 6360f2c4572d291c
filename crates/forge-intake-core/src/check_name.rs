//! # Check-Name Grammar
//!
//! CI check runs are named with a compound colon-delimited identifier:
//!
//! ```text
//! rpm-build:fedora-34-x86_64
//! rpm-build:fedora-34-x86_64:identifier
//! rpm-build:main:fedora-34-x86_64:identifier
//! propose-downstream:f35
//! ```
//!
//! For build and test runs attached to a commit- or release-triggered
//! project event, the reporting side embeds the branch or tag name as a
//! redundant middle segment. Since the project event is already resolved
//! through the check run's external id, that segment can be discarded; the
//! segment count plus the trigger kind decide which grammar applies.

use crate::binder::TriggerKind;
use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

// ============================================================================
// JobKind
// ============================================================================

/// Job kinds with registered handlers.
///
/// A check name whose first segment is not one of these is declined fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    RpmBuild,
    ProductionBuild,
    KojiBuild,
    TestingFarm,
    ProposeDownstream,
    PullFromUpstream,
    BodhiUpdate,
}

impl JobKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpmBuild => "rpm-build",
            Self::ProductionBuild => "production-build",
            Self::KojiBuild => "koji-build",
            Self::TestingFarm => "testing-farm",
            Self::ProposeDownstream => "propose-downstream",
            Self::PullFromUpstream => "pull-from-upstream",
            Self::BodhiUpdate => "bodhi-update",
        }
    }

    /// Whether this job reports per-target build/test check runs.
    ///
    /// This set and the 3-segment rule in [`parse_check_name`] must stay in
    /// sync: a new build/test-style job kind added here changes how its
    /// 3-segment check names are interpreted for commit- and
    /// release-triggered project events.
    pub fn is_build_or_test(&self) -> bool {
        matches!(
            self,
            Self::RpmBuild | Self::ProductionBuild | Self::KojiBuild | Self::TestingFarm
        )
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpm-build" => Ok(Self::RpmBuild),
            "production-build" => Ok(Self::ProductionBuild),
            "koji-build" => Ok(Self::KojiBuild),
            "testing-farm" => Ok(Self::TestingFarm),
            "propose-downstream" => Ok(Self::ProposeDownstream),
            "pull-from-upstream" => Ok(Self::PullFromUpstream),
            "bodhi-update" => Ok(Self::BodhiUpdate),
            _ => Err(ParseError::InvalidFormat {
                expected: "a job kind with a registered handler".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Decoded check-run name: `(job, target, identifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckName {
    pub job: JobKind,
    pub target: String,
    pub identifier: Option<String>,
}

/// Why a check-run name could not be decoded.
///
/// Distinguishable from a generic decline so operators can spot check names
/// that slipped through the reporting contract.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckNameError {
    #[error("check name '{check_name}' has no job prefix")]
    Empty { check_name: String },

    #[error("unknown job kind '{job}' in check name '{check_name}'")]
    UnknownJobKind { job: String, check_name: String },

    #[error("check name '{check_name}' has no target segment")]
    MissingTarget { check_name: String },
}

/// Decode a compound check-run name.
///
/// `trigger` is the trigger kind of the project event the original check
/// belongs to; it disambiguates the 3-segment case, where build/test jobs
/// on commit- and release-triggered events embed a redundant branch/tag
/// segment.
pub fn parse_check_name(
    check_name: &str,
    trigger: TriggerKind,
) -> Result<CheckName, CheckNameError> {
    let parts: Vec<&str> = check_name.splitn(4, ':').collect();

    let job_str = match parts.first() {
        Some(job) if !job.is_empty() => *job,
        _ => {
            warn!(check_name, "check name cannot be parsed");
            return Err(CheckNameError::Empty {
                check_name: check_name.to_string(),
            });
        }
    };

    let job: JobKind = match job_str.parse() {
        Ok(job) => job,
        Err(_) => {
            warn!(job = job_str, check_name, "no handler registered for job");
            return Err(CheckNameError::UnknownJobKind {
                job: job_str.to_string(),
                check_name: check_name.to_string(),
            });
        }
    };

    let (target, identifier) = match parts.as_slice() {
        [_, target] => (*target, None),
        [_, seg2, seg3] => {
            if job.is_build_or_test()
                && matches!(trigger, TriggerKind::Commit | TriggerKind::Release)
            {
                // seg2 is the redundant branch/tag context
                (*seg3, None)
            } else {
                (*seg2, Some(*seg3))
            }
        }
        [_, _, target, identifier] => (*target, Some(*identifier)),
        _ => {
            warn!(check_name, "unexpected number of check name segments");
            return Err(CheckNameError::MissingTarget {
                check_name: check_name.to_string(),
            });
        }
    };

    if target.is_empty() {
        warn!(check_name, "empty target segment in check name");
        return Err(CheckNameError::MissingTarget {
            check_name: check_name.to_string(),
        });
    }

    info!(
        job = %job,
        target,
        identifier = ?identifier,
        "decoded check name"
    );

    Ok(CheckName {
        job,
        target: target.to_string(),
        identifier: identifier.map(str::to_string),
    })
}

#[cfg(test)]
#[path = "check_name_tests.rs"]
mod tests;
