//! Bounded action and status vocabularies, one per source system.
//!
//! Translating an unrecognized wire-level string into one of these enums is
//! a hard failure: the corresponding event is not produced, and the caller
//! must not guess semantics for action strings introduced upstream after
//! this registry was written.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// GitHub pull-request actions this service acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Synchronize,
}

impl FromStr for PullRequestAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "reopened" => Ok(Self::Reopened),
            "synchronize" => Ok(Self::Synchronize),
            _ => Err(ParseError::InvalidFormat {
                expected: "opened, reopened, or synchronize".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// GitLab merge-request actions.
///
/// GitLab omits the `action` field (or fills it with values we do not act
/// on) for some state transitions; in that case the merge-request `state`
/// substitutes for the action, which is why `Opened` and `Closed` appear
/// here alongside the true actions `Reopen` and `Update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitlabAction {
    Opened,
    Closed,
    Reopen,
    Update,
}

impl FromStr for GitlabAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "closed" => Ok(Self::Closed),
            "reopen" => Ok(Self::Reopen),
            "update" => Ok(Self::Update),
            _ => Err(ParseError::InvalidFormat {
                expected: "opened, closed, reopen, or update".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Actions on comments (pull-request and issue alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentAction {
    Created,
    Edited,
}

impl FromStr for CommentAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "edited" => Ok(Self::Edited),
            _ => Err(ParseError::InvalidFormat {
                expected: "created or edited".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Result states of a Testing Farm request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingFarmResult {
    New,
    Queued,
    Running,
    Passed,
    Failed,
    Skipped,
    Unknown,
    Error,
    Complete,
    Canceled,
}

impl FromStr for TestingFarmResult {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            "unknown" => Ok(Self::Unknown),
            "error" => Ok(Self::Error),
            "complete" => Ok(Self::Complete),
            "canceled" => Ok(Self::Canceled),
            _ => Err(ParseError::InvalidFormat {
                expected: "a Testing Farm result state".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Whether a Copr notification marks the start or the end of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoprBuildPhase {
    Started,
    Ended,
}

/// Koji task states as delivered on `buildsys.task.state.change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KojiTaskState {
    Free,
    Open,
    Closed,
    Canceled,
    Assigned,
    Failed,
}

impl FromStr for KojiTaskState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(Self::Free),
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "CANCELED" => Ok(Self::Canceled),
            "ASSIGNED" => Ok(Self::Assigned),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ParseError::InvalidFormat {
                expected: "a Koji task state".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Koji build states as delivered on `buildsys.build.state.change`.
///
/// The wire encodes these as small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KojiBuildState {
    Building,
    Complete,
    Deleted,
    Failed,
    Canceled,
}

impl KojiBuildState {
    /// Decode the numeric state used by the message bus. Numbers outside
    /// the vocabulary yield `None` so the payload declines.
    pub fn from_number(number: u64) -> Option<Self> {
        match number {
            0 => Some(Self::Building),
            1 => Some(Self::Complete),
            2 => Some(Self::Deleted),
            3 => Some(Self::Failed),
            4 => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// Outcome of a scan-service (OpenScanHub) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Cancel,
    Interrupt,
    Fail,
}

impl FromStr for ScanStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "cancel" => Ok(Self::Cancel),
            "interrupt" => Ok(Self::Interrupt),
            "fail" => Ok(Self::Fail),
            _ => Err(ParseError::InvalidFormat {
                expected: "success, cancel, interrupt, or fail".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}
