//! # Classification Dispatch
//!
//! Routes a raw payload to the extractor that can normalize it. Two entry
//! points exist: an ordered scan over every extractor for callers that have
//! no transport metadata, and a keyed lookup for callers that know the
//! payload's source and wire kind (webhook header value or bus topic).
//!
//! The scan order is a single explicit list; recognition must not depend on
//! incidental iteration order of a map. The keyed path consults the same
//! extractors, so both entry points agree on what a payload means.

use crate::binder::{ProjectEventStore, StoreError};
use crate::config::ServiceConfig;
use crate::events::{CoprBuildPhase, Event, TestingFarmResult};
use crate::extractors::{github, gitlab, pagure, results};
use crate::SourceSystem;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Testing Farm boundary
// ============================================================================

/// Detail record for one Testing Farm request, fetched out of band.
///
/// The result callback only carries the request id; the rest of the context
/// lives behind the Testing Farm API.
#[derive(Debug, Clone, PartialEq)]
pub struct TestingFarmRequestDetails {
    pub result: TestingFarmResult,
    pub compose: Option<String>,
    pub summary: Option<String>,
    pub log_url: Option<String>,
    pub copr_build_id: Option<String>,
    pub copr_chroot: Option<String>,
    pub commit_sha: Option<String>,
    pub project_url: Option<String>,
    pub identifier: Option<String>,
}

/// Error type for Testing Farm detail fetches.
#[derive(Debug, thiserror::Error)]
pub enum TestingFarmClientError {
    #[error("testing farm request {request_id} not found")]
    NotFound { request_id: String },

    #[error("testing farm api failure: {message}")]
    Api { message: String },
}

/// Interface to the Testing Farm API.
#[async_trait]
pub trait TestingFarmClient: Send + Sync {
    /// Fetch the details of one request by its id.
    async fn request_details(
        &self,
        request_id: &str,
    ) -> Result<TestingFarmRequestDetails, TestingFarmClientError>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for classification.
///
/// Every variant means "recognized but the system could not finish"; an
/// unrecognized payload is [`Classification::Unrecognized`], never an error.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("project event {id} not found")]
    ProjectEventNotFound { id: i64 },

    #[error("could not fetch details of testing farm request {request_id}: {source}")]
    ResultDetail {
        request_id: String,
        #[source]
        source: TestingFarmClientError,
    },
}

impl ClassifyError {
    /// Whether redelivering the payload later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(_) => true,
            Self::ProjectEventNotFound { .. } => true,
            Self::ResultDetail { .. } => true,
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Outcome of classifying one payload.
#[derive(Debug, Clone)]
pub enum Classification {
    /// Exactly one extractor produced a normalized event.
    Recognized(Event),
    /// No extractor claimed the payload; drop it without error.
    Unrecognized,
}

/// One extractor, as an addressable unit for ordering and keyed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractorKind {
    GithubPullRequest,
    GithubPullRequestComment,
    GithubIssueComment,
    GithubRelease,
    GithubPush,
    GithubCheckRerun,
    GithubInstallation,
    TestingFarmResults,
    CoprBuildStart,
    CoprBuildEnd,
    GitlabMergeRequest,
    KojiTask,
    KojiBuild,
    GitlabMergeRequestComment,
    GitlabIssueComment,
    GitlabPush,
    GitlabPipeline,
    PagurePush,
    PagurePullRequestFlag,
    PagurePullRequestComment,
    VersionUpdate,
    GitlabRelease,
    GitlabTagPush,
    OpenScanHubTaskStarted,
    OpenScanHubTaskFinished,
}

/// Scan order for payloads without transport metadata. High-volume kinds
/// come first; order is otherwise arbitrary but fixed.
const SCAN_ORDER: &[ExtractorKind] = &[
    ExtractorKind::GithubPullRequest,
    ExtractorKind::GithubPullRequestComment,
    ExtractorKind::GithubIssueComment,
    ExtractorKind::GithubRelease,
    ExtractorKind::GithubPush,
    ExtractorKind::GithubCheckRerun,
    ExtractorKind::GithubInstallation,
    ExtractorKind::TestingFarmResults,
    ExtractorKind::CoprBuildStart,
    ExtractorKind::CoprBuildEnd,
    ExtractorKind::GitlabMergeRequest,
    ExtractorKind::KojiTask,
    ExtractorKind::KojiBuild,
    ExtractorKind::GitlabMergeRequestComment,
    ExtractorKind::GitlabIssueComment,
    ExtractorKind::GitlabPush,
    ExtractorKind::GitlabPipeline,
    ExtractorKind::PagurePush,
    ExtractorKind::PagurePullRequestFlag,
    ExtractorKind::PagurePullRequestComment,
    ExtractorKind::VersionUpdate,
    ExtractorKind::OpenScanHubTaskStarted,
    ExtractorKind::OpenScanHubTaskFinished,
    ExtractorKind::GitlabRelease,
    ExtractorKind::GitlabTagPush,
];

/// Whether the payload's bus topic satisfies the extractor's topic gate.
/// Extractors for webhook payloads are not topic-gated and always pass.
fn topic_matches(kind: ExtractorKind, topic: Option<&str>) -> bool {
    let suffixes: &[&str] = match kind {
        ExtractorKind::PagurePush => &["git.receive"],
        ExtractorKind::PagurePullRequestFlag => &[
            "pagure.pull-request.flag.added",
            "pagure.pull-request.flag.updated",
        ],
        ExtractorKind::PagurePullRequestComment => &["pagure.pull-request.comment.added"],
        ExtractorKind::CoprBuildStart => &["copr.build.start"],
        ExtractorKind::CoprBuildEnd => &["copr.build.end"],
        ExtractorKind::KojiTask => &["buildsys.task.state.change"],
        ExtractorKind::KojiBuild => &["buildsys.build.state.change"],
        ExtractorKind::VersionUpdate => &["hotness.update.bug.file"],
        ExtractorKind::OpenScanHubTaskStarted => &["openscanhub.task.started"],
        ExtractorKind::OpenScanHubTaskFinished => &["openscanhub.task.finished"],
        _ => return true,
    };
    match topic {
        Some(topic) => suffixes.iter().any(|s| topic.ends_with(s)),
        None => false,
    }
}

/// Extractors responsible for one `(source, wire kind)` pair, in the order
/// to try them. An empty slice means the pair is unknown.
fn keyed_extractors(source: SourceSystem, wire_kind: &str) -> &'static [ExtractorKind] {
    match source {
        SourceSystem::GitHub => match wire_kind {
            "pull_request" => &[ExtractorKind::GithubPullRequest],
            // Conversation comments on PRs arrive as issue comments; the
            // payload shape decides which of the two it is.
            "issue_comment" => &[
                ExtractorKind::GithubPullRequestComment,
                ExtractorKind::GithubIssueComment,
            ],
            "release" => &[ExtractorKind::GithubRelease],
            "push" => &[ExtractorKind::GithubPush],
            "check_run" => &[ExtractorKind::GithubCheckRerun],
            "installation" => &[ExtractorKind::GithubInstallation],
            _ => &[],
        },
        SourceSystem::GitLab => match wire_kind {
            "Merge Request Hook" => &[ExtractorKind::GitlabMergeRequest],
            "Note Hook" => &[
                ExtractorKind::GitlabMergeRequestComment,
                ExtractorKind::GitlabIssueComment,
            ],
            "Push Hook" => &[ExtractorKind::GitlabPush],
            "Tag Push Hook" => &[ExtractorKind::GitlabTagPush],
            "Pipeline Hook" => &[ExtractorKind::GitlabPipeline],
            "Release Hook" => &[ExtractorKind::GitlabRelease],
            _ => &[],
        },
        SourceSystem::FedoraMessaging => {
            static BUS_KINDS: [ExtractorKind; 10] = [
                ExtractorKind::PagurePush,
                ExtractorKind::PagurePullRequestFlag,
                ExtractorKind::PagurePullRequestComment,
                ExtractorKind::CoprBuildStart,
                ExtractorKind::CoprBuildEnd,
                ExtractorKind::KojiTask,
                ExtractorKind::KojiBuild,
                ExtractorKind::VersionUpdate,
                ExtractorKind::OpenScanHubTaskStarted,
                ExtractorKind::OpenScanHubTaskFinished,
            ];
            BUS_KINDS
                .iter()
                .find(|kind| topic_matches(**kind, Some(wire_kind)))
                .map(std::slice::from_ref)
                .unwrap_or(&[])
        }
        SourceSystem::TestingFarm => match wire_kind {
            "results" => &[ExtractorKind::TestingFarmResults],
            _ => &[],
        },
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Recognizes raw payloads and normalizes them into [`Event`] variants.
///
/// Classification itself performs no I/O; the store and Testing Farm
/// collaborators are only consulted by the two extractors whose payloads
/// do not carry enough context on their own.
pub struct EventClassifier {
    store: Arc<dyn ProjectEventStore>,
    testing_farm: Arc<dyn TestingFarmClient>,
    config: ServiceConfig,
}

impl EventClassifier {
    pub fn new(
        store: Arc<dyn ProjectEventStore>,
        testing_farm: Arc<dyn TestingFarmClient>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            testing_farm,
            config,
        }
    }

    /// Classify a payload with no transport metadata by scanning every
    /// extractor in the fixed scan order. The first producing extractor
    /// wins; at most one event comes out of one payload.
    pub async fn classify(&self, payload: &Value) -> Result<Classification, ClassifyError> {
        let topic = payload.get("topic").and_then(Value::as_str);
        for kind in SCAN_ORDER {
            if !topic_matches(*kind, topic) {
                continue;
            }
            if let Some(event) = self.run(*kind, payload).await? {
                info!(kind = event.kind(), "payload recognized");
                return Ok(Classification::Recognized(event));
            }
        }
        debug!("payload not recognized by any extractor");
        Ok(Classification::Unrecognized)
    }

    /// Classify a payload whose source and wire kind are known from
    /// transport metadata: the webhook event header for forges, the topic
    /// for bus messages.
    pub async fn classify_by_kind(
        &self,
        source: SourceSystem,
        wire_kind: &str,
        payload: &Value,
    ) -> Result<Classification, ClassifyError> {
        let kinds = keyed_extractors(source, wire_kind);
        if kinds.is_empty() {
            debug!(%source, wire_kind, "unknown wire kind");
            return Ok(Classification::Unrecognized);
        }
        for kind in kinds {
            if let Some(event) = self.run(*kind, payload).await? {
                info!(%source, wire_kind, kind = event.kind(), "payload recognized");
                return Ok(Classification::Recognized(event));
            }
        }
        debug!(%source, wire_kind, "payload declined by its extractors");
        Ok(Classification::Unrecognized)
    }

    async fn run(
        &self,
        kind: ExtractorKind,
        payload: &Value,
    ) -> Result<Option<Event>, ClassifyError> {
        let event = match kind {
            ExtractorKind::GithubPullRequest => github::pull_request(payload),
            ExtractorKind::GithubPullRequestComment => {
                github::pull_request_comment(payload, &self.config)
            }
            ExtractorKind::GithubIssueComment => github::issue_comment(payload, &self.config),
            ExtractorKind::GithubRelease => github::release(payload),
            ExtractorKind::GithubPush => github::push(payload),
            ExtractorKind::GithubCheckRerun => {
                return github::check_rerun(payload, &self.config, self.store.as_ref()).await;
            }
            ExtractorKind::GithubInstallation => github::installation(payload),
            ExtractorKind::TestingFarmResults => {
                return results::testing_farm_results(payload, self.testing_farm.as_ref()).await;
            }
            ExtractorKind::CoprBuildStart => {
                results::copr_build(payload, CoprBuildPhase::Started)
            }
            ExtractorKind::CoprBuildEnd => results::copr_build(payload, CoprBuildPhase::Ended),
            ExtractorKind::GitlabMergeRequest => gitlab::merge_request(payload),
            ExtractorKind::KojiTask => results::koji_task(payload),
            ExtractorKind::KojiBuild => results::koji_build(payload, &self.config),
            ExtractorKind::GitlabMergeRequestComment => {
                gitlab::merge_request_comment(payload, &self.config)
            }
            ExtractorKind::GitlabIssueComment => gitlab::issue_comment(payload, &self.config),
            ExtractorKind::GitlabPush => gitlab::push(payload),
            ExtractorKind::GitlabPipeline => gitlab::pipeline(payload),
            ExtractorKind::PagurePush => pagure::push(payload, &self.config),
            ExtractorKind::PagurePullRequestFlag => pagure::pull_request_flag(payload),
            ExtractorKind::PagurePullRequestComment => {
                pagure::pull_request_comment(payload, &self.config)
            }
            ExtractorKind::VersionUpdate => results::version_update(payload, &self.config),
            ExtractorKind::GitlabRelease => gitlab::release(payload),
            ExtractorKind::GitlabTagPush => gitlab::tag_push(payload),
            ExtractorKind::OpenScanHubTaskStarted => results::open_scan_hub_task_started(payload),
            ExtractorKind::OpenScanHubTaskFinished => {
                results::open_scan_hub_task_finished(payload)
            }
        };
        Ok(event)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
