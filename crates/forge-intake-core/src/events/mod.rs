//! # Variant Registry
//!
//! The closed set of normalized event types produced by classification.
//!
//! Each concrete variant is uniquely constructible from exactly one wire
//! shape; no two extractors claim the same payload (verified by test, not by
//! the type system). Variants whose shape is identical across forges carry a
//! [`Forge`](crate::Forge) tag instead of being duplicated per forge, and
//! the accessors shared by every variant ([`Event::source_url`],
//! [`Event::actor`], ...) are plain match-based functions over the common
//! field set rather than an inheritance chain.

use crate::check_name::JobKind;
use crate::Forge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod actions;

pub use actions::{
    CommentAction, CoprBuildPhase, GitlabAction, KojiBuildState, KojiTaskState, PullRequestAction,
    ScanStatus, TestingFarmResult,
};

// ============================================================================
// Forge activity variants
// ============================================================================

/// A branch was advanced on a forge repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    pub forge: Forge,
    pub namespace: String,
    pub repo_name: String,
    /// Short ref name (branch), already stripped of `refs/heads/`
    pub git_ref: String,
    pub commit_sha: String,
    pub project_url: String,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A tag was pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPushEvent {
    pub forge: Forge,
    pub namespace: String,
    pub repo_name: String,
    /// Short tag name, already stripped of `refs/tags/`
    pub git_ref: String,
    pub commit_sha: String,
    pub project_url: String,
    pub actor: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A release was published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    pub forge: Forge,
    pub namespace: String,
    pub repo_name: String,
    pub tag_name: String,
    pub project_url: String,
    /// GitHub release payloads do not embed the tagged commit; it stays
    /// `None` until a later enrichment step resolves it via the forge API.
    pub commit_sha: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A GitHub pull request was opened, reopened, or synchronized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pr_id: u64,
    /// Head (source) repository coordinates
    pub base_repo_namespace: String,
    pub base_repo_name: String,
    pub base_ref: String,
    /// Base (target) repository coordinates
    pub target_repo_namespace: Option<String>,
    pub target_repo_name: Option<String>,
    pub project_url: String,
    pub commit_sha: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// A GitLab merge request changed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequestEvent {
    pub action: GitlabAction,
    pub actor: String,
    /// Global MR id
    pub object_id: u64,
    /// Project-scoped MR iid, shown to users
    pub object_iid: u64,
    pub source_repo_namespace: String,
    pub source_repo_name: String,
    pub source_repo_branch: Option<String>,
    pub source_project_url: String,
    pub target_repo_namespace: String,
    pub target_repo_name: String,
    pub target_repo_branch: Option<String>,
    pub project_url: String,
    pub commit_sha: Option<String>,
    pub oldrev: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment on a pull/merge request, on any forge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestCommentEvent {
    pub forge: Forge,
    pub action: CommentAction,
    pub pr_id: u64,
    pub base_repo_namespace: Option<String>,
    pub base_repo_name: Option<String>,
    /// Fork owner, where the forge distinguishes it (Pagure)
    pub base_repo_owner: Option<String>,
    pub target_repo_namespace: Option<String>,
    pub target_repo_name: Option<String>,
    pub project_url: String,
    pub actor: String,
    pub comment: String,
    pub comment_id: u64,
    pub commit_sha: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub forge: Forge,
    pub action: CommentAction,
    pub issue_id: u64,
    pub repo_namespace: String,
    pub repo_name: String,
    pub project_url: String,
    pub actor: String,
    pub comment: String,
    pub comment_id: u64,
    pub created_at: DateTime<Utc>,
}

/// Which reviewable unit a check rerun belongs to.
///
/// Chosen from the runtime type of the persisted project event's target
/// object, not from the check name itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CheckRerunTarget {
    PullRequest { pr_id: u64 },
    Commit { branch: String },
    Release { tag_name: String },
}

/// A request to redo one specific CI check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRerunEvent {
    pub namespace: String,
    pub repo_name: String,
    pub project_url: String,
    /// Head commit of the check run being rerun
    pub commit_sha: String,
    pub actor: Option<String>,
    pub job: JobKind,
    pub target: String,
    pub job_identifier: Option<String>,
    /// Id of the project event the original check was attached to
    pub project_event_id: i64,
    pub rerun_target: CheckRerunTarget,
    pub created_at: DateTime<Utc>,
}

impl CheckRerunEvent {
    /// Build targets to rerun, when the named job is a build-style job.
    pub fn build_targets_override(&self) -> Option<Vec<String>> {
        if matches!(
            self.job,
            JobKind::RpmBuild | JobKind::ProductionBuild | JobKind::KojiBuild
        ) {
            return Some(vec![self.target.clone()]);
        }
        None
    }

    /// Test targets to rerun, when the named job is the test job.
    pub fn tests_targets_override(&self) -> Option<Vec<String>> {
        if self.job == JobKind::TestingFarm {
            return Some(vec![self.target.clone()]);
        }
        None
    }

    /// Branches to rerun, when the named job is the downstream-sync job.
    pub fn branches_override(&self) -> Option<Vec<String>> {
        if self.job == JobKind::ProposeDownstream {
            return Some(vec![self.target.clone()]);
        }
        None
    }
}

/// The GitHub App was installed into an account.
///
/// Account-level: carries no repository coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationEvent {
    pub installation_id: u64,
    /// Namespace (user/organization) into which the app has been installed
    pub account_login: String,
    pub account_id: u64,
    pub account_url: String,
    pub account_type: String,
    /// Repositories within the account, as `owner/name`
    pub repositories: Vec<String>,
    /// User who installed the app into `account_login`
    pub sender_id: u64,
    pub sender_login: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Build / test / scan result variants
// ============================================================================

/// A GitLab CI pipeline changed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub project_url: String,
    pub project_name: Option<String>,
    pub pipeline_id: u64,
    /// Source branch name
    pub git_ref: String,
    pub status: String,
    pub detailed_status: Option<String>,
    pub commit_sha: String,
    /// `merge_request_event` or `push`
    pub source: Option<String>,
    /// Null when the pipeline was not triggered by a merge request
    pub merge_request_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A CI flag was added to or updated on a Pagure pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestFlagEvent {
    pub username: Option<String>,
    pub comment: Option<String>,
    pub status: Option<String>,
    pub url: Option<String>,
    pub commit_sha: Option<String>,
    pub pr_id: u64,
    pub pr_url: Option<String>,
    pub pr_source_branch: Option<String>,
    pub project_url: String,
    pub project_name: Option<String>,
    pub project_namespace: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A Copr build started or finished in one chroot.
///
/// Carries the build id used to look up the originating pipeline; the
/// repository context is not embedded in the notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoprBuildEvent {
    pub phase: CoprBuildPhase,
    pub build_id: u64,
    pub chroot: String,
    pub status: Option<u64>,
    pub owner: String,
    pub project_name: String,
    pub pkg: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A Koji scratch-build task changed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KojiTaskEvent {
    pub task_id: u64,
    pub state: KojiTaskState,
    pub old_state: Option<KojiTaskState>,
    pub start_time: Option<String>,
    pub completion_time: Option<String>,
    /// Child `buildArch` task id, when present
    pub rpm_build_task_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// A production Koji build changed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KojiBuildEvent {
    pub build_id: u64,
    pub state: KojiBuildState,
    pub old_state: Option<KojiBuildState>,
    pub package_name: String,
    pub branch_name: String,
    pub commit_sha: String,
    pub namespace: String,
    pub repo_name: String,
    pub project_url: String,
    pub epoch: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub rpm_build_task_id: Option<u64>,
    pub web_url: String,
    pub created_at: DateTime<Utc>,
}

impl KojiBuildEvent {
    /// `name-version-release` of the built package.
    pub fn nvr(&self) -> String {
        format!(
            "{}-{}-{}",
            self.package_name,
            self.version.as_deref().unwrap_or("?"),
            self.release.as_deref().unwrap_or("?")
        )
    }
}

/// A Testing Farm request finished (or otherwise changed state).
///
/// The notification itself carries only the request id; the remaining
/// fields come from the out-of-band detail fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingFarmResultsEvent {
    pub pipeline_id: String,
    pub result: TestingFarmResult,
    pub compose: Option<String>,
    pub summary: Option<String>,
    pub log_url: Option<String>,
    pub copr_build_id: Option<String>,
    pub copr_chroot: Option<String>,
    pub commit_sha: Option<String>,
    pub project_url: Option<String>,
    pub identifier: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The release-monitoring feed noticed a new upstream version.
///
/// The repository URL is derived from the dist-git template; the feed does
/// not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionUpdateEvent {
    pub package_name: String,
    pub version: String,
    pub distgit_project_url: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle stage of an OpenScanHub task, with the result attached once
/// the task is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum ScanPhase {
    Started,
    Finished {
        status: ScanStatus,
        issues_added_url: String,
        issues_fixed_url: String,
        scan_results_url: String,
    },
}

/// An OpenScanHub static-analysis task started or finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenScanHubTaskEvent {
    pub task_id: u64,
    pub phase: ScanPhase,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// The closed sum
// ============================================================================

/// One normalized event, produced by exactly one extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Event {
    Push(PushEvent),
    TagPush(TagPushEvent),
    Release(ReleaseEvent),
    PullRequest(PullRequestEvent),
    MergeRequest(MergeRequestEvent),
    PullRequestComment(PullRequestCommentEvent),
    IssueComment(IssueCommentEvent),
    CheckRerun(CheckRerunEvent),
    Installation(InstallationEvent),
    Pipeline(PipelineEvent),
    PullRequestFlag(PullRequestFlagEvent),
    CoprBuild(CoprBuildEvent),
    KojiTask(KojiTaskEvent),
    KojiBuild(KojiBuildEvent),
    TestingFarmResults(TestingFarmResultsEvent),
    VersionUpdate(VersionUpdateEvent),
    OpenScanHubTask(OpenScanHubTaskEvent),
}

impl Event {
    /// Short kind string for logging and routing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::TagPush(_) => "tag_push",
            Self::Release(_) => "release",
            Self::PullRequest(_) => "pull_request",
            Self::MergeRequest(_) => "merge_request",
            Self::PullRequestComment(_) => "pull_request_comment",
            Self::IssueComment(_) => "issue_comment",
            Self::CheckRerun(_) => "check_rerun",
            Self::Installation(_) => "installation",
            Self::Pipeline(_) => "pipeline",
            Self::PullRequestFlag(_) => "pull_request_flag",
            Self::CoprBuild(_) => "copr_build",
            Self::KojiTask(_) => "koji_task",
            Self::KojiBuild(_) => "koji_build",
            Self::TestingFarmResults(_) => "testing_farm_results",
            Self::VersionUpdate(_) => "version_update",
            Self::OpenScanHubTask(_) => "open_scan_hub_task",
        }
    }

    /// Canonical URL of the subject repository, when the variant has one.
    ///
    /// `None` for account-level events and results that only carry a lookup
    /// id.
    pub fn source_url(&self) -> Option<&str> {
        match self {
            Self::Push(e) => Some(&e.project_url),
            Self::TagPush(e) => Some(&e.project_url),
            Self::Release(e) => Some(&e.project_url),
            Self::PullRequest(e) => Some(&e.project_url),
            Self::MergeRequest(e) => Some(&e.project_url),
            Self::PullRequestComment(e) => Some(&e.project_url),
            Self::IssueComment(e) => Some(&e.project_url),
            Self::CheckRerun(e) => Some(&e.project_url),
            Self::Installation(_) => None,
            Self::Pipeline(e) => Some(&e.project_url),
            Self::PullRequestFlag(e) => Some(&e.project_url),
            Self::CoprBuild(_) => None,
            Self::KojiTask(_) => None,
            Self::KojiBuild(e) => Some(&e.project_url),
            Self::TestingFarmResults(e) => e.project_url.as_deref(),
            Self::VersionUpdate(e) => Some(&e.distgit_project_url),
            Self::OpenScanHubTask(_) => None,
        }
    }

    /// Identity of the human or bot that triggered the event.
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::Push(e) => e.actor.as_deref(),
            Self::TagPush(e) => e.actor.as_deref(),
            Self::Release(_) => None,
            Self::PullRequest(e) => Some(&e.actor),
            Self::MergeRequest(e) => Some(&e.actor),
            Self::PullRequestComment(e) => Some(&e.actor),
            Self::IssueComment(e) => Some(&e.actor),
            Self::CheckRerun(e) => e.actor.as_deref(),
            Self::Installation(e) => Some(&e.sender_login),
            Self::Pipeline(_) => None,
            Self::PullRequestFlag(e) => e.username.as_deref(),
            Self::CoprBuild(_) => None,
            Self::KojiTask(_) => None,
            Self::KojiBuild(_) => None,
            Self::TestingFarmResults(_) => None,
            Self::VersionUpdate(_) => None,
            Self::OpenScanHubTask(_) => None,
        }
    }

    /// Display label distinguishing concurrent activity on one project
    /// (tag name, PR number, branch name); used to name derived artifacts.
    pub fn identifier(&self) -> Option<String> {
        match self {
            Self::Push(e) => Some(e.git_ref.clone()),
            Self::TagPush(e) => Some(e.git_ref.clone()),
            Self::Release(e) => Some(e.tag_name.clone()),
            Self::PullRequest(e) => Some(e.pr_id.to_string()),
            Self::MergeRequest(e) => Some(e.object_iid.to_string()),
            Self::PullRequestComment(e) => Some(e.pr_id.to_string()),
            Self::IssueComment(e) => Some(e.issue_id.to_string()),
            Self::CheckRerun(e) => Some(match &e.rerun_target {
                CheckRerunTarget::PullRequest { pr_id } => pr_id.to_string(),
                CheckRerunTarget::Commit { branch } => branch.clone(),
                CheckRerunTarget::Release { tag_name } => tag_name.clone(),
            }),
            Self::Installation(_) => None,
            Self::Pipeline(_) => None,
            Self::PullRequestFlag(e) => Some(e.pr_id.to_string()),
            Self::CoprBuild(_) => None,
            Self::KojiTask(_) => None,
            Self::KojiBuild(e) => Some(e.branch_name.clone()),
            Self::TestingFarmResults(e) => e.identifier.clone(),
            Self::VersionUpdate(e) => Some(e.version.clone()),
            Self::OpenScanHubTask(e) => Some(e.task_id.to_string()),
        }
    }

    /// Git ref/commit implicated by the event, when applicable.
    pub fn commit_reference(&self) -> Option<&str> {
        match self {
            Self::Push(e) => Some(&e.commit_sha),
            Self::TagPush(e) => Some(&e.commit_sha),
            Self::Release(e) => e.commit_sha.as_deref(),
            Self::PullRequest(e) => Some(&e.commit_sha),
            Self::MergeRequest(e) => e.commit_sha.as_deref(),
            Self::PullRequestComment(e) => e.commit_sha.as_deref(),
            Self::IssueComment(_) => None,
            Self::CheckRerun(e) => Some(&e.commit_sha),
            Self::Installation(_) => None,
            Self::Pipeline(e) => Some(&e.commit_sha),
            Self::PullRequestFlag(e) => e.commit_sha.as_deref(),
            Self::CoprBuild(_) => None,
            Self::KojiTask(_) => None,
            Self::KojiBuild(e) => Some(&e.commit_sha),
            Self::TestingFarmResults(e) => e.commit_sha.as_deref(),
            Self::VersionUpdate(_) => None,
            Self::OpenScanHubTask(_) => None,
        }
    }

    /// Event timestamp; ingestion time when the source omitted one.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Push(e) => e.created_at,
            Self::TagPush(e) => e.created_at,
            Self::Release(e) => e.created_at,
            Self::PullRequest(e) => e.created_at,
            Self::MergeRequest(e) => e.created_at,
            Self::PullRequestComment(e) => e.created_at,
            Self::IssueComment(e) => e.created_at,
            Self::CheckRerun(e) => e.created_at,
            Self::Installation(e) => e.created_at,
            Self::Pipeline(e) => e.created_at,
            Self::PullRequestFlag(e) => e.created_at,
            Self::CoprBuild(e) => e.created_at,
            Self::KojiTask(e) => e.created_at,
            Self::KojiBuild(e) => e.created_at,
            Self::TestingFarmResults(e) => e.created_at,
            Self::VersionUpdate(e) => e.created_at,
            Self::OpenScanHubTask(e) => e.created_at,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
