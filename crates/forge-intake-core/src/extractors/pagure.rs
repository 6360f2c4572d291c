//! # Pagure Extraction
//!
//! Extraction for Pagure activity delivered over the fedora-messaging bus.
//! Routing is by message topic suffix, not by header; the payload is the
//! message body.

use super::{nested_str, nested_u64};
use crate::config::ServiceConfig;
use crate::events::{
    CommentAction, Event, PullRequestCommentEvent, PullRequestFlagEvent, PushEvent,
};
use crate::Forge;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

// ============================================================================
// Dist-git pushes
// ============================================================================

/// `git.receive` topic: a commit landed in a dist-git branch.
pub(crate) fn push(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let namespace = nested_str(payload, &["repo", "namespace"])?;
    let repo_name = nested_str(payload, &["repo", "name"])?;
    let fullname = nested_str(payload, &["repo", "fullname"])?;
    let branch = payload.get("branch")?.as_str()?;
    let commit_sha = payload.get("end_commit")?.as_str()?;

    Some(Event::Push(PushEvent {
        forge: Forge::Pagure,
        namespace: namespace.to_string(),
        repo_name: repo_name.to_string(),
        git_ref: super::short_ref(branch).to_string(),
        commit_sha: commit_sha.to_string(),
        project_url: format!("{}{}", config.distgit_base_url, fullname),
        actor: payload
            .get("agent")
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Pull request flags
// ============================================================================

/// `pagure.pull-request.flag.added` / `flag.updated` topics: a CI system
/// attached a status flag to a pull request.
pub(crate) fn pull_request_flag(payload: &Value) -> Option<Event> {
    let flag = payload.get("flag")?;
    let pull_request = payload.get("pull_request")?;

    Some(Event::PullRequestFlag(PullRequestFlagEvent {
        username: flag
            .get("username")
            .and_then(Value::as_str)
            .map(str::to_string),
        comment: flag
            .get("comment")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: flag
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        url: flag.get("url").and_then(Value::as_str).map(str::to_string),
        commit_sha: flag
            .get("commit_hash")
            .and_then(Value::as_str)
            .map(str::to_string),
        pr_id: nested_u64(pull_request, &["id"])?,
        pr_url: pull_request
            .get("full_url")
            .and_then(Value::as_str)
            .map(str::to_string),
        pr_source_branch: pull_request
            .get("branch_from")
            .and_then(Value::as_str)
            .map(str::to_string),
        project_url: nested_str(pull_request, &["project", "full_url"])?.to_string(),
        project_name: nested_str(pull_request, &["project", "name"]).map(str::to_string),
        project_namespace: nested_str(pull_request, &["project", "namespace"])
            .map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Pull request comments
// ============================================================================

/// `pagure.pull-request.comment.added` topic.
///
/// The payload carries the whole comment list; the freshly added one is the
/// last entry. The `agent` is the commenting account, filtered against the
/// service's own accounts.
pub(crate) fn pull_request_comment(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let actor = payload.get("agent")?.as_str()?;
    if config.is_bot_account(actor) {
        debug!(actor, "ignoring our own pull request comment");
        return None;
    }

    let pull_request = payload.get("pullrequest")?;
    let comment = pull_request.get("comments")?.as_array()?.last()?;

    Some(Event::PullRequestComment(PullRequestCommentEvent {
        forge: Forge::Pagure,
        action: CommentAction::Created,
        pr_id: nested_u64(pull_request, &["id"])?,
        base_repo_namespace: nested_str(pull_request, &["project", "namespace"])
            .map(str::to_string),
        base_repo_name: nested_str(pull_request, &["project", "name"]).map(str::to_string),
        base_repo_owner: nested_str(pull_request, &["project", "user", "name"])
            .map(str::to_string),
        target_repo_namespace: nested_str(pull_request, &["project", "namespace"])
            .map(str::to_string),
        target_repo_name: nested_str(pull_request, &["project", "name"]).map(str::to_string),
        project_url: nested_str(pull_request, &["project", "full_url"])?.to_string(),
        actor: actor.to_string(),
        comment: comment.get("comment")?.as_str()?.to_string(),
        comment_id: comment.get("id")?.as_u64()?,
        commit_sha: pull_request
            .get("commit_stop")
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "pagure_tests.rs"]
mod tests;
