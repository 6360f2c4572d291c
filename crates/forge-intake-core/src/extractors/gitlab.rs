//! # GitLab Extraction
//!
//! Webhook payload extraction for GitLab system hooks. Wire kinds are
//! routed here by the `X-Gitlab-Event` header value; within a hook the
//! `object_kind` / `object_attributes` shape drives extraction.

use super::{namespace_and_repo, nested, nested_str, nested_u64, short_ref};
use crate::config::ServiceConfig;
use crate::events::{
    CommentAction, Event, GitlabAction, IssueCommentEvent, MergeRequestEvent, PipelineEvent,
    PullRequestCommentEvent, PushEvent, ReleaseEvent, TagPushEvent,
};
use crate::Forge;
use chrono::Utc;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

// ============================================================================
// Pushes
// ============================================================================

struct CommonPush {
    namespace: String,
    repo_name: String,
    git_ref: String,
    commit_sha: String,
    project_url: String,
    actor: Option<String>,
}

/// Fields shared by `Push Hook` and `Tag Push Hook` payloads.
///
/// A ref deletion arrives as a push whose `after` is the all-zeros sha;
/// those decline. The head commit is the one whose id equals
/// `checkout_sha`, which is not necessarily the last entry of `commits`.
fn common_push(payload: &Value) -> Option<CommonPush> {
    let after = payload.get("after")?.as_str()?;
    if after == ZERO_SHA {
        debug!("ignoring push deleting a ref");
        return None;
    }

    let project_url = nested_str(payload, &["project", "web_url"])?;
    let (namespace, repo_name) = namespace_and_repo(project_url)?;
    let raw_ref = payload.get("ref")?.as_str()?;
    let commit_sha = payload
        .get("checkout_sha")
        .and_then(Value::as_str)
        .unwrap_or(after);

    Some(CommonPush {
        namespace,
        repo_name,
        git_ref: short_ref(raw_ref).to_string(),
        commit_sha: commit_sha.to_string(),
        project_url: project_url.to_string(),
        actor: payload
            .get("user_username")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Head commit entry, selected by `checkout_sha`.
fn head_commit<'a>(payload: &'a Value, sha: &str) -> Option<&'a Value> {
    payload
        .get("commits")?
        .as_array()?
        .iter()
        .find(|c| c.get("id").and_then(Value::as_str) == Some(sha))
}

/// `Push Hook` wire kind.
pub(crate) fn push(payload: &Value) -> Option<Event> {
    let common = common_push(payload)?;
    Some(Event::Push(PushEvent {
        forge: Forge::GitLab,
        namespace: common.namespace,
        repo_name: common.repo_name,
        git_ref: common.git_ref,
        commit_sha: common.commit_sha,
        project_url: common.project_url,
        actor: common.actor,
        created_at: Utc::now(),
    }))
}

/// `Tag Push Hook` wire kind.
pub(crate) fn tag_push(payload: &Value) -> Option<Event> {
    let common = common_push(payload)?;
    let head = head_commit(payload, &common.commit_sha);

    Some(Event::TagPush(TagPushEvent {
        forge: Forge::GitLab,
        namespace: common.namespace,
        repo_name: common.repo_name,
        git_ref: common.git_ref,
        commit_sha: common.commit_sha,
        project_url: common.project_url,
        actor: common.actor,
        title: head
            .and_then(|c| c.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string),
        message: head
            .and_then(|c| c.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Merge requests
// ============================================================================

/// `Merge Request Hook` wire kind.
///
/// GitLab's `action` field is unreliable for open/close transitions, so the
/// MR `state` substitutes whenever the action is not one of the two values
/// that only the action field can express.
pub(crate) fn merge_request(payload: &Value) -> Option<Event> {
    let attrs = payload.get("object_attributes")?;

    let raw_action = attrs.get("action").and_then(Value::as_str).unwrap_or("");
    let effective = match raw_action {
        "reopen" | "update" => raw_action,
        _ => attrs.get("state")?.as_str()?,
    };
    let action = match GitlabAction::from_str(effective) {
        Ok(action) => action,
        Err(_) => {
            debug!(action = effective, "ignoring merge request action");
            return None;
        }
    };

    let source_url = nested_str(attrs, &["source", "web_url"])?;
    let (source_namespace, source_name) = namespace_and_repo(source_url)?;
    let target_url = nested_str(attrs, &["target", "web_url"])?;
    let (target_namespace, target_name) = namespace_and_repo(target_url)?;

    Some(Event::MergeRequest(MergeRequestEvent {
        action,
        actor: nested_str(payload, &["user", "username"])?.to_string(),
        object_id: nested_u64(attrs, &["id"])?,
        object_iid: nested_u64(attrs, &["iid"])?,
        source_repo_namespace: source_namespace,
        source_repo_name: source_name,
        source_repo_branch: attrs
            .get("source_branch")
            .and_then(Value::as_str)
            .map(str::to_string),
        source_project_url: source_url.to_string(),
        target_repo_namespace: target_namespace,
        target_repo_name: target_name,
        target_repo_branch: attrs
            .get("target_branch")
            .and_then(Value::as_str)
            .map(str::to_string),
        project_url: target_url.to_string(),
        commit_sha: nested_str(attrs, &["last_commit", "id"]).map(str::to_string),
        oldrev: attrs
            .get("oldrev")
            .and_then(Value::as_str)
            .map(str::to_string),
        title: attrs
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        description: attrs
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        url: attrs.get("url").and_then(Value::as_str).map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Notes
// ============================================================================

/// `Note Hook` wire kind, for comments on merge requests.
///
/// Note hooks only fire when a note is created, so the normalized action is
/// always `created`. Comments on merged or closed MRs decline; there is
/// nothing left to run against them.
pub(crate) fn merge_request_comment(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let merge_request = payload.get("merge_request")?;
    if merge_request.get("state").and_then(Value::as_str) != Some("opened") {
        debug!("ignoring note on a merge request that is not open");
        return None;
    }

    let actor = nested_str(payload, &["user", "username"])?;
    if config.is_bot_account(actor) {
        debug!(actor, "ignoring our own merge request note");
        return None;
    }

    let project_url = nested_str(payload, &["project", "web_url"])?;
    let (namespace, repo_name) = namespace_and_repo(project_url)?;
    let commit_sha = nested_str(merge_request, &["last_commit", "id"])?;

    Some(Event::PullRequestComment(PullRequestCommentEvent {
        forge: Forge::GitLab,
        action: CommentAction::Created,
        pr_id: nested_u64(merge_request, &["iid"])?,
        base_repo_namespace: Some(namespace.clone()),
        base_repo_name: Some(repo_name.clone()),
        base_repo_owner: None,
        target_repo_namespace: Some(namespace),
        target_repo_name: Some(repo_name),
        project_url: project_url.to_string(),
        actor: actor.to_string(),
        comment: nested_str(payload, &["object_attributes", "note"])?.to_string(),
        comment_id: nested_u64(payload, &["object_attributes", "id"])?,
        commit_sha: Some(commit_sha.to_string()),
        created_at: Utc::now(),
    }))
}

/// `Note Hook` wire kind, for comments on issues.
pub(crate) fn issue_comment(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let issue = payload.get("issue")?;
    if nested(payload, &["merge_request"]).is_some() {
        return None;
    }
    if issue.get("state").and_then(Value::as_str) != Some("opened") {
        debug!("ignoring note on an issue that is not open");
        return None;
    }

    let actor = nested_str(payload, &["user", "username"])?;
    if config.is_bot_account(actor) {
        debug!(actor, "ignoring our own issue note");
        return None;
    }

    let project_url = nested_str(payload, &["project", "web_url"])?;
    let (namespace, repo_name) = namespace_and_repo(project_url)?;

    Some(Event::IssueComment(IssueCommentEvent {
        forge: Forge::GitLab,
        action: CommentAction::Created,
        issue_id: nested_u64(issue, &["iid"])?,
        repo_namespace: namespace,
        repo_name,
        project_url: project_url.to_string(),
        actor: actor.to_string(),
        comment: nested_str(payload, &["object_attributes", "note"])?.to_string(),
        comment_id: nested_u64(payload, &["object_attributes", "id"])?,
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Pipelines and releases
// ============================================================================

/// `Pipeline Hook` wire kind.
///
/// `merge_request` is null for branch pipelines; that is a valid shape, not
/// a decline.
pub(crate) fn pipeline(payload: &Value) -> Option<Event> {
    let attrs = payload.get("object_attributes")?;

    Some(Event::Pipeline(PipelineEvent {
        project_url: nested_str(payload, &["project", "web_url"])?.to_string(),
        project_name: nested_str(payload, &["project", "path_with_namespace"])
            .map(str::to_string),
        pipeline_id: nested_u64(attrs, &["id"])?,
        git_ref: attrs.get("ref")?.as_str()?.to_string(),
        status: attrs.get("status")?.as_str()?.to_string(),
        detailed_status: attrs
            .get("detailed_status")
            .and_then(Value::as_str)
            .map(str::to_string),
        commit_sha: attrs.get("sha")?.as_str()?.to_string(),
        source: attrs
            .get("source")
            .and_then(Value::as_str)
            .map(str::to_string),
        merge_request_url: nested_str(payload, &["merge_request", "url"]).map(str::to_string),
        created_at: Utc::now(),
    }))
}

/// `Release Hook` wire kind. Only freshly created releases are interesting.
pub(crate) fn release(payload: &Value) -> Option<Event> {
    let action = payload.get("action")?.as_str()?;
    if action != "create" {
        debug!(action, "ignoring release action");
        return None;
    }

    let project_url = nested_str(payload, &["project", "web_url"])?;
    let (namespace, repo_name) = namespace_and_repo(project_url)?;

    Some(Event::Release(ReleaseEvent {
        forge: Forge::GitLab,
        namespace,
        repo_name,
        tag_name: payload.get("tag")?.as_str()?.to_string(),
        project_url: project_url.to_string(),
        commit_sha: nested_str(payload, &["commit", "id"]).map(str::to_string),
        created_at: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "gitlab_tests.rs"]
mod tests;
