//! # GitHub Extraction
//!
//! Webhook payload extraction for GitHub App deliveries. Wire kinds are
//! routed here by the `X-GitHub-Event` header value; each function handles
//! one wire kind and declines anything it does not fully recognize.

use super::{nested, nested_str, nested_u64};
use crate::binder::ProjectEventObject;
use crate::check_name::parse_check_name;
use crate::config::ServiceConfig;
use crate::dispatch::ClassifyError;
use crate::events::{
    CheckRerunEvent, CheckRerunTarget, CommentAction, Event, InstallationEvent,
    IssueCommentEvent, PullRequestAction, PullRequestCommentEvent, PullRequestEvent, PushEvent,
    ReleaseEvent,
};
use crate::{binder::ProjectEventStore, Forge};
use chrono::Utc;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// Pull requests
// ============================================================================

/// `pull_request` wire kind.
///
/// Only the actions that change which code is under review are interesting;
/// labeling, assignment and review actions decline.
pub(crate) fn pull_request(payload: &Value) -> Option<Event> {
    let action = payload.get("action")?.as_str()?;
    let action = match PullRequestAction::from_str(action) {
        Ok(action) => action,
        Err(_) => {
            debug!(action, "ignoring pull_request action");
            return None;
        }
    };

    let pr_id = nested_u64(payload, &["number"])?;
    let head_login = nested_str(payload, &["pull_request", "head", "repo", "owner", "login"])?;
    let head_name = nested_str(payload, &["pull_request", "head", "repo", "name"])?;
    let base_ref = nested_str(payload, &["pull_request", "head", "ref"])?;
    let commit_sha = nested_str(payload, &["pull_request", "head", "sha"])?;
    let project_url = nested_str(payload, &["repository", "html_url"])?;
    let actor = nested_str(payload, &["sender", "login"])?;

    Some(Event::PullRequest(PullRequestEvent {
        action,
        pr_id,
        base_repo_namespace: head_login.to_string(),
        base_repo_name: head_name.to_string(),
        base_ref: base_ref.to_string(),
        target_repo_namespace: nested_str(payload, &["pull_request", "base", "repo", "owner", "login"])
            .map(str::to_string),
        target_repo_name: nested_str(payload, &["pull_request", "base", "repo", "name"])
            .map(str::to_string),
        project_url: project_url.to_string(),
        commit_sha: commit_sha.to_string(),
        actor: actor.to_string(),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Comments
// ============================================================================

/// `issue_comment` wire kind, for comments on pull requests.
///
/// GitHub models PR conversation comments as issue comments; the
/// `issue.pull_request` key is what tells them apart. Comments authored by
/// the service's own accounts decline to keep it from answering itself.
pub(crate) fn pull_request_comment(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    if nested(payload, &["issue", "pull_request"]).is_none() {
        return None;
    }
    let action = comment_action(payload)?;

    let actor = nested_str(payload, &["comment", "user", "login"])?;
    if config.is_bot_account(actor) {
        debug!(actor, "ignoring our own pull request comment");
        return None;
    }

    let pr_id = nested_u64(payload, &["issue", "number"])?;
    let namespace = nested_str(payload, &["repository", "owner", "login"])?;
    let repo_name = nested_str(payload, &["repository", "name"])?;
    let project_url = nested_str(payload, &["repository", "html_url"])?;
    let comment = nested_str(payload, &["comment", "body"])?;
    let comment_id = nested_u64(payload, &["comment", "id"])?;

    Some(Event::PullRequestComment(PullRequestCommentEvent {
        forge: Forge::GitHub,
        action,
        pr_id,
        base_repo_namespace: Some(namespace.to_string()),
        base_repo_name: Some(repo_name.to_string()),
        base_repo_owner: None,
        target_repo_namespace: Some(namespace.to_string()),
        target_repo_name: Some(repo_name.to_string()),
        project_url: project_url.to_string(),
        actor: actor.to_string(),
        comment: comment.to_string(),
        comment_id,
        // The payload does not name the PR head; a later enrichment step
        // resolves it via the forge API.
        commit_sha: None,
        created_at: Utc::now(),
    }))
}

/// `issue_comment` wire kind, for comments on plain issues.
pub(crate) fn issue_comment(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    if nested(payload, &["issue", "pull_request"]).is_some() {
        return None;
    }
    let action = comment_action(payload)?;

    let actor = nested_str(payload, &["comment", "user", "login"])?;
    if config.is_bot_account(actor) {
        debug!(actor, "ignoring our own issue comment");
        return None;
    }

    Some(Event::IssueComment(IssueCommentEvent {
        forge: Forge::GitHub,
        action,
        issue_id: nested_u64(payload, &["issue", "number"])?,
        repo_namespace: nested_str(payload, &["repository", "owner", "login"])?.to_string(),
        repo_name: nested_str(payload, &["repository", "name"])?.to_string(),
        project_url: nested_str(payload, &["repository", "html_url"])?.to_string(),
        actor: actor.to_string(),
        comment: nested_str(payload, &["comment", "body"])?.to_string(),
        comment_id: nested_u64(payload, &["comment", "id"])?,
        created_at: Utc::now(),
    }))
}

fn comment_action(payload: &Value) -> Option<CommentAction> {
    let action = payload.get("action")?.as_str()?;
    match CommentAction::from_str(action) {
        Ok(action) => Some(action),
        Err(_) => {
            debug!(action, "ignoring comment action");
            None
        }
    }
}

// ============================================================================
// Releases and pushes
// ============================================================================

/// `release` wire kind. Only `published` is interesting; draft edits and
/// deletions decline.
pub(crate) fn release(payload: &Value) -> Option<Event> {
    let action = payload.get("action")?.as_str()?;
    if action != "published" {
        debug!(action, "ignoring release action");
        return None;
    }

    Some(Event::Release(ReleaseEvent {
        forge: Forge::GitHub,
        namespace: nested_str(payload, &["repository", "owner", "login"])?.to_string(),
        repo_name: nested_str(payload, &["repository", "name"])?.to_string(),
        tag_name: nested_str(payload, &["release", "tag_name"])?.to_string(),
        project_url: nested_str(payload, &["repository", "html_url"])?.to_string(),
        commit_sha: None,
        created_at: Utc::now(),
    }))
}

/// `push` wire kind. Branch deletions decline; there is no code left to act
/// on.
pub(crate) fn push(payload: &Value) -> Option<Event> {
    if payload.get("deleted").and_then(Value::as_bool) == Some(true) {
        debug!("ignoring push deleting a ref");
        return None;
    }

    let raw_ref = payload.get("ref")?.as_str()?;
    let git_ref = super::short_ref(raw_ref);

    let commit_sha = nested_str(payload, &["head_commit", "id"])
        .or_else(|| payload.get("after").and_then(Value::as_str))?;

    Some(Event::Push(PushEvent {
        forge: Forge::GitHub,
        namespace: nested_str(payload, &["repository", "owner", "login"])?.to_string(),
        repo_name: nested_str(payload, &["repository", "name"])?.to_string(),
        git_ref: git_ref.to_string(),
        commit_sha: commit_sha.to_string(),
        project_url: nested_str(payload, &["repository", "html_url"])?.to_string(),
        actor: nested_str(payload, &["pusher", "name"]).map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Check reruns
// ============================================================================

/// `check_run` wire kind.
///
/// Only re-run requests against this deployment's own check runs are
/// interesting. The check run's `external_id` is the project-event id the
/// original check was posted under; a missing record is a transient failure,
/// not a decline, because the payload itself was recognized.
pub(crate) async fn check_rerun(
    payload: &Value,
    config: &ServiceConfig,
    store: &dyn ProjectEventStore,
) -> Result<Option<Event>, ClassifyError> {
    let action = payload.get("action").and_then(Value::as_str);
    if action != Some("rerequested") {
        return Ok(None);
    }

    let app_slug = match nested_str(payload, &["check_run", "app", "slug"]) {
        Some(slug) => slug,
        None => return Ok(None),
    };
    if app_slug != config.own_app_slug() {
        debug!(app_slug, "ignoring check run owned by another app");
        return Ok(None);
    }

    let project_event_id = match nested_str(payload, &["check_run", "external_id"])
        .and_then(|id| id.parse::<i64>().ok())
    {
        Some(id) => id,
        None => {
            warn!("check run without a usable external id");
            return Ok(None);
        }
    };

    let project_event = store
        .get_by_id(project_event_id)
        .await?
        .ok_or(ClassifyError::ProjectEventNotFound {
            id: project_event_id,
        })?;

    let check_name = match nested_str(payload, &["check_run", "name"]) {
        Some(name) => name,
        None => return Ok(None),
    };
    let parsed = match parse_check_name(check_name, project_event.trigger_kind()) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!(check_name, %error, "check name does not follow the grammar");
            return Ok(None);
        }
    };

    let rerun_target = match project_event.object {
        ProjectEventObject::PullRequest { pr_id } => CheckRerunTarget::PullRequest { pr_id },
        ProjectEventObject::Branch { name } => CheckRerunTarget::Commit { branch: name },
        ProjectEventObject::Release { tag_name } => CheckRerunTarget::Release { tag_name },
    };

    let event = CheckRerunEvent {
        namespace: match nested_str(payload, &["repository", "owner", "login"]) {
            Some(s) => s.to_string(),
            None => return Ok(None),
        },
        repo_name: match nested_str(payload, &["repository", "name"]) {
            Some(s) => s.to_string(),
            None => return Ok(None),
        },
        project_url: match nested_str(payload, &["repository", "html_url"]) {
            Some(s) => s.to_string(),
            None => return Ok(None),
        },
        commit_sha: match nested_str(payload, &["check_run", "head_sha"]) {
            Some(s) => s.to_string(),
            None => return Ok(None),
        },
        actor: nested_str(payload, &["sender", "login"]).map(str::to_string),
        job: parsed.job,
        target: parsed.target,
        job_identifier: parsed.identifier,
        project_event_id,
        rerun_target,
        created_at: Utc::now(),
    };

    Ok(Some(Event::CheckRerun(event)))
}

// ============================================================================
// Installations
// ============================================================================

/// `installation` wire kind. Only fresh installations are interesting.
pub(crate) fn installation(payload: &Value) -> Option<Event> {
    let action = payload.get("action")?.as_str()?;
    if action != "created" {
        debug!(action, "ignoring installation action");
        return None;
    }

    let repositories = payload
        .get("repositories")
        .and_then(Value::as_array)
        .map(|repos| {
            repos
                .iter()
                .filter_map(|r| r.get("full_name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Event::Installation(InstallationEvent {
        installation_id: nested_u64(payload, &["installation", "id"])?,
        account_login: nested_str(payload, &["installation", "account", "login"])?.to_string(),
        account_id: nested_u64(payload, &["installation", "account", "id"])?,
        account_url: nested_str(payload, &["installation", "account", "html_url"])?.to_string(),
        account_type: nested_str(payload, &["installation", "account", "type"])?.to_string(),
        repositories,
        sender_id: nested_u64(payload, &["sender", "id"])?,
        sender_login: nested_str(payload, &["sender", "login"])?.to_string(),
        created_at: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;
