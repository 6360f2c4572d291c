//! # Result-Stream Extraction
//!
//! Extraction for build, test, and update notifications: Copr and Koji
//! messages from the fedora-messaging bus, Testing Farm result callbacks,
//! and the new-hotness release-monitoring feed.

use super::{namespace_and_repo, nested, nested_str};
use crate::config::ServiceConfig;
use crate::dispatch::{ClassifyError, TestingFarmClient};
use crate::events::{
    CoprBuildEvent, CoprBuildPhase, Event, KojiBuildEvent, KojiBuildState, KojiTaskEvent,
    KojiTaskState, OpenScanHubTaskEvent, ScanPhase, ScanStatus, TestingFarmResultsEvent,
    VersionUpdateEvent,
};
use chrono::Utc;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// Copr
// ============================================================================

/// `copr.build.start` / `copr.build.end` topics.
///
/// One message per chroot. The status code is only present on the end
/// message.
pub(crate) fn copr_build(payload: &Value, phase: CoprBuildPhase) -> Option<Event> {
    Some(Event::CoprBuild(CoprBuildEvent {
        phase,
        build_id: payload.get("build")?.as_u64()?,
        chroot: payload.get("chroot")?.as_str()?.to_string(),
        status: payload.get("status").and_then(Value::as_u64),
        owner: payload.get("owner")?.as_str()?.to_string(),
        project_name: payload.get("copr")?.as_str()?.to_string(),
        pkg: payload.get("pkg").and_then(Value::as_str).map(str::to_string),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Koji
// ============================================================================

/// `buildsys.task.state.change` topic: a scratch-build task moved.
///
/// Only `build` tasks are interesting; `newRepo`, `tagBuild` and the rest
/// decline. The per-architecture `buildArch` child carries the logs, so its
/// id rides along when present.
pub(crate) fn koji_task(payload: &Value) -> Option<Event> {
    let method = payload.get("method").and_then(Value::as_str);
    if method != Some("build") {
        debug!(?method, "ignoring koji task method");
        return None;
    }

    let state = KojiTaskState::from_str(payload.get("new")?.as_str()?).ok()?;
    let old_state = payload
        .get("old")
        .and_then(Value::as_str)
        .and_then(|s| KojiTaskState::from_str(s).ok());

    let rpm_build_task_id = nested(payload, &["info", "children"])
        .and_then(Value::as_array)
        .and_then(|children| {
            children
                .iter()
                .find(|c| c.get("method").and_then(Value::as_str) == Some("buildArch"))
        })
        .and_then(|c| c.get("id"))
        .and_then(Value::as_u64);

    Some(Event::KojiTask(KojiTaskEvent {
        task_id: payload.get("id")?.as_u64()?,
        state,
        old_state,
        start_time: nested_str(payload, &["info", "start_time"]).map(str::to_string),
        completion_time: nested_str(payload, &["info", "completion_time"]).map(str::to_string),
        rpm_build_task_id,
        created_at: Utc::now(),
    }))
}

/// `buildsys.build.state.change` topic: a production build moved.
///
/// The source repository is recovered from the task request triple
/// `[source, target, options]`: the source is a `git+...#commit` URL, and
/// the build target maps to the dist-git branch by dropping the
/// `-candidate` suffix.
pub(crate) fn koji_build(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let state = KojiBuildState::from_number(payload.get("new")?.as_u64()?)?;
    let old_state = payload
        .get("old")
        .and_then(Value::as_u64)
        .and_then(KojiBuildState::from_number);

    let request = payload.get("request")?.as_array()?;
    let source = request.first()?.as_str()?;
    let target = request.get(1)?.as_str()?;

    let source = source.strip_prefix("git+").unwrap_or(source);
    let (repo_url, commit_sha) = match source.split_once('#') {
        Some((url, sha)) => (url, sha),
        None => {
            warn!(source, "koji build request source carries no commit");
            return None;
        }
    };
    let project_url = repo_url.strip_suffix(".git").unwrap_or(repo_url);
    let (namespace, repo_name) = namespace_and_repo(project_url)?;

    let build_id = payload.get("build_id")?.as_u64()?;
    let branch_name = target.strip_suffix("-candidate").unwrap_or(target);

    Some(Event::KojiBuild(KojiBuildEvent {
        build_id,
        state,
        old_state,
        package_name: payload.get("name")?.as_str()?.to_string(),
        branch_name: branch_name.to_string(),
        commit_sha: commit_sha.to_string(),
        namespace,
        repo_name,
        project_url: project_url.to_string(),
        epoch: payload
            .get("epoch")
            .and_then(Value::as_u64)
            .map(|e| e.to_string()),
        version: payload
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string),
        release: payload
            .get("release")
            .and_then(Value::as_str)
            .map(str::to_string),
        rpm_build_task_id: payload.get("task_id").and_then(Value::as_u64),
        web_url: format!("{}/buildinfo?buildID={}", config.koji_web_url, build_id),
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Testing Farm
// ============================================================================

/// Testing Farm result callback.
///
/// The callback body carries only the request id; everything else comes
/// from the Testing Farm API. A failed detail fetch is a transient error,
/// not a decline: the callback itself was recognized.
pub(crate) async fn testing_farm_results(
    payload: &Value,
    client: &dyn TestingFarmClient,
) -> Result<Option<Event>, ClassifyError> {
    if payload.get("source").and_then(Value::as_str) != Some("testing-farm") {
        return Ok(None);
    }
    let request_id = match payload.get("request_id").and_then(Value::as_str) {
        Some(id) => id,
        None => return Ok(None),
    };

    let details = client.request_details(request_id).await.map_err(|source| {
        ClassifyError::ResultDetail {
            request_id: request_id.to_string(),
            source,
        }
    })?;

    Ok(Some(Event::TestingFarmResults(TestingFarmResultsEvent {
        pipeline_id: request_id.to_string(),
        result: details.result,
        compose: details.compose,
        summary: details.summary,
        log_url: details.log_url,
        copr_build_id: details.copr_build_id,
        copr_chroot: details.copr_chroot,
        commit_sha: details.commit_sha,
        project_url: details.project_url,
        identifier: details.identifier,
        created_at: Utc::now(),
    })))
}

// ============================================================================
// OpenScanHub
// ============================================================================

/// `openscanhub.task.started` topic: a static-analysis scan was picked up.
pub(crate) fn open_scan_hub_task_started(payload: &Value) -> Option<Event> {
    Some(Event::OpenScanHubTask(OpenScanHubTaskEvent {
        task_id: payload.get("task_id")?.as_u64()?,
        phase: ScanPhase::Started,
        created_at: Utc::now(),
    }))
}

/// `openscanhub.task.finished` topic: a scan completed with the result
/// report URLs. An out-of-vocabulary status declines the payload.
pub(crate) fn open_scan_hub_task_finished(payload: &Value) -> Option<Event> {
    let raw_status = payload.get("status")?.as_str()?;
    let status = match ScanStatus::from_str(raw_status) {
        Ok(status) => status,
        Err(_) => {
            warn!(status = raw_status, "unknown scan status");
            return None;
        }
    };

    Some(Event::OpenScanHubTask(OpenScanHubTaskEvent {
        task_id: payload.get("task_id")?.as_u64()?,
        phase: ScanPhase::Finished {
            status,
            issues_added_url: payload.get("issues_added_url")?.as_str()?.to_string(),
            issues_fixed_url: payload.get("issues_fixed_url")?.as_str()?.to_string(),
            scan_results_url: payload.get("scan_results_url")?.as_str()?.to_string(),
        },
        created_at: Utc::now(),
    }))
}

// ============================================================================
// Release monitoring
// ============================================================================

/// `hotness.update.bug.file` topic: release monitoring noticed a new
/// upstream version and filed a bug for it.
pub(crate) fn version_update(payload: &Value, config: &ServiceConfig) -> Option<Event> {
    let package_name = payload.get("package")?.as_str()?;
    let version = nested_str(payload, &["trigger", "msg", "project", "version"])?;

    Some(Event::VersionUpdate(VersionUpdateEvent {
        package_name: package_name.to_string(),
        version: version.to_string(),
        distgit_project_url: format!("{}rpms/{}", config.distgit_base_url, package_name),
        created_at: Utc::now(),
    }))
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
