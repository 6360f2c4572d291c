//! # Project-Event Binder
//!
//! Boundary to the persistence collaborator that stores the durable
//! "project event" records correlating all notifications about one
//! reviewable unit (pull request, branch, release) on one project.
//!
//! Classification stays free of I/O; binding a normalized event to its
//! project event is an explicit second phase so the concurrency and failure
//! model of each phase is visible at the call site. Idempotent get-or-create
//! semantics per `(project, trigger kind, trigger object)` tuple are the
//! store's responsibility, not this layer's.

use crate::events::Event;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Core Types
// ============================================================================

/// Trigger kind of a project event; drives job-config selection downstream
/// and check-name disambiguation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    PullRequest,
    Commit,
    Release,
}

/// The reviewable unit a project event points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProjectEventObject {
    PullRequest { pr_id: u64 },
    Branch { name: String },
    Release { tag_name: String },
}

impl ProjectEventObject {
    /// Trigger kind implied by the object type.
    pub fn trigger_kind(&self) -> TriggerKind {
        match self {
            Self::PullRequest { .. } => TriggerKind::PullRequest,
            Self::Branch { .. } => TriggerKind::Commit,
            Self::Release { .. } => TriggerKind::Release,
        }
    }
}

/// Forge project coordinates under which project events are keyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub namespace: String,
    pub repo_name: String,
    pub project_url: String,
}

impl ProjectRef {
    pub fn new(
        namespace: impl Into<String>,
        repo_name: impl Into<String>,
        project_url: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            repo_name: repo_name.into(),
            project_url: project_url.into(),
        }
    }
}

/// One persisted project-event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEvent {
    pub id: i64,
    pub project: ProjectRef,
    pub object: ProjectEventObject,
    pub commit_sha: Option<String>,
}

impl ProjectEvent {
    /// Trigger kind of this record.
    pub fn trigger_kind(&self) -> TriggerKind {
        self.object.trigger_kind()
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for project-event store operations.
///
/// All store failures are retryable from the classifier's point of view:
/// the payload *was* recognized, only the system's own state is momentarily
/// unavailable.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store operation failed: {message}")]
    OperationFailed { message: String },

    #[error("store not available: {message}")]
    Unavailable { message: String },
}

// ============================================================================
// Store Trait
// ============================================================================

/// Interface to the persistence collaborator.
///
/// Reads and get-or-creates are blocking calls from the caller's point of
/// view; timeouts and retries belong to the caller, and implementations must
/// surface failures rather than retry silently.
#[async_trait]
pub trait ProjectEventStore: Send + Sync {
    /// Look up a project event by its numeric id (check-run external id).
    async fn get_by_id(&self, id: i64) -> Result<Option<ProjectEvent>, StoreError>;

    /// Look up the project event a test/build pipeline belongs to.
    async fn get_by_pipeline_id(
        &self,
        pipeline_id: &str,
    ) -> Result<Option<ProjectEvent>, StoreError>;

    /// Resolve or create the project event for a pull request.
    async fn get_or_create_pull_request(
        &self,
        project: &ProjectRef,
        pr_id: u64,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError>;

    /// Resolve or create the project event for a branch push.
    async fn get_or_create_branch(
        &self,
        project: &ProjectRef,
        branch: &str,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError>;

    /// Resolve or create the project event for a release.
    async fn get_or_create_release(
        &self,
        project: &ProjectRef,
        tag_name: &str,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError>;
}

// ============================================================================
// Binder
// ============================================================================

/// A normalized event together with its resolved project event, when the
/// variant is tied to a reviewable unit.
#[derive(Debug, Clone)]
pub struct BoundEvent {
    pub event: Event,
    pub project_event: Option<ProjectEvent>,
}

/// Resolves or lazily creates the project event for a normalized event.
pub struct EventBinder {
    store: Arc<dyn ProjectEventStore>,
}

impl EventBinder {
    pub fn new(store: Arc<dyn ProjectEventStore>) -> Self {
        Self { store }
    }

    /// Bind the event to its durable project event.
    ///
    /// Variants not tied to a reviewable unit pass through with
    /// `project_event: None`. Store failures propagate; they are distinct
    /// from "unrecognized" because the caller's retry policy differs.
    pub async fn bind(&self, event: Event) -> Result<BoundEvent, StoreError> {
        let project_event = match &event {
            Event::PullRequest(e) => {
                let project = ProjectRef::new(
                    e.target_repo_namespace
                        .as_deref()
                        .unwrap_or(&e.base_repo_namespace),
                    e.target_repo_name.as_deref().unwrap_or(&e.base_repo_name),
                    &e.project_url,
                );
                Some(
                    self.store
                        .get_or_create_pull_request(&project, e.pr_id, Some(&e.commit_sha))
                        .await?,
                )
            }
            Event::MergeRequest(e) => {
                let project = ProjectRef::new(
                    &e.target_repo_namespace,
                    &e.target_repo_name,
                    &e.project_url,
                );
                Some(
                    self.store
                        .get_or_create_pull_request(&project, e.object_iid, e.commit_sha.as_deref())
                        .await?,
                )
            }
            Event::Push(e) => {
                let project = ProjectRef::new(&e.namespace, &e.repo_name, &e.project_url);
                Some(
                    self.store
                        .get_or_create_branch(&project, &e.git_ref, Some(&e.commit_sha))
                        .await?,
                )
            }
            Event::TagPush(e) => {
                let project = ProjectRef::new(&e.namespace, &e.repo_name, &e.project_url);
                Some(
                    self.store
                        .get_or_create_branch(&project, &e.git_ref, Some(&e.commit_sha))
                        .await?,
                )
            }
            Event::Release(e) => {
                let project = ProjectRef::new(&e.namespace, &e.repo_name, &e.project_url);
                Some(
                    self.store
                        .get_or_create_release(&project, &e.tag_name, e.commit_sha.as_deref())
                        .await?,
                )
            }
            Event::VersionUpdate(e) => {
                // Dist-git coordinates derive from the package name; the
                // feed supplies nothing else.
                let project = ProjectRef::new("rpms", &e.package_name, &e.distgit_project_url);
                Some(
                    self.store
                        .get_or_create_release(&project, &e.version, None)
                        .await?,
                )
            }
            Event::CheckRerun(e) => self.store.get_by_id(e.project_event_id).await?,
            Event::TestingFarmResults(e) => {
                self.store.get_by_pipeline_id(&e.pipeline_id).await?
            }
            _ => None,
        };

        if let Some(pe) = &project_event {
            info!(
                kind = event.kind(),
                project_event_id = pe.id,
                trigger = ?pe.trigger_kind(),
                "bound event to project event"
            );
        } else {
            debug!(kind = event.kind(), "event has no project event to bind");
        }

        Ok(BoundEvent {
            event,
            project_event,
        })
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory [`ProjectEventStore`] for tests and local runs.
///
/// Get-or-create is keyed on `(project url, trigger kind, trigger object)`
/// and hands out sequential ids.
#[derive(Default)]
pub struct InMemoryProjectEventStore {
    state: std::sync::Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    next_id: i64,
    events: Vec<ProjectEvent>,
    pipelines: HashMap<String, i64>,
}

impl InMemoryProjectEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a project event, returning its id.
    pub fn insert(&self, project: ProjectRef, object: ProjectEventObject) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.events.push(ProjectEvent {
            id,
            project,
            object,
            commit_sha: None,
        });
        id
    }

    /// Associate a pipeline id with an existing project event.
    pub fn link_pipeline(&self, pipeline_id: &str, project_event_id: i64) {
        let mut state = self.state.lock().unwrap();
        state
            .pipelines
            .insert(pipeline_id.to_string(), project_event_id);
    }

    fn get_or_create(
        &self,
        project: &ProjectRef,
        object: ProjectEventObject,
        commit_sha: Option<&str>,
    ) -> ProjectEvent {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .events
            .iter()
            .find(|e| e.project == *project && e.object == object)
        {
            return existing.clone();
        }
        state.next_id += 1;
        let event = ProjectEvent {
            id: state.next_id,
            project: project.clone(),
            object,
            commit_sha: commit_sha.map(str::to_string),
        };
        state.events.push(event.clone());
        event
    }
}

#[async_trait]
impl ProjectEventStore for InMemoryProjectEventStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<ProjectEvent>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.events.iter().find(|e| e.id == id).cloned())
    }

    async fn get_by_pipeline_id(
        &self,
        pipeline_id: &str,
    ) -> Result<Option<ProjectEvent>, StoreError> {
        let state = self.state.lock().unwrap();
        let id = match state.pipelines.get(pipeline_id) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(state.events.iter().find(|e| e.id == id).cloned())
    }

    async fn get_or_create_pull_request(
        &self,
        project: &ProjectRef,
        pr_id: u64,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError> {
        Ok(self.get_or_create(project, ProjectEventObject::PullRequest { pr_id }, commit_sha))
    }

    async fn get_or_create_branch(
        &self,
        project: &ProjectRef,
        branch: &str,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError> {
        Ok(self.get_or_create(
            project,
            ProjectEventObject::Branch {
                name: branch.to_string(),
            },
            commit_sha,
        ))
    }

    async fn get_or_create_release(
        &self,
        project: &ProjectRef,
        tag_name: &str,
        commit_sha: Option<&str>,
    ) -> Result<ProjectEvent, StoreError> {
        Ok(self.get_or_create(
            project,
            ProjectEventObject::Release {
                tag_name: tag_name.to_string(),
            },
            commit_sha,
        ))
    }
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
