//! Tests for project-event binding.

use super::*;
use crate::events::{
    CheckRerunEvent, CheckRerunTarget, CoprBuildEvent, CoprBuildPhase, Event, GitlabAction,
    MergeRequestEvent, PullRequestAction, PullRequestEvent, PushEvent, ReleaseEvent,
    TestingFarmResult, TestingFarmResultsEvent, VersionUpdateEvent,
};
use crate::check_name::JobKind;
use crate::Forge;
use chrono::Utc;

// ============================================================================
// Test helpers
// ============================================================================

fn pull_request_event() -> Event {
    Event::PullRequest(PullRequestEvent {
        action: PullRequestAction::Opened,
        pr_id: 342,
        base_repo_namespace: "contributor".to_string(),
        base_repo_name: "ogr".to_string(),
        base_ref: "fix-things".to_string(),
        target_repo_namespace: Some("packit".to_string()),
        target_repo_name: Some("ogr".to_string()),
        project_url: "https://github.com/packit/ogr".to_string(),
        commit_sha: "528b803b".to_string(),
        actor: "contributor".to_string(),
        created_at: Utc::now(),
    })
}

fn push_event() -> Event {
    Event::Push(PushEvent {
        forge: Forge::GitHub,
        namespace: "packit".to_string(),
        repo_name: "ogr".to_string(),
        git_ref: "main".to_string(),
        commit_sha: "04885ff8".to_string(),
        project_url: "https://github.com/packit/ogr".to_string(),
        actor: None,
        created_at: Utc::now(),
    })
}

fn release_event() -> Event {
    Event::Release(ReleaseEvent {
        forge: Forge::GitHub,
        namespace: "packit".to_string(),
        repo_name: "ogr".to_string(),
        tag_name: "v1.0.2".to_string(),
        project_url: "https://github.com/packit/ogr".to_string(),
        commit_sha: None,
        created_at: Utc::now(),
    })
}

// ============================================================================
// Tests
// ============================================================================

mod object_tests {
    use super::*;

    /// Verify trigger kinds follow the object type.
    #[test]
    fn test_trigger_kind_from_object() {
        assert_eq!(
            ProjectEventObject::PullRequest { pr_id: 1 }.trigger_kind(),
            TriggerKind::PullRequest
        );
        assert_eq!(
            ProjectEventObject::Branch {
                name: "main".to_string()
            }
            .trigger_kind(),
            TriggerKind::Commit
        );
        assert_eq!(
            ProjectEventObject::Release {
                tag_name: "v1".to_string()
            }
            .trigger_kind(),
            TriggerKind::Release
        );
    }
}

mod store_tests {
    use super::*;

    /// Verify get-or-create returns the same record for the same tuple and
    /// a fresh one for a different tuple.
    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = InMemoryProjectEventStore::new();
        let project = ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr");

        let first = store
            .get_or_create_pull_request(&project, 342, Some("abc"))
            .await
            .unwrap();
        let second = store
            .get_or_create_pull_request(&project, 342, Some("abc"))
            .await
            .unwrap();
        let other = store
            .get_or_create_pull_request(&project, 343, Some("def"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
    }

    /// Verify different trigger objects on one project stay distinct.
    #[tokio::test]
    async fn test_objects_keyed_separately() {
        let store = InMemoryProjectEventStore::new();
        let project = ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr");

        let branch = store
            .get_or_create_branch(&project, "main", None)
            .await
            .unwrap();
        let release = store
            .get_or_create_release(&project, "v1.0.2", None)
            .await
            .unwrap();

        assert_ne!(branch.id, release.id);
        assert_eq!(branch.trigger_kind(), TriggerKind::Commit);
        assert_eq!(release.trigger_kind(), TriggerKind::Release);
    }

    /// Verify pipeline lookups resolve through the link table.
    #[tokio::test]
    async fn test_pipeline_lookup() {
        let store = InMemoryProjectEventStore::new();
        let id = store.insert(
            ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr"),
            ProjectEventObject::PullRequest { pr_id: 342 },
        );
        store.link_pipeline("129bd474", id);

        let found = store.get_by_pipeline_id("129bd474").await.unwrap();
        assert_eq!(found.map(|e| e.id), Some(id));

        let missing = store.get_by_pipeline_id("unknown").await.unwrap();
        assert!(missing.is_none());
    }
}

mod bind_tests {
    use super::*;

    fn binder_with_store() -> (EventBinder, Arc<InMemoryProjectEventStore>) {
        let store = Arc::new(InMemoryProjectEventStore::new());
        (EventBinder::new(store.clone()), store)
    }

    /// Verify a pull request binds to a PR project event keyed on the
    /// target repository.
    #[tokio::test]
    async fn test_pull_request_binds_to_target_repo() {
        let (binder, _) = binder_with_store();
        let bound = binder.bind(pull_request_event()).await.unwrap();

        let project_event = bound.project_event.unwrap();
        assert_eq!(
            project_event.object,
            ProjectEventObject::PullRequest { pr_id: 342 }
        );
        assert_eq!(project_event.project.namespace, "packit");
        assert_eq!(project_event.commit_sha.as_deref(), Some("528b803b"));
    }

    /// Verify a merge request binds through the same PR path.
    #[tokio::test]
    async fn test_merge_request_binds() {
        let (binder, _) = binder_with_store();
        let event = Event::MergeRequest(MergeRequestEvent {
            action: GitlabAction::Opened,
            actor: "testexample".to_string(),
            object_id: 58759529,
            object_iid: 1,
            source_repo_namespace: "testing/packit".to_string(),
            source_repo_name: "tests-fork".to_string(),
            source_repo_branch: Some("the-source-branch".to_string()),
            source_project_url: "https://gitlab.com/testing/packit/tests-fork".to_string(),
            target_repo_namespace: "testing/packit".to_string(),
            target_repo_name: "tests".to_string(),
            target_repo_branch: Some("master".to_string()),
            project_url: "https://gitlab.com/testing/packit/tests".to_string(),
            commit_sha: Some("1f6a716a".to_string()),
            oldrev: None,
            title: None,
            description: None,
            url: None,
            created_at: Utc::now(),
        });

        let bound = binder.bind(event).await.unwrap();
        assert_eq!(
            bound.project_event.unwrap().object,
            ProjectEventObject::PullRequest { pr_id: 1 }
        );
    }

    /// Verify pushes bind to a branch project event and releases to a
    /// release one.
    #[tokio::test]
    async fn test_push_and_release_bind() {
        let (binder, _) = binder_with_store();

        let bound = binder.bind(push_event()).await.unwrap();
        assert_eq!(
            bound.project_event.unwrap().object,
            ProjectEventObject::Branch {
                name: "main".to_string()
            }
        );

        let bound = binder.bind(release_event()).await.unwrap();
        assert_eq!(
            bound.project_event.unwrap().object,
            ProjectEventObject::Release {
                tag_name: "v1.0.2".to_string()
            }
        );
    }

    /// Verify a version update binds to a release event under the derived
    /// dist-git coordinates.
    #[tokio::test]
    async fn test_version_update_binds_to_distgit_release() {
        let (binder, _) = binder_with_store();
        let event = Event::VersionUpdate(VersionUpdateEvent {
            package_name: "redis".to_string(),
            version: "7.0.3".to_string(),
            distgit_project_url: "https://src.fedoraproject.org/rpms/redis".to_string(),
            created_at: Utc::now(),
        });

        let bound = binder.bind(event).await.unwrap();
        let project_event = bound.project_event.unwrap();
        assert_eq!(project_event.project.namespace, "rpms");
        assert_eq!(project_event.project.repo_name, "redis");
        assert_eq!(
            project_event.object,
            ProjectEventObject::Release {
                tag_name: "7.0.3".to_string()
            }
        );
    }

    /// Verify a check rerun re-reads its existing project event instead of
    /// creating one.
    #[tokio::test]
    async fn test_check_rerun_reads_existing_event() {
        let (binder, store) = binder_with_store();
        let id = store.insert(
            ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr"),
            ProjectEventObject::PullRequest { pr_id: 342 },
        );

        let event = Event::CheckRerun(CheckRerunEvent {
            namespace: "packit".to_string(),
            repo_name: "ogr".to_string(),
            project_url: "https://github.com/packit/ogr".to_string(),
            commit_sha: "528b803b".to_string(),
            actor: None,
            job: JobKind::RpmBuild,
            target: "fedora-34-x86_64".to_string(),
            job_identifier: None,
            project_event_id: id,
            rerun_target: CheckRerunTarget::PullRequest { pr_id: 342 },
            created_at: Utc::now(),
        });

        let bound = binder.bind(event).await.unwrap();
        assert_eq!(bound.project_event.map(|e| e.id), Some(id));
    }

    /// Verify Testing Farm results resolve through the pipeline link.
    #[tokio::test]
    async fn test_testing_farm_results_bind_via_pipeline() {
        let (binder, store) = binder_with_store();
        let id = store.insert(
            ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr"),
            ProjectEventObject::PullRequest { pr_id: 342 },
        );
        store.link_pipeline("129bd474", id);

        let event = Event::TestingFarmResults(TestingFarmResultsEvent {
            pipeline_id: "129bd474".to_string(),
            result: TestingFarmResult::Passed,
            compose: None,
            summary: None,
            log_url: None,
            copr_build_id: None,
            copr_chroot: None,
            commit_sha: None,
            project_url: None,
            identifier: None,
            created_at: Utc::now(),
        });

        let bound = binder.bind(event).await.unwrap();
        assert_eq!(bound.project_event.map(|e| e.id), Some(id));
    }

    /// Verify variants without a reviewable unit pass through unbound.
    #[tokio::test]
    async fn test_unbound_variants_pass_through() {
        let (binder, _) = binder_with_store();
        let event = Event::CoprBuild(CoprBuildEvent {
            phase: CoprBuildPhase::Ended,
            build_id: 1,
            chroot: "fedora-34-x86_64".to_string(),
            status: Some(1),
            owner: "packit".to_string(),
            project_name: "packit-ogr-342".to_string(),
            pkg: None,
            created_at: Utc::now(),
        });

        let bound = binder.bind(event).await.unwrap();
        assert!(bound.project_event.is_none());
        assert_eq!(bound.event.kind(), "copr_build");
    }
}
