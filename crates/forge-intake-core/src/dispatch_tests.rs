//! Tests for classification dispatch.

use super::*;
use crate::binder::{InMemoryProjectEventStore, ProjectEventObject, ProjectRef};
use crate::events::TestingFarmResult;
use serde_json::json;

// ============================================================================
// Test helpers
// ============================================================================

/// Testing Farm client double serving a fixed passed result.
struct PassedTestingFarm;

#[async_trait]
impl TestingFarmClient for PassedTestingFarm {
    async fn request_details(
        &self,
        _request_id: &str,
    ) -> Result<TestingFarmRequestDetails, TestingFarmClientError> {
        Ok(TestingFarmRequestDetails {
            result: TestingFarmResult::Passed,
            compose: None,
            summary: None,
            log_url: None,
            copr_build_id: None,
            copr_chroot: None,
            commit_sha: None,
            project_url: None,
            identifier: None,
        })
    }
}

fn classifier() -> EventClassifier {
    EventClassifier::new(
        Arc::new(InMemoryProjectEventStore::new()),
        Arc::new(PassedTestingFarm),
        ServiceConfig::default(),
    )
}

fn classifier_with_store(store: Arc<InMemoryProjectEventStore>) -> EventClassifier {
    EventClassifier::new(store, Arc::new(PassedTestingFarm), ServiceConfig::default())
}

fn github_push_payload() -> Value {
    json!({
        "ref": "refs/heads/main",
        "after": "04885ff850b0fa0e206cd09db73565703d48f99b",
        "deleted": false,
        "head_commit": {"id": "04885ff850b0fa0e206cd09db73565703d48f99b"},
        "pusher": {"name": "releaser"},
        "repository": {
            "name": "ogr",
            "owner": {"login": "packit"},
            "html_url": "https://github.com/packit/ogr"
        }
    })
}

fn gitlab_mr_payload() -> Value {
    json!({
        "object_kind": "merge_request",
        "user": {"username": "testexample"},
        "object_attributes": {
            "id": 58759529,
            "iid": 1,
            "action": "open",
            "state": "opened",
            "source_branch": "the-source-branch",
            "target_branch": "master",
            "source": {"web_url": "https://gitlab.com/testing/packit/tests-fork"},
            "target": {"web_url": "https://gitlab.com/testing/packit/tests"},
            "last_commit": {"id": "1f6a716aa7a618a9ffe56970d77177d99d5022a1"}
        }
    })
}

fn copr_end_payload() -> Value {
    json!({
        "topic": "org.fedoraproject.prod.copr.build.end",
        "build": 1044215,
        "chroot": "fedora-33-x86_64",
        "status": 1,
        "owner": "packit",
        "copr": "packit-ogr-342",
        "pkg": "ogr"
    })
}

// ============================================================================
// Tests
// ============================================================================

mod scan_tests {
    use super::*;

    /// Verify a GitHub push payload is recognized without transport
    /// metadata.
    #[tokio::test]
    async fn test_scan_recognizes_github_push() {
        let result = classifier().classify(&github_push_payload()).await.unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "push");
    }

    /// Verify a GitLab merge request payload is recognized by scan.
    #[tokio::test]
    async fn test_scan_recognizes_gitlab_merge_request() {
        let result = classifier().classify(&gitlab_mr_payload()).await.unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "merge_request");
    }

    /// Verify a bus payload is recognized through its embedded topic.
    #[tokio::test]
    async fn test_scan_recognizes_bus_payload_by_topic() {
        let result = classifier().classify(&copr_end_payload()).await.unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "copr_build");
    }

    /// Verify the same bus payload without its topic is not recognized:
    /// bus extractors are topic-gated in scan mode.
    #[tokio::test]
    async fn test_scan_requires_topic_for_bus_payloads() {
        let mut payload = copr_end_payload();
        payload.as_object_mut().unwrap().remove("topic");
        let result = classifier().classify(&payload).await.unwrap();
        assert!(matches!(result, Classification::Unrecognized));
    }

    /// Verify an arbitrary payload yields Unrecognized, not an error.
    #[tokio::test]
    async fn test_unrecognized_is_not_an_error() {
        let payload = json!({"zen": "Keep it logically awesome.", "hook_id": 123});
        let result = classifier().classify(&payload).await.unwrap();
        assert!(matches!(result, Classification::Unrecognized));
    }

    /// Verify an empty payload yields Unrecognized.
    #[tokio::test]
    async fn test_empty_payload_unrecognized() {
        let result = classifier().classify(&json!({})).await.unwrap();
        assert!(matches!(result, Classification::Unrecognized));
    }
}

mod keyed_tests {
    use super::*;

    /// Verify keyed dispatch routes a GitHub push by its event header.
    #[tokio::test]
    async fn test_keyed_github_push() {
        let result = classifier()
            .classify_by_kind(SourceSystem::GitHub, "push", &github_push_payload())
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "push");
    }

    /// Verify keyed and scan dispatch agree on the same payload.
    #[tokio::test]
    async fn test_keyed_agrees_with_scan() {
        let classifier = classifier();
        let payload = gitlab_mr_payload();

        let scanned = classifier.classify(&payload).await.unwrap();
        let keyed = classifier
            .classify_by_kind(SourceSystem::GitLab, "Merge Request Hook", &payload)
            .await
            .unwrap();

        let (Classification::Recognized(a), Classification::Recognized(b)) = (scanned, keyed)
        else {
            panic!("expected recognition on both paths");
        };
        assert_eq!(a.kind(), b.kind());
    }

    /// Verify an unknown wire kind yields Unrecognized.
    #[tokio::test]
    async fn test_unknown_wire_kind() {
        let result = classifier()
            .classify_by_kind(SourceSystem::GitHub, "workflow_run", &json!({}))
            .await
            .unwrap();
        assert!(matches!(result, Classification::Unrecognized));
    }

    /// Verify a known wire kind whose payload declines yields Unrecognized.
    #[tokio::test]
    async fn test_declined_payload_unrecognized() {
        let mut payload = github_push_payload();
        payload["deleted"] = json!(true);
        let result = classifier()
            .classify_by_kind(SourceSystem::GitHub, "push", &payload)
            .await
            .unwrap();
        assert!(matches!(result, Classification::Unrecognized));
    }

    /// Verify the issue_comment wire kind splits on payload shape: the
    /// same wire kind produces a PR comment when the issue is a PR and an
    /// issue comment otherwise.
    #[tokio::test]
    async fn test_issue_comment_structural_split() {
        let classifier = classifier();
        let mut payload = json!({
            "action": "created",
            "issue": {"number": 509, "pull_request": {"url": "..."}},
            "comment": {
                "id": 1,
                "body": "/build",
                "user": {"login": "someone"}
            },
            "repository": {
                "name": "ogr",
                "owner": {"login": "packit"},
                "html_url": "https://github.com/packit/ogr"
            }
        });

        let result = classifier
            .classify_by_kind(SourceSystem::GitHub, "issue_comment", &payload)
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "pull_request_comment");

        payload["issue"].as_object_mut().unwrap().remove("pull_request");
        let result = classifier
            .classify_by_kind(SourceSystem::GitHub, "issue_comment", &payload)
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "issue_comment");
    }

    /// Verify bus topics route by suffix so the environment prefix does
    /// not matter.
    #[tokio::test]
    async fn test_bus_topic_suffix_routing() {
        let mut payload = copr_end_payload();
        payload.as_object_mut().unwrap().remove("topic");

        for topic in [
            "org.fedoraproject.prod.copr.build.end",
            "org.fedoraproject.stg.copr.build.end",
        ] {
            let result = classifier()
                .classify_by_kind(SourceSystem::FedoraMessaging, topic, &payload)
                .await
                .unwrap();
            let Classification::Recognized(event) = result else {
                panic!("expected recognition for {topic}");
            };
            assert_eq!(event.kind(), "copr_build");
        }
    }

    /// Verify an OpenScanHub finished notification routes by its topic.
    #[tokio::test]
    async fn test_open_scan_hub_finished_keyed() {
        let payload = json!({
            "task_id": 17514,
            "status": "success",
            "issues_added_url": "https://openscanhub.fedoraproject.org/task/17514/log/added.js",
            "issues_fixed_url": "https://openscanhub.fedoraproject.org/task/17514/log/fixed.js",
            "scan_results_url": "https://openscanhub.fedoraproject.org/task/17514/log/scan-results.js"
        });
        let result = classifier()
            .classify_by_kind(
                SourceSystem::FedoraMessaging,
                "org.fedoraproject.prod.openscanhub.task.finished",
                &payload,
            )
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "open_scan_hub_task");
    }

    /// Verify a Testing Farm results callback routes to the detail fetch.
    #[tokio::test]
    async fn test_testing_farm_results_keyed() {
        let payload = json!({
            "source": "testing-farm",
            "request_id": "129bd474-e4d3-49e0-9dec-d994a99feebc"
        });
        let result = classifier()
            .classify_by_kind(SourceSystem::TestingFarm, "results", &payload)
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "testing_farm_results");
    }

    /// Verify a check rerun flows through the store the classifier holds.
    #[tokio::test]
    async fn test_check_rerun_uses_store() {
        let store = Arc::new(InMemoryProjectEventStore::new());
        let id = store.insert(
            ProjectRef::new("packit", "ogr", "https://github.com/packit/ogr"),
            ProjectEventObject::PullRequest { pr_id: 342 },
        );
        let payload = json!({
            "action": "rerequested",
            "check_run": {
                "name": "rpm-build:fedora-34-x86_64",
                "head_sha": "528b803be6f93e109f18bfac9daf2d23f3bd72dc",
                "external_id": id.to_string(),
                "app": {"slug": "forge-intake"}
            },
            "repository": {
                "name": "ogr",
                "owner": {"login": "packit"},
                "html_url": "https://github.com/packit/ogr"
            },
            "sender": {"login": "someone"}
        });

        let result = classifier_with_store(store)
            .classify_by_kind(SourceSystem::GitHub, "check_run", &payload)
            .await
            .unwrap();
        let Classification::Recognized(event) = result else {
            panic!("expected recognition");
        };
        assert_eq!(event.kind(), "check_rerun");
    }
}

mod exclusivity_tests {
    use super::*;

    /// Verify each representative payload is claimed by exactly one
    /// extractor in the whole registry, with the topic gate applied the
    /// way the scan applies it.
    #[tokio::test]
    async fn test_exactly_one_extractor_claims_each_payload() {
        let classifier = classifier();
        for payload in [
            github_push_payload(),
            gitlab_mr_payload(),
            copr_end_payload(),
        ] {
            let topic = payload.get("topic").and_then(Value::as_str);
            let mut claimants = Vec::new();
            for kind in SCAN_ORDER {
                if !topic_matches(*kind, topic) {
                    continue;
                }
                if classifier.run(*kind, &payload).await.unwrap().is_some() {
                    claimants.push(*kind);
                }
            }
            assert_eq!(claimants.len(), 1, "claimants: {claimants:?}");
        }
    }

    /// Verify re-running the scan on one payload is deterministic.
    #[tokio::test]
    async fn test_scan_is_deterministic() {
        let classifier = classifier();
        let payload = github_push_payload();

        let first = classifier.classify(&payload).await.unwrap();
        let second = classifier.classify(&payload).await.unwrap();

        let (Classification::Recognized(a), Classification::Recognized(b)) = (first, second)
        else {
            panic!("expected recognition on both runs");
        };
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.source_url(), b.source_url());
    }
}
