//! Deployment tracker unit tests

use std::sync::Arc;

use infradeck::deploy::tracker::DeploymentTracker;
use infradeck::errors::DeckError;
use infradeck::models::deployment::DeploymentStatus;
use infradeck::storage::memory::MemStorage;
use infradeck::storage::provider::Storage;

fn tracker() -> (Arc<MemStorage>, DeploymentTracker) {
    let storage = Arc::new(MemStorage::new());
    let tracker = DeploymentTracker::new(storage.clone());
    (storage, tracker)
}

#[tokio::test]
async fn test_create_starts_in_progress() {
    let (storage, tracker) = tracker();
    let deployment = tracker
        .create("Terraform apply: Main", "Initializing...")
        .await
        .unwrap();

    assert_eq!(deployment.status, DeploymentStatus::InProgress);
    assert_eq!(deployment.logs, "Initializing...");
    assert!(deployment.completed_at.is_none());

    let stored = storage.get_deployment(deployment.id).await.unwrap().unwrap();
    assert_eq!(stored, deployment);
}

#[tokio::test]
async fn test_complete_twice_keeps_first_result() {
    let (_storage, tracker) = tracker();
    let deployment = tracker.create("run", "start").await.unwrap();

    let first = tracker
        .complete(deployment.id, DeploymentStatus::Completed)
        .await
        .unwrap();
    assert_eq!(first.status, DeploymentStatus::Completed);
    assert!(first.completed_at.is_some());

    let second = tracker
        .complete(deployment.id, DeploymentStatus::Failed)
        .await
        .unwrap();
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_update_after_completion_is_ignored() {
    let (_storage, tracker) = tracker();
    let deployment = tracker.create("run", "start").await.unwrap();
    let failed = tracker
        .complete(deployment.id, DeploymentStatus::Failed)
        .await
        .unwrap();

    let after = tracker
        .update_status(
            deployment.id,
            DeploymentStatus::InProgress,
            Some("start\nlate output".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(after, failed);
    assert_eq!(after.logs, "start");
}

#[tokio::test]
async fn test_unknown_deployment_is_not_found() {
    let (_storage, tracker) = tracker();

    let err = tracker
        .update_status(42, DeploymentStatus::InProgress, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::NotFound(_)));

    let err = tracker
        .complete(42, DeploymentStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_completion_settles_once() {
    let (_storage, tracker) = tracker();
    let tracker = Arc::new(tracker);
    let deployment = tracker.create("run", "").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let tracker = tracker.clone();
        let status = if i % 2 == 0 {
            DeploymentStatus::Completed
        } else {
            DeploymentStatus::Failed
        };
        handles.push(tokio::spawn(async move {
            tracker.complete(deployment.id, status).await.unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    let first = &results[0];
    assert!(first.status.is_terminal());
    assert!(results.iter().all(|d| d == first));
}

#[tokio::test]
async fn test_status_direction_is_enforced() {
    let (_storage, tracker) = tracker();
    let deployment = tokio_test::assert_ok!(tracker.create("run", "start").await);

    let err = tokio_test::assert_err!(
        tracker
            .update_status(deployment.id, DeploymentStatus::Completed, None)
            .await
    );
    assert!(matches!(err, DeckError::InvalidTransition(_)));

    let err = tokio_test::assert_err!(
        tracker
            .complete(deployment.id, DeploymentStatus::InProgress)
            .await
    );
    assert!(matches!(err, DeckError::InvalidTransition(_)));

    let updated = tokio_test::assert_ok!(
        tracker
            .update_status(
                deployment.id,
                DeploymentStatus::InProgress,
                Some("start\nmore".to_string()),
            )
            .await
    );
    assert_eq!(updated.logs, "start\nmore");
    assert_eq!(updated.status, DeploymentStatus::InProgress);
}
