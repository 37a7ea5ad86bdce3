use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use tempfile::TempDir;

use inkpost::application::content::ContentApi;
use inkpost::application::identity::{
    IdentityStore, OnboardingMachine, OnboardingState, PostAuthoring, Readiness, RenameOutcome,
    RenameReconciler, WelcomeChoice,
};
use inkpost::infra::content_client::HttpContentClient;
use inkpost::infra::storage::FileIdentityStorage;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn open_store(dir: &TempDir) -> Arc<IdentityStore> {
    let store = Arc::new(IdentityStore::new(Arc::new(FileIdentityStorage::new(
        dir.path(),
    ))));
    assert_eq!(store.hydrate().await, Readiness::Ready);
    store
}

fn content(server: &MockServer) -> Arc<dyn ContentApi> {
    Arc::new(HttpContentClient::new(&server.base_url(), TIMEOUT).expect("client"))
}

#[tokio::test]
async fn onboarding_rename_and_publish_share_one_identity() {
    let server = MockServer::start();
    let rename = server.mock(|when, then| {
        when.method("PUT")
            .path("/posts/update-author")
            .json_body(json!({ "oldAuthor": "Ada", "newAuthor": "Ada Lovelace" }));
        then.status(200).json_body(json!({ "updatedCount": 2 }));
    });
    let publish = server.mock(|when, then| {
        when.method("POST").path("/posts").json_body(json!({
            "title": "Notes",
            "content": "On the engine",
            "author": "Ada Lovelace"
        }));
        then.status(201).json_body(json!({
            "id": "0b6f8f5e-3c2d-4f5a-9b8c-7d6e5f4a3b2c",
            "title": "Notes",
            "content": "On the engine",
            "author": "Ada Lovelace",
            "createdAt": "2024-06-01T08:30:00Z"
        }));
    });

    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir).await;

    let machine = OnboardingMachine::new(store.clone()).with_delay(Duration::from_millis(1));
    assert_eq!(machine.run().await.expect("run"), OnboardingState::Prompting);
    let state = machine
        .resolve(WelcomeChoice::SetName {
            name: "Ada".into(),
            dont_show_again: false,
        })
        .await
        .expect("resolve");
    assert_eq!(state, OnboardingState::Resolved);

    let reconciler = RenameReconciler::new(store.clone(), content(&server)).with_timeout(TIMEOUT);
    let outcome = reconciler
        .rename_author("Ada Lovelace")
        .await
        .expect("rename");
    assert!(matches!(outcome, RenameOutcome::Relabelled { updated_count: 2, .. }));
    rename.assert();

    let authoring = PostAuthoring::new(store.clone(), content(&server)).with_timeout(TIMEOUT);
    let post = authoring
        .publish("Notes", "On the engine")
        .await
        .expect("publish");
    assert_eq!(post.author, "Ada Lovelace");
    publish.assert();
}

#[tokio::test]
async fn resolved_welcome_is_not_shown_in_a_later_session() {
    let dir = TempDir::new().expect("tempdir");

    let first = open_store(&dir).await;
    let machine = OnboardingMachine::new(first).with_delay(Duration::from_millis(1));
    machine.run().await.expect("run");
    machine
        .resolve(WelcomeChoice::ContinueAnonymously {
            dont_show_again: false,
        })
        .await
        .expect("resolve");

    let second = open_store(&dir).await;
    let identity = second.identity().await.expect("identity");
    assert!(identity.welcome_completed);
    assert_eq!(identity.display_name(), "Anonymous");

    let machine = OnboardingMachine::new(second).with_delay(Duration::from_millis(1));
    assert_eq!(machine.run().await.expect("run"), OnboardingState::Resolved);
}

#[tokio::test]
async fn failed_rename_leaves_persisted_name_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("PUT").path("/posts/update-author");
        then.status(503).body("upstream unavailable");
    });

    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir).await;
    store.set_name("Alice").await.expect("set name");

    let reconciler = RenameReconciler::new(store.clone(), content(&server)).with_timeout(TIMEOUT);
    let err = reconciler.rename_author("Bob").await.expect_err("rejected");
    assert!(err.is_retryable());

    let reopened = open_store(&dir).await;
    let identity = reopened.identity().await.expect("identity");
    assert_eq!(identity.display_name(), "Alice");
}

#[tokio::test]
async fn first_name_is_committed_without_contacting_the_server() {
    let server = MockServer::start();
    let rename = server.mock(|when, then| {
        when.method("PUT").path("/posts/update-author");
        then.status(200).json_body(json!({ "updatedCount": 0 }));
    });

    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir).await;
    let reconciler = RenameReconciler::new(store.clone(), content(&server));

    let outcome = reconciler.rename_author("  Grace ").await.expect("rename");
    assert!(matches!(outcome, RenameOutcome::FirstName { .. }));
    assert_eq!(outcome.name().as_str(), "Grace");
    rename.assert_hits(0);

    let unchanged = reconciler.rename_author("Grace").await.expect("rename");
    assert!(matches!(unchanged, RenameOutcome::Unchanged { .. }));
    rename.assert_hits(0);
}
