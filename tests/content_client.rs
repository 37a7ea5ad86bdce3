use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;
use uuid::Uuid;

use inkpost::application::content::{ContentApi, ContentError};
use inkpost::infra::content_client::HttpContentClient;
use inkpost_api_types::PostCreateRequest;

const POST_ID: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

fn client(server: &MockServer) -> HttpContentClient {
    HttpContentClient::new(&server.base_url(), Duration::from_secs(5)).expect("client")
}

fn post(author: &str) -> serde_json::Value {
    json!({
        "id": POST_ID,
        "title": "Hello",
        "content": "World",
        "author": author,
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn create_sends_request_body_and_user_agent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/posts")
            .header("user-agent", HttpContentClient::user_agent())
            .json_body(json!({ "title": "Hello", "content": "World", "author": "Ada" }));
        then.status(201).json_body(post("Ada"));
    });

    let created = client(&server)
        .create_post(&PostCreateRequest {
            title: "Hello".into(),
            content: "World".into(),
            author: Some("Ada".into()),
        })
        .await
        .expect("create");

    mock.assert();
    assert_eq!(created.author, "Ada");
    assert_eq!(created.id.to_string(), POST_ID);
}

#[tokio::test]
async fn list_and_get_decode_posts() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200)
            .json_body(json!([post("Anonymous"), post("Ada")]));
    });
    server.mock(|when, then| {
        when.method("GET").path(format!("/posts/{POST_ID}"));
        then.status(200).json_body(post("Ada"));
    });

    let client = client(&server);
    let posts = client.list_posts().await.expect("list");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].author, "Anonymous");

    let id: Uuid = POST_ID.parse().expect("uuid");
    assert_eq!(client.get_post(id).await.expect("get").title, "Hello");
}

#[tokio::test]
async fn rename_returns_updated_count() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("PUT")
            .path("/posts/update-author")
            .json_body(json!({ "oldAuthor": "Anonymous", "newAuthor": "Ada" }));
        then.status(200).json_body(json!({ "updatedCount": 4 }));
    });

    let updated = client(&server)
        .rename_author("Anonymous", "Ada")
        .await
        .expect("rename");
    mock.assert();
    assert_eq!(updated, 4);
}

#[tokio::test]
async fn error_body_message_and_hint_are_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("PUT").path("/posts/update-author");
        then.status(400).json_body(json!({
            "error": {
                "code": "bad_request",
                "message": "newAuthor must not be empty",
                "hint": "send a non-blank name"
            }
        }));
    });

    let err = client(&server)
        .rename_author("Ada", " ")
        .await
        .expect_err("rejected");
    match err {
        ContentError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "newAuthor must not be empty (send a non-blank name)");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(502).body("bad gateway");
    });

    let err = client(&server).list_posts().await.expect_err("rejected");
    assert!(matches!(
        err,
        ContentError::Rejected { status: 502, ref message } if message == "bad gateway"
    ));
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200).body("{\"not\": \"a list\"}");
    });

    let err = client(&server).list_posts().await.expect_err("decode");
    assert!(matches!(err, ContentError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = HttpContentClient::new("http://127.0.0.1:1", Duration::from_millis(500))
        .expect("client");
    let err = client.list_posts().await.expect_err("transport");
    assert!(matches!(err, ContentError::Transport(_)));
}

#[test]
fn invalid_site_url_is_rejected() {
    let err = HttpContentClient::new("not a url", Duration::from_secs(1)).expect_err("invalid");
    assert!(matches!(err, ContentError::Transport(_)));
}
