//! End-to-end tests of the JSON API over an in-memory store

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use gametable_core::core_session::UserId;
use gametable_core::http::{build_router, AppState, USER_ID_HEADER};
use gametable_core::test_utils::TestTable;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    router: Router,
    table: TestTable,
}

impl Harness {
    fn new() -> Self {
        let table = TestTable::memory().unwrap();
        let router = build_router(Arc::new(AppState::new(table.service.clone())));
        Self { router, table }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.call_raw(method, uri, user, body.map(|body| body.to_string())).await
    }

    /// Send `body` verbatim as `application/json`
    async fn call_raw(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_session(&self, user: &str, name: &str) -> String {
        let (status, body) =
            self.call(Method::POST, "/sessions", Some(user), Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn create_invite(
        &self,
        user: &str,
        session_id: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let uri = format!("/sessions/{}/invites", session_id);
        self.call(Method::POST, &uri, Some(user), Some(body)).await
    }
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new();
    let (status, body) = harness.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let harness = Harness::new();
    let (status, body) =
        harness.call(Method::POST, "/sessions", None, Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[tokio::test]
async fn test_create_invite_join_flow() {
    let harness = Harness::new();
    let session_id = harness.create_session("alice", "Dragon Hunt").await;

    let (status, invite) =
        harness.create_invite("alice", &session_id, json!({ "max_uses": 1 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invite["max_uses"], 1);
    assert_eq!(invite["uses_count"], 0);
    assert_eq!(invite["status"], "ACTIVE");
    let code = invite["code"].as_str().unwrap().to_string();
    assert!(code.starts_with("DRAGON"));

    let (status, joined) =
        harness.call(Method::POST, "/join", Some("bob"), Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["session_id"], session_id.as_str());
    assert_eq!(joined["session_name"], "Dragon Hunt");

    let (status, body) =
        harness.call(Method::POST, "/join", Some("carol"), Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "invite_exhausted");

    let (status, detail) =
        harness.call(Method::GET, &format!("/sessions/{}", session_id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["members"].as_array().unwrap().len(), 2);
    assert_eq!(detail["members"][0]["role"], "MASTER");

    let (_, status_body) =
        harness.call(Method::GET, &format!("/invites/{}", code), Some("bob"), None).await;
    assert_eq!(status_body["status"], "EXHAUSTED");
}

#[tokio::test]
async fn test_join_errors() {
    let harness = Harness::new();

    let (status, body) = harness.call(Method::POST, "/join", Some("bob"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) =
        harness.call(Method::POST, "/join", Some("bob"), Some(json!({ "code": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = harness
        .call_raw(Method::POST, "/join", Some("bob"), Some("not json".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) =
        harness.call(Method::POST, "/join", Some("bob"), Some(json!({ "code": "NOPE" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let session_id = harness.create_session("alice", "Dragon Hunt").await;
    let (_, invite) = harness.create_invite("alice", &session_id, json!({ "expires_at": 1 })).await;
    let (status, body) = harness
        .call(Method::POST, "/join", Some("bob"), Some(json!({ "code": invite["code"] })))
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "invite_expired");
}

#[tokio::test]
async fn test_malformed_bodies_are_validation_errors() {
    let harness = Harness::new();

    let (status, body) =
        harness.call(Method::POST, "/sessions", Some("alice"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let session_id = harness.create_session("alice", "Dragon Hunt").await;
    let (status, body) =
        harness.create_invite("alice", &session_id, json!({ "max_uses": "lots" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = harness
        .create_invite("alice", &session_id, json!({ "expires_at": u64::MAX }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = harness
        .call_raw(Method::POST, "/characters/select", Some("alice"), Some("{".to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_permissions() {
    let harness = Harness::new();
    let session_id = harness.create_session("alice", "Dragon Hunt").await;

    let (status, body) = harness.create_invite("bob", &session_id, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, _) =
        harness.call(Method::GET, &format!("/sessions/{}", session_id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness.create_invite("alice", "missing", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = harness
        .call(
            Method::DELETE,
            &format!("/sessions/{}/members/alice", session_id),
            Some("alice"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_operation");
}

#[tokio::test]
async fn test_archive_blocks_invites_and_joins() {
    let harness = Harness::new();
    let session_id = harness.create_session("alice", "Dragon Hunt").await;
    let (_, invite) = harness.create_invite("alice", &session_id, json!({})).await;

    let (status, archived) = harness
        .call(Method::POST, &format!("/sessions/{}/archive", session_id), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "ARCHIVED");

    let (status, _) = harness.create_invite("alice", &session_id, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = harness
        .call(Method::POST, "/join", Some("bob"), Some(json!({ "code": invite["code"] })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = harness
        .call(Method::GET, &format!("/sessions/{}/invites", session_id), Some("alice"), None)
        .await;
    assert_eq!(listed["invites"][0]["uses_count"], 0);
}

#[tokio::test]
async fn test_select_character_and_leave() {
    let harness = Harness::new();
    let session_id = harness.create_session("alice", "Dragon Hunt").await;
    let (_, invite) = harness.create_invite("alice", &session_id, json!({})).await;
    harness
        .call(Method::POST, "/join", Some("bob"), Some(json!({ "code": invite["code"] })))
        .await;

    let bob = UserId::from("bob");
    let first = harness.table.characters.register(bob.clone(), "Thorin").unwrap();
    let second = harness.table.characters.register(bob, "Lyra").unwrap();

    let select = |character: String| {
        json!({ "session_id": session_id.clone(), "character_id": character })
    };

    let (status, body) = harness
        .call(Method::POST, "/characters/select", Some("bob"), Some(select(first.to_string())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "created");

    let (_, body) = harness
        .call(Method::POST, "/characters/select", Some("bob"), Some(select(second.to_string())))
        .await;
    assert_eq!(body["action"], "updated");
    assert_eq!(body["character_id"], second.as_str());

    let (status, _) = harness
        .call(Method::POST, "/characters/select", Some("carol"), Some(select(second.to_string())))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness
        .call(Method::DELETE, &format!("/sessions/{}/members/bob", session_id), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, sessions) = harness.call(Method::GET, "/sessions", Some("bob"), None).await;
    assert!(sessions["sessions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_session() {
    let harness = Harness::new();
    let session_id = harness.create_session("alice", "Dragon Hunt").await;

    let (status, _) = harness
        .call(Method::DELETE, &format!("/sessions/{}", session_id), Some("bob"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = harness
        .call(Method::DELETE, &format!("/sessions/{}", session_id), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = harness
        .call(Method::GET, &format!("/sessions/{}", session_id), Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
