//! Document route tests
//!
//! These run against the in-memory document store, so they need no database.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use taskboard_shared::models::document::Collection;
use taskboard_shared::models::user::{encode_profile_image, MAX_PROFILE_IMAGE_BYTES};
use uuid::Uuid;

const TASKS: &str = "/v1/collections/tasks/documents";
const USERS: &str = "/v1/collections/users/documents";

fn task(text: &str, owner: Uuid) -> Value {
    json!({ "text": text, "completed": false, "uid": owner })
}

async fn create_task(app: &TestApp, token: &str, text: &str, owner: Uuid) -> Uuid {
    let (status, body) = app
        .send(Method::POST, TASKS, Some(token), Some(task(text, owner)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

    body["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("Response should carry the new id")
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::in_memory();

    let (status, body) = app.send(Method::GET, &format!("{}?field=uid&value=x", TASKS), None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::in_memory();

    let (status, _) = app
        .send(Method::GET, &format!("{}/{}", TASKS, Uuid::new_v4()), Some("not-a-jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let app = TestApp::in_memory();
    let owner = Uuid::new_v4();
    let token = app.token_for(owner);

    let id = create_task(&app, &token, "Buy milk", owner).await;

    let (status, body) = app.send(Method::GET, &format!("{}/{}", TASKS, id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Buy milk");
    assert_eq!(body["data"]["completed"], false);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("{}/{}", TASKS, id),
            Some(&token),
            Some(json!({ "completed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("{}/{}", TASKS, id),
            Some(&token),
            Some(json!({ "text": "Buy oat milk", "completed": true, "uid": owner })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.send(Method::GET, &format!("{}/{}", TASKS, id), Some(&token), None).await;
    assert_eq!(body["data"]["text"], "Buy oat milk");
    assert_eq!(body["data"]["completed"], true);

    let (status, _) = app.send(Method::DELETE, &format!("{}/{}", TASKS, id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, &format!("{}/{}", TASKS, id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again still succeeds
    let (status, _) = app.send(Method::DELETE, &format!("{}/{}", TASKS, id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_query_returns_only_own_tasks_in_creation_order() {
    let app = TestApp::in_memory();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let alice_token = app.token_for(alice);
    let bob_token = app.token_for(bob);

    create_task(&app, &alice_token, "first", alice).await;
    create_task(&app, &bob_token, "bob's", bob).await;
    create_task(&app, &alice_token, "second", alice).await;

    let uri = format!("{}?field=uid&value={}", TASKS, alice);
    let (status, body) = app.send(Method::GET, &uri, Some(&alice_token), None).await;

    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = body
        .as_array()
        .expect("Query answers with a list")
        .iter()
        .filter_map(|doc| doc["data"]["text"].as_str())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[tokio::test]
async fn test_query_for_another_user_is_forbidden() {
    let app = TestApp::in_memory();
    let token = app.token_for(Uuid::new_v4());

    let uri = format!("{}?field=uid&value={}", TASKS, Uuid::new_v4());
    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("{}?field=completed&value=true", TASKS);
    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cannot_create_task_for_someone_else() {
    let app = TestApp::in_memory();
    let token = app.token_for(Uuid::new_v4());

    let (status, _) = app
        .send(Method::POST, TASKS, Some(&token), Some(task("sneaky", Uuid::new_v4())))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.documents.len(Collection::Tasks).await, 0);
}

#[tokio::test]
async fn test_other_users_task_is_off_limits() {
    let app = TestApp::in_memory();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let owner_token = app.token_for(owner);
    let intruder_token = app.token_for(intruder);

    let id = create_task(&app, &owner_token, "private", owner).await;
    let uri = format!("{}/{}", TASKS, id);

    let (status, _) = app.send(Method::GET, &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&intruder_token), Some(task("mine now", intruder)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&intruder_token), Some(json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&intruder_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app.send(Method::GET, &uri, Some(&owner_token), None).await;
    assert_eq!(body["data"]["text"], "private");
    assert_eq!(body["data"]["completed"], false);
}

#[tokio::test]
async fn test_malformed_task_is_unprocessable() {
    let app = TestApp::in_memory();
    let owner = Uuid::new_v4();
    let token = app.token_for(owner);

    let (status, body) = app
        .send(
            Method::POST,
            TASKS,
            Some(&token),
            Some(json!({ "text": "no flag", "uid": owner })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "malformed_document");
}

#[tokio::test]
async fn test_merge_cannot_break_task_shape() {
    let app = TestApp::in_memory();
    let owner = Uuid::new_v4();
    let token = app.token_for(owner);
    let id = create_task(&app, &token, "typed", owner).await;

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("{}/{}", TASKS, id),
            Some(&token),
            Some(json!({ "completed": "yes" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_collection_is_not_found() {
    let app = TestApp::in_memory();
    let owner = Uuid::new_v4();
    let token = app.token_for(owner);

    let (status, _) = app
        .send(
            Method::POST,
            "/v1/collections/notes/documents",
            Some(&token),
            Some(task("x", owner)),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_document_is_keyed_by_uid() {
    let app = TestApp::in_memory();
    let uid = Uuid::new_v4();
    let token = app.token_for(uid);
    let user = json!({ "uid": uid, "name": "Ada", "email": "ada@example.com", "authProvider": "local" });

    // Auto ids are not allowed for user documents
    let (status, _) = app.send(Method::POST, USERS, Some(&token), Some(user.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Someone else's key is not allowed either
    let (status, _) = app
        .send(Method::PUT, &format!("{}/{}", USERS, Uuid::new_v4()), Some(&token), Some(user.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("{}/{}", USERS, uid);
    let (status, _) = app.send(Method::PUT, &uri, Some(&token), Some(user)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["authProvider"], "local");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_image_merge_respects_size_cap() {
    let app = TestApp::in_memory();
    let uid = Uuid::new_v4();
    let token = app.token_for(uid);
    let uri = format!("{}/{}", USERS, uid);
    let user = json!({ "uid": uid, "name": "Ada", "email": "ada@example.com", "authProvider": "google" });
    let (status, _) = app.send(Method::PUT, &uri, Some(&token), Some(user)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let fits = encode_profile_image(&vec![7u8; MAX_PROFILE_IMAGE_BYTES]);
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({ "profileImage": fits })))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let too_big = encode_profile_image(&vec![7u8; MAX_PROFILE_IMAGE_BYTES + 1]);
    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({ "profileImage": too_big })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["profileImage"], json!(fits));
    assert_eq!(body["data"]["name"], "Ada");
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::in_memory();
    let token = app.token_for(Uuid::new_v4());

    let request = axum::http::Request::builder()
        .uri(format!("{}/{}", TASKS, Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.app.clone(), request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = TestApp::in_memory();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert!(body.get("pool").is_none());
}

#[tokio::test]
async fn test_profile_image_merges_onto_partial_user_document() {
    let app = TestApp::in_memory();
    let uid = Uuid::new_v4();
    let token = app.token_for(uid);
    let uri = format!("{}/{}", USERS, uid);

    for bytes in [b"first".as_slice(), b"second".as_slice()] {
        let image = encode_profile_image(bytes);
        let (status, body) = app
            .send(Method::PATCH, &uri, Some(&token), Some(json!({ "profileImage": image })))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "merge failed: {}", body);
    }

    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profileImage"], json!(encode_profile_image(b"second")));
}
