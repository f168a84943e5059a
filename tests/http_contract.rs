//! HTTP contract tests.
//!
//! Each test serves the real router over an in-memory database on an
//! ephemeral port and drives it with reqwest.

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use yousoul::auth::{HeaderIdentity, StaticTokenIdentity};
use yousoul::auth::{SharedIdentity, USER_ID_HEADER};
use yousoul::http::middleware::REQUEST_ID_HEADER;
use yousoul::http::{AppState, build_router};
use yousoul::model::User;
use yousoul::reflections::SignedUrlPresigner;
use yousoul::storage::SqliteStorage;

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::with_identity(Arc::new(HeaderIdentity)).await
    }

    async fn with_identity(identity: SharedIdentity) -> Self {
        let storage = SqliteStorage::open_memory().unwrap();
        let presigner =
            Arc::new(SignedUrlPresigner::new("http://storage.test/objects", "secret").unwrap());
        let app = build_router(AppState::new(storage, identity, presigner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn get(&self, user: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header(USER_ID_HEADER, user)
    }

    fn post(&self, user: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header(USER_ID_HEADER, user)
    }

    fn patch(&self, user: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).header(USER_ID_HEADER, user)
    }

    fn put(&self, user: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).header(USER_ID_HEADER, user)
    }

    fn delete(&self, user: &str, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header(USER_ID_HEADER, user)
    }

    async fn create(&self, user: &str, body: Value) -> Value {
        let response = self.post(user, "/api/tasks").json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json::<Value>().await.unwrap()["data"].clone()
    }
}

async fn body(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::start().await;
    let (status, json) = body(
        server
            .client
            .get(server.url("/api/public/health"))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn requests_without_identity_get_401() {
    let server = TestServer::start().await;
    for path in ["/api/tasks", "/api/preferences", "/api/me"] {
        let (status, json) = body(server.client.get(server.url(path)).send().await.unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(json["error"], "Unauthenticated");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let server = TestServer::start().await;
    let (status, json) = body(server.get("u1", "/api/nope").send().await.unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn me_echoes_identity_headers() {
    let server = TestServer::start().await;
    let (status, json) = body(
        server
            .get("user_1", "/api/me")
            .header("x-user-name", "Sam")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], "user_1");
    assert_eq!(json["data"]["name"], "Sam");
}

#[tokio::test]
async fn token_auth_maps_bearer_to_user() {
    let identity = StaticTokenIdentity::new().with_token("dev", User::new("user_9"));
    let server = TestServer::with_identity(Arc::new(identity)).await;

    let (status, json) = body(
        server
            .client
            .get(server.url("/api/me"))
            .bearer_auth("dev")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], "user_9");

    let response = server
        .client
        .get(server.url("/api/me"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_with_only_title_uses_defaults() {
    let server = TestServer::start().await;
    let task = server.create("u1", json!({ "title": "Water plants" })).await;

    assert_eq!(task["title"], "Water plants");
    assert_eq!(task["status"], "backlog");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["orderIndex"], 0);
    assert_eq!(task["userId"], "u1");
    assert!(task["createdAt"].as_i64().unwrap() > 0);
    assert!(task["completedAt"].is_null());
}

#[tokio::test]
async fn create_treats_blank_status_and_priority_as_missing() {
    let server = TestServer::start().await;
    let task = server
        .create("u1", json!({ "title": "x", "status": "", "priority": "" }))
        .await;

    assert_eq!(task["status"], "backlog");
    assert_eq!(task["priority"], "medium");
}

#[tokio::test]
async fn create_validates_input() {
    let server = TestServer::start().await;

    let (status, json) = body(
        server
            .post("u1", "/api/tasks")
            .json(&json!({ "description": "no title" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("title"));

    let (status, json) = body(
        server
            .post("u1", "/api/tasks")
            .json(&json!({ "title": "x", "status": "dnoe" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["hint"].as_str().unwrap().contains("done"));

    let response = server
        .post("u1", "/api/tasks")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completing_sets_completed_at_once() {
    let server = TestServer::start().await;
    let task = server.create("u1", json!({ "title": "Ship it" })).await;
    let path = format!("/api/tasks/{}", task["id"]);

    let (_, done) = body(
        server
            .patch("u1", &path)
            .json(&json!({ "status": "done" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let completed_at = done["data"]["completedAt"].as_i64().unwrap();

    let (_, later) = body(
        server
            .patch("u1", &path)
            .json(&json!({ "completedMood": "proud", "reflectionNote": "Finally" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(later["data"]["completedAt"].as_i64(), Some(completed_at));
    assert_eq!(later["data"]["completedMood"], "proud");

    let (_, explicit) = body(
        server
            .patch("u1", &path)
            .json(&json!({ "completedAt": 42 }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(explicit["data"]["completedAt"], 42);
}

#[tokio::test]
async fn other_users_tasks_are_404() {
    let server = TestServer::start().await;
    let task = server.create("alice", json!({ "title": "Private" })).await;
    let path = format!("/api/tasks/{}", task["id"]);

    let response = server.get("bob", &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .patch("bob", &path)
        .json(&json!({ "title": "Mine now" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server.delete("bob", &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (_, list) = body(server.get("bob", "/api/tasks").send().await.unwrap()).await;
    assert_eq!(list["data"], json!([]));

    let response = server.get("alice", &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_task_id_is_400() {
    let server = TestServer::start().await;
    for id in ["abc", "0", "-3"] {
        let response = server
            .get("u1", &format!("/api/tasks/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{id}");
    }
}

#[tokio::test]
async fn delete_removes_task() {
    let server = TestServer::start().await;
    let task = server.create("u1", json!({ "title": "Gone soon" })).await;
    let path = format!("/api/tasks/{}", task["id"]);

    let (status, json) = body(server.delete("u1", &path).send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["success"], true);

    let response = server.delete("u1", &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reorder_changes_listing_order() {
    let server = TestServer::start().await;
    let first = server.create("u1", json!({ "title": "First" })).await;
    let second = server.create("u1", json!({ "title": "Second" })).await;

    let (status, json) = body(
        server
            .post("u1", "/api/tasks/reorder")
            .json(&json!({ "items": [
                { "id": first["id"], "orderIndex": 5 },
                { "id": second["id"], "orderIndex": 3 }
            ]}))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["updated"], 2);

    let (_, list) = body(server.get("u1", "/api/tasks").send().await.unwrap()).await;
    let titles: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn reorder_requires_array() {
    let server = TestServer::start().await;
    for payload in [json!({ "items": "nope" }), json!({})] {
        let (status, json) = body(
            server
                .post("u1", "/api/tasks/reorder")
                .json(&payload)
                .send()
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Items must be an array");
    }
}

#[tokio::test]
async fn reorder_ignores_other_users_tasks() {
    let server = TestServer::start().await;
    let theirs = server.create("alice", json!({ "title": "Alice's" })).await;

    let (_, json) = body(
        server
            .post("u1", "/api/tasks/reorder")
            .json(&json!({ "items": [{ "id": theirs["id"], "orderIndex": 9 }] }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["data"]["updated"], 0);

    let (_, task) = body(
        server
            .get("alice", &format!("/api/tasks/{}", theirs["id"]))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(task["data"]["orderIndex"], 0);
}

#[tokio::test]
async fn preferences_default_then_upsert() {
    let server = TestServer::start().await;

    let (status, json) = body(server.get("u1", "/api/preferences").send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["emojiSet"], "default");
    assert_eq!(json["data"]["colorPalette"], "vibrant");
    assert_eq!(json["data"]["visualizationIntensity"], "balanced");
    assert!(json["data"].get("createdAt").is_none());

    let (status, json) = body(
        server
            .put("u1", "/api/preferences")
            .json(&json!({ "emojiSet": "nature" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["emojiSet"], "nature");

    let (status, json) = body(
        server
            .put("u1", "/api/preferences")
            .json(&json!({ "colorPalette": "pastel" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["emojiSet"], "nature");
    assert_eq!(json["data"]["colorPalette"], "pastel");
    assert_eq!(json["data"]["visualizationIntensity"], "balanced");
}

#[tokio::test]
async fn preferences_reject_unknown_values() {
    let server = TestServer::start().await;
    let response = server
        .put("u1", "/api/preferences")
        .json(&json!({ "colorPalette": "neon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reflection_urls() {
    let server = TestServer::start().await;

    let (status, json) = body(
        server
            .post("u1", "/api/reflections/upload-url")
            .json(&json!({ "filename": "sunset.jpg" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let upload = &json["data"];
    assert_eq!(upload["path"], "u1/sunset.jpg");
    assert_eq!(upload["s3Uri"], "s3://reflections/u1/sunset.jpg");
    assert!(
        upload["uploadUrl"]
            .as_str()
            .unwrap()
            .starts_with("http://storage.test/objects/reflections/u1/sunset.jpg?")
    );
    assert!(upload["expiresAt"].as_i64().unwrap() > 0);

    let (status, json) = body(
        server
            .get("u1", "/api/reflections/download-url")
            .query(&[("s3Uri", "s3://reflections/u1/sunset.jpg")])
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["downloadUrl"].as_str().unwrap().contains("method=GET"));

    let response = server
        .get("u2", "/api/reflections/download-url")
        .query(&[("s3Uri", "s3://reflections/u1/sunset.jpg")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, json) = body(
        server
            .get("u1", "/api/reflections/download-url")
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("s3Uri"));
}

#[tokio::test]
async fn download_url_rejects_dot_segments() {
    let server = TestServer::start().await;

    for uri in [
        "s3://reflections/u1/../u2/secret.jpg",
        "s3://reflections/u1/./sunset.jpg",
        "s3://reflections/u1//sunset.jpg",
    ] {
        let (status, json) = body(
            server
                .get("u1", "/api/reflections/download-url")
                .query(&[("s3Uri", uri)])
                .send()
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["code"], "INVALID_ARGUMENT");
    }
}

#[tokio::test]
async fn request_id_is_echoed() {
    let server = TestServer::start().await;

    let response = server
        .get("u1", "/api/tasks")
        .header(REQUEST_ID_HEADER, "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");

    let response = server.get("u1", "/api/tasks").send().await.unwrap();
    let generated = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn activity_lists_callers_changes() {
    let server = TestServer::start().await;
    let task = server.create("u1", json!({ "title": "Log me" })).await;
    server
        .patch("u1", &format!("/api/tasks/{}", task["id"]))
        .json(&json!({ "status": "done" }))
        .send()
        .await
        .unwrap();
    server.create("u2", json!({ "title": "Someone else" })).await;

    let (status, json) = body(server.get("u1", "/api/activity").send().await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let events = json["data"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["eventType"], "task_completed");
    assert_eq!(events[0]["newValue"], "done");
    assert_eq!(events[1]["eventType"], "task_created");

    let response = server
        .get("u1", "/api/activity?limit=0")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
