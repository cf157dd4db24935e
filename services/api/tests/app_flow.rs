//! Integration tests for the task-tracking API.
//!
//! These drive the full router over the in-memory backend and cover:
//! - Page gating and redirects for signed-out and signed-in visitors
//! - Signup, login, and logout flows with the session cookie
//! - The task CRUD round trip, including the delete confirmation step
//! - Search/filter derivation and cross-user isolation

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_lib::adapters::MemoryStore;
use api_lib::config::{Config, StoreBackend};
use api_lib::web::{app_router, state::AppState};

//=========================================================================================
// Test Harness
//=========================================================================================

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().expect("test bind address"),
            store_backend: StoreBackend::Memory,
            database_url: None,
            log_level: tracing::Level::INFO,
            cors_origin: "http://localhost:3000".to_string(),
            session_ttl_days: 30,
        });
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(store.clone(), store, config));
        let router = app_router(state).expect("router builds");
        Self { router }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request handled")
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.json_request("POST", uri, cookie, body).await
    }

    async fn put_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.json_request("PUT", uri, cookie, body).await
    }

    async fn json_request(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Value,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).expect("request"))
            .await
    }

    async fn bare(&self, method: &str, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    /// Signs a fresh account up and returns its session cookie.
    async fn signup(&self, email: &str) -> String {
        let response = self
            .post_json(
                "/auth/signup",
                None,
                json!({ "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        cookie_from(&response)
    }
}

fn cookie_from(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("cookie is ascii")
        .split(';')
        .next()
        .expect("cookie value")
        .to_string()
}

async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collected")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is json")
}

fn location_of(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("location is ascii")
}

//=========================================================================================
// Page Gating
//=========================================================================================

#[tokio::test]
async fn signed_out_visitors_are_gated() {
    let app = TestApp::new();

    let landing = app.get("/", None).await;
    assert_eq!(landing.status(), StatusCode::OK);
    let landing = body_json(landing).await;
    assert_eq!(landing["page"], "landing");
    assert_eq!(landing["signed_in"], false);
    assert_eq!(landing["call_to_action"], "/signup");

    let login = app.get("/login", None).await;
    assert_eq!(login.status(), StatusCode::OK);
    assert_eq!(body_json(login).await["page"], "login");

    let gated = app.get("/app", None).await;
    assert_eq!(gated.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&gated), "/login");

    let denied = app
        .post_json(
            "/tasks",
            None,
            json!({ "title": "nope", "priority": "low", "status": "pending" }),
        )
        .await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_in_visitors_skip_the_auth_forms() {
    let app = TestApp::new();
    let cookie = app.signup("gate@example.test").await;

    let landing = body_json(app.get("/", Some(&cookie)).await).await;
    assert_eq!(landing["signed_in"], true);
    assert_eq!(landing["call_to_action"], "/app");

    for path in ["/login", "/signup"] {
        let response = app.get(path, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location_of(&response), "/app");
    }

    let page = app.get("/app", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    let page = body_json(page).await;
    assert_eq!(page["phase"], "ready");
    assert_eq!(page["tasks"], json!([]));
    assert_eq!(page["stats"]["total"], 0);
}

//=========================================================================================
// Auth Flows
//=========================================================================================

#[tokio::test]
async fn duplicate_signup_is_a_conflict() {
    let app = TestApp::new();
    app.signup("taken@example.test").await;

    let response = app
        .post_json(
            "/auth/signup",
            None,
            json!({ "email": "taken@example.test", "password": "other" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_verifies_the_password() {
    let app = TestApp::new();
    let cookie = app.signup("login@example.test").await;
    let logout = app.bare("POST", "/auth/logout", Some(&cookie)).await;
    assert_eq!(logout.status(), StatusCode::OK);

    let wrong = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "login@example.test", "password": "incorrect horse" }),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let right = app
        .post_json(
            "/auth/login",
            None,
            json!({ "email": "login@example.test", "password": "correct horse" }),
        )
        .await;
    assert_eq!(right.status(), StatusCode::OK);
    let cookie = cookie_from(&right);
    let page = app.get("/app", Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new();
    let cookie = app.signup("leaver@example.test").await;

    let logout = app.bare("POST", "/auth/logout", Some(&cookie)).await;
    assert_eq!(logout.status(), StatusCode::OK);

    // The old cookie no longer opens the task page.
    let gated = app.get("/app", Some(&cookie)).await;
    assert_eq!(gated.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&gated), "/login");
}

//=========================================================================================
// Task Operations
//=========================================================================================

#[tokio::test]
async fn create_toggle_filter_and_delete_round_trip() {
    let app = TestApp::new();
    let cookie = app.signup("worker@example.test").await;

    // Create.
    let created = app
        .post_json(
            "/tasks",
            Some(&cookie),
            json!({ "title": "Buy beans", "priority": "high", "status": "pending" }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await;
    assert_eq!(created["title"], "Buy beans");
    assert_eq!(created["priority"], "high");
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().expect("task id").to_string();

    let page = body_json(app.get("/app", Some(&cookie)).await).await;
    assert_eq!(page["tasks"].as_array().expect("tasks").len(), 1);
    assert_eq!(page["tasks"][0]["id"], created["id"]);
    assert_eq!(page["stats"]["pending"], 1);

    // Toggle.
    let toggled = app
        .bare("POST", &format!("/tasks/{}/toggle", id), Some(&cookie))
        .await;
    assert_eq!(toggled.status(), StatusCode::OK);
    assert_eq!(body_json(toggled).await["status"], "completed");

    // Filter and search views.
    let pending = body_json(app.get("/app?filter=pending", Some(&cookie)).await).await;
    assert_eq!(pending["tasks"], json!([]));
    let completed = body_json(app.get("/app?filter=completed", Some(&cookie)).await).await;
    assert_eq!(completed["tasks"].as_array().expect("tasks").len(), 1);

    let miss = body_json(app.get("/app?search=grinder&filter=all", Some(&cookie)).await).await;
    assert_eq!(miss["tasks"], json!([]));
    let hit = body_json(app.get("/app?search=BEANS", Some(&cookie)).await).await;
    assert_eq!(hit["tasks"].as_array().expect("tasks").len(), 1);
    // The search term is page state and sticks until changed.
    assert_eq!(hit["search"], "BEANS");

    // Delete needs explicit confirmation.
    let unconfirmed = app
        .bare("DELETE", &format!("/tasks/{}", id), Some(&cookie))
        .await;
    assert_eq!(unconfirmed.status(), StatusCode::CONFLICT);
    let page = body_json(app.get("/app?search=", Some(&cookie)).await).await;
    assert_eq!(page["pending_delete"], created["id"]);
    assert_eq!(page["tasks"].as_array().expect("tasks").len(), 1);

    let confirmed = app
        .bare(
            "DELETE",
            &format!("/tasks/{}?confirm=true", id),
            Some(&cookie),
        )
        .await;
    assert_eq!(confirmed.status(), StatusCode::OK);
    assert_eq!(body_json(confirmed).await["deleted"], created["id"]);

    let page = body_json(app.get("/app", Some(&cookie)).await).await;
    assert_eq!(page["tasks"], json!([]));
    assert_eq!(page["stats"]["total"], 0);
}

#[tokio::test]
async fn whitespace_titles_are_rejected() {
    let app = TestApp::new();
    let cookie = app.signup("strict@example.test").await;

    let response = app
        .post_json(
            "/tasks",
            Some(&cookie),
            json!({ "title": "   ", "priority": "low", "status": "pending" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = body_json(app.get("/app", Some(&cookie)).await).await;
    assert_eq!(page["tasks"], json!([]));
    // The rejection reaches the page as a notice.
    assert_eq!(page["notices"].as_array().expect("notices").len(), 1);
}

#[tokio::test]
async fn editing_takes_a_snapshot_and_patches_on_submit() {
    let app = TestApp::new();
    let cookie = app.signup("editor@example.test").await;

    let created = body_json(
        app.post_json(
            "/tasks",
            Some(&cookie),
            json!({ "title": "Draft notes", "priority": "low", "status": "pending" }),
        )
        .await,
    )
    .await;
    let id = created["id"].as_str().expect("task id").to_string();

    // Submitting without entering editing mode is rejected.
    let blind = app
        .put_json(
            &format!("/tasks/{}", id),
            Some(&cookie),
            json!({ "title": "Sneaky", "priority": "low", "status": "pending" }),
        )
        .await;
    assert_eq!(blind.status(), StatusCode::CONFLICT);

    // Begin, then cancel: nothing changes.
    let snapshot = app
        .bare("POST", &format!("/tasks/{}/edit", id), Some(&cookie))
        .await;
    assert_eq!(snapshot.status(), StatusCode::OK);
    assert_eq!(body_json(snapshot).await["title"], "Draft notes");
    let cancelled = app.bare("POST", "/tasks/edit/cancel", Some(&cookie)).await;
    assert_eq!(cancelled.status(), StatusCode::NO_CONTENT);
    let page = body_json(app.get("/app", Some(&cookie)).await).await;
    assert_eq!(page["tasks"][0]["title"], "Draft notes");
    assert_eq!(page["editing"], Value::Null);

    // Begin, then submit: the mutable fields change, the id stays.
    app.bare("POST", &format!("/tasks/{}/edit", id), Some(&cookie))
        .await;
    let updated = app
        .put_json(
            &format!("/tasks/{}", id),
            Some(&cookie),
            json!({ "title": "Publish notes", "priority": "high", "status": "completed" }),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = body_json(updated).await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["title"], "Publish notes");
    assert_eq!(updated["created_at"], created["created_at"]);
}

//=========================================================================================
// Isolation
//=========================================================================================

#[tokio::test]
async fn tasks_never_leak_across_users() {
    let app = TestApp::new();

    let u1 = app.signup("u1@example.test").await;
    app.post_json(
        "/tasks",
        Some(&u1),
        json!({ "title": "Buy beans", "priority": "high", "status": "pending" }),
    )
    .await;
    let page = body_json(app.get("/app", Some(&u1)).await).await;
    assert_eq!(page["tasks"].as_array().expect("tasks").len(), 1);

    // A second account sees an empty page even though u1's task still
    // exists in the store.
    let u2 = app.signup("u2@example.test").await;
    let page = body_json(app.get("/app", Some(&u2)).await).await;
    assert_eq!(page["tasks"], json!([]));
    assert_eq!(page["stats"]["total"], 0);

    // And u1 still has it.
    let page = body_json(app.get("/app", Some(&u1)).await).await;
    assert_eq!(page["tasks"].as_array().expect("tasks").len(), 1);
}
