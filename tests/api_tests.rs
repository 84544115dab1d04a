//! HTTP-level tests driving the router with `tower::ServiceExt::oneshot`.

use agora::config::Config;
use agora::entities::users::Role;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: std::sync::Arc<agora::api::AppState>,
}

async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

async fn spawn_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let db_path = std::env::temp_dir().join(format!("agora-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    customize(&mut config);

    let state = agora::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: agora::api::router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value, axum::http::HeaderMap) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json, headers)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, json, _) = self.send(request).await;
        (status, json)
    }

    /// Registers `username` and returns `(user_id, token)`.
    async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "name": "Test User",
                    "password": "secret1",
                    "confirm_password": "secret1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        (
            body["data"]["user"]["id"].as_str().unwrap().to_string(),
            body["data"]["session"]["token"]
                .as_str()
                .unwrap()
                .to_string(),
        )
    }

    async fn register_admin(&self, username: &str) -> (String, String) {
        let (id, token) = self.register(username).await;
        self.state
            .store()
            .user_repo()
            .set_role(id.parse().unwrap(), Role::Admin)
            .await
            .unwrap();
        (id, token)
    }
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body, headers) = app
        .send(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = spawn_app().await;

    for uri in ["/api/auth/me", "/api/posts", "/api/users", "/api/metrics"] {
        let (status, body) = app.call("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    let (status, _) = app
        .call("GET", "/api/auth/me", Some(&"f".repeat(64)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_sets_cookie_and_me_accepts_both_transports() {
    let app = spawn_app().await;

    let (status, body, headers) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    json!({
                        "username": "alice",
                        "name": "Alice",
                        "password": "secret1",
                        "confirm_password": "secret1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["data"]["session"]["token"].as_str().unwrap();
    let cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with(&format!("sessionToken={token}")));
    for attribute in ["Path=/", "HttpOnly", "Secure", "SameSite=Strict"] {
        assert!(cookie.contains(attribute), "{attribute} missing from {cookie}");
    }

    let (status, me) = app.call("GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["user"]["username"], "alice");
    assert_eq!(me["data"]["user"]["role"], "user");

    let (status, me, _) = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, format!("theme=dark; sessionToken={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn test_auth_errors() {
    let app = spawn_app().await;
    app.register("bob").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "has space",
                "name": "",
                "password": "abc",
                "confirm_password": "abc",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"password"));

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "username": "bob",
                "name": "Bob Again",
                "password": "secret1",
                "confirm_password": "secret1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .call("POST", "/api/auth/login", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "bob", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["session"]["token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_logout_revokes_the_token() {
    let app = spawn_app().await;
    let (_, token) = app.register("carol").await;

    let (status, sessions) = app
        .call("GET", "/api/auth/sessions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions["data"].as_array().unwrap().len(), 1);
    assert!(sessions["data"][0].get("token").is_none());

    let (status, refreshed) = app
        .call("POST", "/api/auth/refresh", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["data"]["expires_at"].is_string());

    let (status, _, headers) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let (status, _) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_lifecycle_over_http() {
    let app = spawn_app().await;
    let (_, owner) = app.register("owner").await;
    let (_, stranger) = app.register("stranger").await;
    let (admin_id, admin) = app.register_admin("admin").await;

    let (status, created) = app
        .call("POST", "/api/posts", Some(&owner), Some(json!({ "body": "hello" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let post_id = created["data"]["id"].as_str().unwrap().to_string();
    let post_uri = format!("/api/posts/{post_id}");

    let (status, _) = app
        .call("PUT", &post_uri, Some(&stranger), Some(json!({ "body": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = app
        .call("PUT", &post_uri, Some(&admin), Some(json!({ "body": "moderated" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["data"]["is_edited_by_admin"], true);
    assert_eq!(edited["data"]["edited_by"], admin_id.as_str());

    let (status, comment) = app
        .call(
            "POST",
            &format!("{post_uri}/comments"),
            Some(&stranger),
            Some(json!({ "body": "nice" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["data"]["post_id"], post_id.as_str());

    let (status, _) = app.call("DELETE", &post_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("GET", &post_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("POST", &format!("{post_uri}/restore"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("DELETE", &post_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, restored) = app
        .call("POST", &format!("{post_uri}/restore"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["data"]["is_deleted"], false);

    let (status, listed) = app.call("GET", "/api/posts", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"]["total"], 1);
}

#[tokio::test]
async fn test_request_validation() {
    let app = spawn_app().await;
    let (_, token) = app.register("dave").await;

    let (status, _) = app
        .call("GET", "/api/posts/not-a-uuid", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("GET", "/api/posts?limit=0", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("GET", "/api/posts?page=0", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("GET", "/api/posts?user_id=nope", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("POST", "/api/posts", Some(&token), Some(json!({ "body": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "body");
}

#[tokio::test]
async fn test_role_management_requires_admin() {
    let app = spawn_app().await;
    let (erin_id, erin) = app.register("erin").await;
    let (_, admin) = app.register_admin("root").await;

    let uri = format!("/api/users/{erin_id}/role");

    let (status, _) = app
        .call("PUT", &uri, Some(&erin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("PUT", &uri, Some(&admin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, me) = app.call("GET", "/api/users/me", Some(&erin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["role"], "admin");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = spawn_app().await;
    let (_, token) = app.register("frank").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("not enabled"));
}

async fn login_from(app: &TestApp, forwarded_for: &str) -> String {
    let (_, body, _) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .header("x-forwarded-for", forwarded_for)
                .body(Body::from(
                    json!({ "username": "gail", "password": "secret1" }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    body["data"]["session"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_forwarded_for_is_ignored_unless_trusted() {
    let app = spawn_app().await;
    app.register("gail").await;
    let token = login_from(&app, "203.0.113.9").await;

    let (_, sessions) = app
        .call("GET", "/api/auth/sessions", Some(&token), None)
        .await;
    assert!(
        sessions["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["ip_address"] != "203.0.113.9")
    );

    let trusting = spawn_app_with(|config| config.server.trust_forwarded_for = true).await;
    trusting.register("gail").await;
    let token = login_from(&trusting, "203.0.113.9, 10.0.0.1").await;

    let (_, sessions) = trusting
        .call("GET", "/api/auth/sessions", Some(&token), None)
        .await;
    assert_eq!(sessions["data"][0]["ip_address"], "203.0.113.9");
}
