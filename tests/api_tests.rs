use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use adboard::api::AppState;
use adboard::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret-integration-test-secret";

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("adboard-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;

    let state = adboard::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = adboard::api::router(state.clone());
    (state, router)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, axum::http::HeaderMap) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json, headers)
}

async fn register(app: &Router, username: &str, password: &str) -> Value {
    let (status, body, _) = send(
        app,
        "POST",
        "/user",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body, _) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["token_type"], "bearer");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn create_ad(app: &Router, token: &str, title: &str, author: &str, price: f64) -> Value {
    let (status, body, _) = send(
        app,
        "POST",
        "/advertisement",
        Some(token),
        Some(json!({
            "title": title,
            "description": format!("{title} in good condition"),
            "price": price,
            "author": author,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn test_register_login_and_create_advertisement() {
    let (_, app) = spawn_app().await;

    let alice = register(&app, "alice", "pw1").await;
    assert_eq!(alice["username"], "alice");
    assert_eq!(alice["group"], "user");
    assert!(alice.get("password_hash").is_none());

    let token = login(&app, "alice", "pw1").await;
    assert_eq!(token.split('.').count(), 3);

    let ad = create_ad(&app, &token, "Bike", "Alice", 120.0).await;
    assert_eq!(ad["owner_id"], alice["id"]);
    assert_eq!(ad["title"], "Bike");
    assert!(ad["created_at"].is_string());

    let (status, body, _) = send(
        &app,
        "POST",
        "/user",
        None,
        Some(json!({ "username": "alice", "password": "other" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (_, app) = spawn_app().await;
    register(&app, "alice", "pw1").await;

    for (username, password) in [("alice", "wrong"), ("nobody", "pw1")] {
        let (status, body, _) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Incorrect username or password");
    }
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let (_, app) = spawn_app().await;
    let alice = register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;

    let (status, body, _) = send(&app, "GET", "/user/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], alice["id"]);

    let (status, _, headers) = send(&app, "GET", "/user/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let (status, _, _) = send(&app, "GET", "/user/me", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_read_but_not_delete() {
    let (_, app) = spawn_app().await;
    register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;
    let ad = create_ad(&app, &token, "Lamp", "Alice", 15.0).await;
    let uri = format!("/advertisement/{}", ad["id"]);

    let (status, body, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Lamp");

    let (status, _, headers) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    // A garbage token on a tolerant endpoint is treated as anonymous.
    let (status, _, _) = send(&app, "DELETE", &uri, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        "POST",
        "/advertisement",
        None,
        Some(json!({ "title": "x", "description": "y", "price": 1.0, "author": "z" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let (_, app) = spawn_app().await;
    register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;
    let ad = create_ad(&app, &token, "Sofa", "Alice", 300.0).await;
    let uri = format!("/advertisement/{}", ad["id"]);

    let (status, body, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "price": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let updated = &body["data"];
    assert_eq!(updated["price"], 10.0);
    assert_eq!(updated["title"], ad["title"]);
    assert_eq!(updated["description"], ad["description"]);
    assert_eq!(updated["author"], ad["author"]);
    assert_eq!(updated["created_at"], ad["created_at"]);
    assert_eq!(updated["owner_id"], ad["owner_id"]);
}

#[tokio::test]
async fn test_ownership_and_admin_override() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "pw1").await;
    register(&app, "bob", "pw2").await;
    state
        .user_service()
        .ensure_admin("root", "rootpw")
        .await
        .unwrap();

    let alice = login(&app, "alice", "pw1").await;
    let bob = login(&app, "bob", "pw2").await;
    let root = login(&app, "root", "rootpw").await;

    let ad = create_ad(&app, &alice, "Desk", "Alice", 80.0).await;
    let uri = format!("/advertisement/{}", ad["id"]);

    let (status, _, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&bob),
        Some(json!({ "title": "Mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(&root),
        Some(json!({ "title": "Moderated" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Moderated");

    let (status, _, _) = send(&app, "DELETE", &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_resource_is_404_before_auth() {
    let (_, app) = spawn_app().await;

    let (status, _, _) = send(&app, "DELETE", "/advertisement/9999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "PATCH", "/user/9999", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, "GET", "/advertisement/0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_self_service_and_group_changes() {
    let (state, app) = spawn_app().await;
    let alice = register(&app, "alice", "pw1").await;
    let bob = register(&app, "bob", "pw2").await;
    state
        .user_service()
        .ensure_admin("root", "rootpw")
        .await
        .unwrap();

    let alice_token = login(&app, "alice", "pw1").await;
    let root_token = login(&app, "root", "rootpw").await;
    let alice_uri = format!("/user/{}", alice["id"]);
    let bob_uri = format!("/user/{}", bob["id"]);

    let (status, _, _) = send(&app, "GET", &bob_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    // Self-promotion is refused even though alice owns the record.
    let (status, _, _) = send(
        &app,
        "PATCH",
        &alice_uri,
        Some(&alice_token),
        Some(json!({ "group": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        "PATCH",
        &bob_uri,
        Some(&alice_token),
        Some(json!({ "username": "robert" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Renaming onto a taken username conflicts.
    let (status, _, _) = send(
        &app,
        "PATCH",
        &alice_uri,
        Some(&alice_token),
        Some(json!({ "username": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body, _) = send(
        &app,
        "PATCH",
        &alice_uri,
        Some(&root_token),
        Some(json!({ "group": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["group"], "admin");

    // The promotion takes effect on alice's next request.
    let (status, _, _) = send(&app, "DELETE", &bob_uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", &bob_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let (_, app) = spawn_app().await;
    let alice = register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;

    let uri = format!("/user/{}", alice["id"]);
    let (status, _, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/user/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_filters() {
    let (_, app) = spawn_app().await;
    register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;

    create_ad(&app, &token, "Red Bicycle", "Alice Smith", 100.0).await;
    create_ad(&app, &token, "Blue bicycle", "Bob", 50.0).await;
    create_ad(&app, &token, "Sofa", "alice", 300.0).await;

    let (status, body, _) = send(&app, "GET", "/advertisement?title=BICYCLE", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body, _) = send(&app, "GET", "/advertisement?author=alice", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body, _) = send(
        &app,
        "GET",
        "/advertisement?min_price=50&max_price=100",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body, _) = send(&app, "GET", "/advertisement", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, _, _) = send(
        &app,
        "GET",
        "/advertisement?min_price=100&max_price=50",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_validation() {
    let (_, app) = spawn_app().await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/user",
        None,
        Some(json!({ "username": "", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "POST",
        "/user",
        None,
        Some(json!({ "username": "alice", "password": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let (_, app) = spawn_app().await;

    let (status, body, headers) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let (_, app) = spawn_app().await;
    let alice = register(&app, "alice", "pw1").await;
    let token = login(&app, "alice", "pw1").await;

    let (status, body, _) = send(
        &app,
        "POST",
        "/advertisement",
        Some(&token),
        Some(json!({ "title": "Bike", "description": "d", "author": "Alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let uri = format!("/user/{}", alice["id"]);
    let (status, body, _) =
        send(&app, "PATCH", &uri, Some(&token), Some(json!({ "group": "root" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body, _) = send(&app, "GET", "/advertisement/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body, _) =
        send(&app, "GET", "/advertisement?min_price=cheap", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Body without a JSON content type.
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .body(Body::from(r#"{"username":"alice","password":"pw1"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_registration_of_one_username() {
    let (_, app) = spawn_app().await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let (status, body, _) = send(
                    &app,
                    "POST",
                    "/user",
                    None,
                    Some(json!({ "username": "alice", "password": "pw1" })),
                )
                .await;
                (status, body)
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => assert_eq!(body["success"], false),
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_registration_of_distinct_usernames() {
    let (_, app) = spawn_app().await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let (status, body, _) = send(
                    &app,
                    "POST",
                    "/user",
                    None,
                    Some(json!({ "username": format!("user{i}"), "password": "pw1" })),
                )
                .await;
                (status, body)
            })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
}
