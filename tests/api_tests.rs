use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use vitalis::Config;

fn write_artifact(dir: &std::path::Path, name: &str, feature_count: usize) -> String {
    let artifact = json!({
        "name": name,
        "feature_count": feature_count,
        "mean": vec![0.0; feature_count],
        "scale": vec![1.0; feature_count],
        "weights": vec![1.0; feature_count],
        "bias": -0.5,
    });

    let path = dir.join(format!("{name}.json"));
    std::fs::write(&path, artifact.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

async fn spawn_app() -> Router {
    let dir = std::env::temp_dir().join(format!("vitalis-api-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", dir.join("app.db").display());
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.models.diabetes_path = write_artifact(&dir, "diabetes", 8);
    config.models.heart_disease_path = write_artifact(&dir, "heart_disease", 13);
    config.models.parkinsons_path = write_artifact(&dir, "parkinsons", 22);

    let (app, _state) = vitalis::test_app(config).await.unwrap();
    app
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
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
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, set_cookie, body)
}

async fn login(app: &Router, identifier: &str, password: &str) -> String {
    let (status, cookie, _) = send_json(
        app,
        "POST",
        "/api/auth/login",
        Some(json!({ "identifier": identifier, "password": password })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed for {identifier}");
    cookie.expect("login should set a session cookie")
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> StatusCode {
    let (status, _, _) = send_json(
        app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "username": username,
            "email": email,
            "password": password,
            "confirm_password": password,
        })),
        None,
    )
    .await;
    status
}

#[tokio::test]
async fn test_seeded_admin_can_log_in() {
    let app = spawn_app().await;

    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, body) =
        send_json(&app, "GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["is_admin"], true);
}

#[tokio::test]
async fn test_register_then_login_flow() {
    let app = spawn_app().await;

    let status = register(&app, "frank", "frank@example.com", "secret99").await;
    assert_eq!(status, StatusCode::OK);

    // New accounts never come out privileged.
    let cookie = login(&app, "frank@example.com", "secret99").await;
    let (_, _, body) = send_json(&app, "GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(body["data"]["is_admin"], false);

    // Duplicate registration is rejected without side effects.
    let status = register(&app, "frank", "other@example.com", "secret99").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;

    let (status, cookie, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "identifier": "admin", "password": "not-the-password" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = spawn_app().await;

    // Too short.
    let status = register(&app, "grace", "grace@example.com", "tiny").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Mismatched confirmation.
    let (status, _, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "username": "grace",
            "email": "grace@example.com",
            "password": "secret99",
            "confirm_password": "different99",
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    let app = spawn_app().await;

    let (status, _, _) = send_json(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send_json(
        &app,
        "POST",
        "/api/predict/diabetes",
        Some(json!({ "features": vec![1.0; 8] })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, _) = send_json(&app, "POST", "/api/auth/logout", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send_json(&app, "GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_for_deleted_account_is_stale() {
    let app = spawn_app().await;

    register(&app, "kevin", "kevin@example.com", "secret99").await;
    let kevin_cookie = login(&app, "kevin", "secret99").await;

    let admin_cookie = login(&app, "admin", "admin123").await;
    let (_, _, body) =
        send_json(&app, "GET", "/api/admin/users", None, Some(&admin_cookie)).await;
    let kevin_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "kevin")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, _, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/admin/users/{kevin_id}"),
        None,
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The surviving session no longer maps to an account.
    let (status, _, _) = send_json(&app, "GET", "/api/auth/me", None, Some(&kevin_cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_prediction_is_deterministic_per_disease() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    for (uri, count) in [
        ("/api/predict/diabetes", 8),
        ("/api/predict/heart", 13),
        ("/api/predict/parkinsons", 22),
    ] {
        let features = json!({ "features": vec![1.0; count] });

        let (status, _, first) =
            send_json(&app, "POST", uri, Some(features.clone()), Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        let label = first["data"]["label"].as_u64().unwrap();
        assert!(label == 0 || label == 1);

        let (_, _, second) = send_json(&app, "POST", uri, Some(features), Some(&cookie)).await;
        assert_eq!(first["data"]["label"], second["data"]["label"]);
    }
}

#[tokio::test]
async fn test_prediction_rejects_wrong_feature_count() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, body) = send_json(
        &app,
        "POST",
        "/api/predict/diabetes",
        Some(json!({ "features": [1.0, 2.0, 3.0] })),
        Some(&cookie),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_regular_users() {
    let app = spawn_app().await;

    register(&app, "heidi", "heidi@example.com", "secret99").await;
    let cookie = login(&app, "heidi", "secret99").await;

    let (status, _, _) = send_json(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send_json(&app, "GET", "/api/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_can_list_edit_and_delete_users() {
    let app = spawn_app().await;

    register(&app, "ivan", "ivan@example.com", "secret99").await;
    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, body) = send_json(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    let ivan = users
        .iter()
        .find(|u| u["username"] == "ivan")
        .expect("registered user should be listed");
    let ivan_id = ivan["id"].as_i64().unwrap();

    // Edit without a password, granting admin.
    let (status, _, body) = send_json(
        &app,
        "PUT",
        &format!("/api/admin/users/{ivan_id}"),
        Some(json!({
            "username": "ivan",
            "email": "ivan@example.org",
            "is_admin": true,
            "password": "",
        })),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ivan@example.org");
    assert_eq!(body["data"]["is_admin"], true);

    // Old password still works because the empty field means "unchanged".
    login(&app, "ivan", "secret99").await;

    let (status, _, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/admin/users/{ivan_id}"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send_json(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["username"] != "ivan")
    );
}

#[tokio::test]
async fn test_admin_update_missing_user_is_not_found() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, _) = send_json(
        &app,
        "PUT",
        "/api/admin/users/999999",
        Some(json!({
            "username": "ghost",
            "email": "ghost@example.com",
            "is_admin": false,
        })),
        Some(&cookie),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_update_to_duplicate_username_is_conflict() {
    let app = spawn_app().await;

    register(&app, "judy", "judy@example.com", "secret99").await;
    let cookie = login(&app, "admin", "admin123").await;

    let (_, _, body) = send_json(&app, "GET", "/api/admin/users", None, Some(&cookie)).await;
    let judy_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "judy")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, _, _) = send_json(
        &app,
        "PUT",
        &format!("/api/admin/users/{judy_id}"),
        Some(json!({
            "username": "admin",
            "email": "judy@example.com",
            "is_admin": false,
        })),
        Some(&cookie),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_system_status_reports_user_count() {
    let app = spawn_app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let (status, _, body) = send_json(&app, "GET", "/api/system/status", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["users"], 1);
    assert!(body["data"]["version"].is_string());
}
