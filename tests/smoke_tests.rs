//! Smoke tests against a file-backed database, reopened between steps.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use compatd::config::Config;
use compatd::models::user::{NewUser, UserRole};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tower::ServiceExt;

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("compatd-smoke-test-{}.db", uuid::Uuid::new_v4()))
}

async fn spawn_app(db_path: &Path) -> (std::sync::Arc<compatd::api::AppState>, Router) {
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.auth.jwt_secret = "smoke-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;

    let state = compatd::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = compatd::api::router(state.clone()).await;
    (state, router)
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_matrix_and_version_survive_restart() {
    let db_path = temp_db_path();

    let token = {
        let (state, router) = spawn_app(&db_path).await;
        state
            .users()
            .create(NewUser {
                email: "root@example.com".to_string(),
                password: "Secret123".to_string(),
                first_name: "Root".to_string(),
                last_name: "Admin".to_string(),
                role: UserRole::Admin,
            })
            .await
            .expect("seed admin");

        let (status, body) = call(
            &router,
            Request::builder()
                .method("POST")
                .uri("/api/users/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "email": "root@example.com", "password": "Secret123" }).to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &router,
            json_request("POST", "/api/metals", &token, &json!({ "name": "copper" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let metal_id = body["data"]["id"].as_i64().unwrap();

        let (status, _) = call(
            &router,
            json_request(
                "POST",
                "/api/compatibilities",
                &token,
                &json!({
                    "chemicalName": "ammonia",
                    "compatibilities": [{ "metal": metal_id.to_string(), "isCompatible": false }],
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        token
    };

    let (_, router) = spawn_app(&db_path).await;

    let (status, body) = call(
        &router,
        Request::builder()
            .uri("/api/compatibilities/ios-app")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);
    assert_eq!(body["data"][0]["chemicalName"], "AMMONIA");

    // Tokens are stateless, so one issued before the restart still works.
    let (status, body) = call(
        &router,
        Request::builder()
            .uri("/api/users/profile")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let _ = std::fs::remove_file(&db_path);
}
