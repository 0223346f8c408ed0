
use std::{sync::Arc, time::Duration};

use actix_web::{
    http::{header, StatusCode},
    middleware::NormalizePath,
    test, web, App,
};
use partners_points_backend::{
    notify::LogNotifier,
    routes::configure_routes,
    settings::{AppConfig, AuthMode},
    storage::Storage,
    AppState,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use test_utils::*;

const BOUNDARY: &str = "----partners-points-test-boundary";

/// State over in-memory storage. The pool is lazy and never connected, so
/// only routes that stop before the database are exercised here.
fn test_state(config: AppConfig) -> (web::Data<AppState>, Arc<InMemoryStorage>) {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let memory = Arc::new(InMemoryStorage::new());
    let storage: Arc<dyn Storage> = memory.clone();

    let state = web::Data::new(AppState::new(config, pool, storage, Arc::new(LogNotifier)));
    (state, memory)
}

macro_rules! spawn_app {
    ($config:expr) => {{
        let (state, memory) = test_state($config);
        let app = test::init_service(
            App::new()
                .app_data(state)
                .wrap(NormalizePath::trim())
                .configure(configure_routes),
        )
        .await;
        (app, memory)
    }};
}

fn multipart_file(file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n", file_name).as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(token: Option<&str>) -> test::TestRequest {
    let mut req = test::TestRequest::post()
        .uri("/api/v1/admin/uploads")
        .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY)))
        .set_payload(multipart_file("notes.txt", "text/plain", b"definitely not an image"));
    if let Some(token) = token {
        req = req.insert_header((header::AUTHORIZATION, format!("Bearer {}", token)));
    }
    req
}

fn login_request(password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": ADMIN_EMAIL, "password": password }))
}

#[actix_rt::test]
async fn home_returns_banner() {
    let (app, _) = spawn_app!(test_config());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "Ok");
}

#[actix_rt::test]
async fn calculator_returns_projection() {
    let (app, _) = spawn_app!(test_config());
    let req = test::TestRequest::post()
        .uri("/api/v1/calculator")
        .set_json(json!({
            "monthlyCustomers": 1000,
            "averageSpend": 50,
            "visitsPerMonth": 2,
            "currentFeePercent": 3,
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["monthlyRevenue"], 100000.0);
    assert_eq!(body["projectedMonthlyRevenue"], 110000.0);
    assert_eq!(body["paybackMonths"], 0.0);
}

#[actix_rt::test]
async fn calculator_rejects_negative_and_malformed_input() {
    let (app, _) = spawn_app!(test_config());

    let negative = test::TestRequest::post()
        .uri("/api/v1/calculator")
        .set_json(json!({
            "monthlyCustomers": -5,
            "averageSpend": 50,
            "visitsPerMonth": 2,
            "currentFeePercent": 3,
        }))
        .to_request();
    let resp = test::call_service(&app, negative).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let malformed = test::TestRequest::post()
        .uri("/api/v1/calculator")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, malformed).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().is_some());
}

#[actix_rt::test]
async fn login_issues_bearer_token_for_the_admin() {
    let (app, _) = spawn_app!(test_config());

    let resp = test::call_service(&app, login_request(ADMIN_PASSWORD).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["expires_in"], 300);
}

#[actix_rt::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (app, _) = spawn_app!(test_config());

    let resp = test::call_service(&app, login_request("hunter2").to_request()).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn admin_routes_require_a_valid_token() {
    let (app, memory) = spawn_app!(test_config());

    let resp = test::call_service(&app, upload_request(None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, upload_request(Some("not.a.jwt")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/admin/dashboard").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn authenticated_upload_of_non_image_is_rejected_without_writing() {
    let (app, memory) = spawn_app!(test_config());
    let resp = test::call_service(&app, login_request(ADMIN_PASSWORD).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let resp = test::call_service(&app, upload_request(Some(&token)).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid file type"));
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn mock_mode_admits_admin_requests_and_disables_login() {
    let config = AppConfig {
        auth_mode: AuthMode::Mock,
        ..test_config()
    };
    let (app, memory) = spawn_app!(config);

    let resp = test::call_service(&app, upload_request(None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(memory.writes(), 0);

    let resp = test::call_service(&app, login_request(ADMIN_PASSWORD).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn contact_form_is_rate_limited_per_client() {
    let (app, _) = spawn_app!(test_config());
    let invalid = json!({ "name": "X", "email": "nope", "message": "short" });

    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/v1/contact")
            .set_json(&invalid)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/contact")
        .set_json(&invalid)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), "0");
}

#[actix_rt::test]
async fn stored_uploads_are_served_back_verbatim() {
    let (app, memory) = spawn_app!(test_config());
    let png = png_bytes(12, 12);
    memory.upload("general/logo.png", "image/png", png.clone()).await.unwrap();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/uploads/general/logo.png").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), png.as_slice());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/uploads/general/missing.png").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn unknown_routes_return_json_404() {
    let (app, _) = spawn_app!(test_config());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/nowhere").to_request()).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not found");
}
