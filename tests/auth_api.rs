use actix_web::{test, web, App};
use authgate_server::auth::handlers::{login, refresh, register};
use authgate_server::{AppState, Settings};
use serde_json::json;
use uuid::Uuid;

/// Build an application state against the database named by
/// `DATABASE_URL`, or return `None` (skipping the test) when no database
/// is available.
async fn test_state() -> Option<web::Data<AppState>> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            return None;
        }
    };

    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool.close().await;

    let mut config = Settings::new().unwrap();
    config.database.url = url;
    let state = AppState::new(config).await.unwrap();
    Some(web::Data::new(state))
}

fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

macro_rules! auth_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/api/auth/login", web::post().to(login))
                .route("/api/auth/register", web::post().to(register))
                .route("/api/auth/refresh", web::post().to(refresh)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_register_login_refresh_flow() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);
    let username = unique_username("alice");
    let email = format!("{}@example.com", username);

    // Register
    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "password": "pw123",
            "email": email,
            "first_name": "Alice",
        }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 201);
    let register_body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(register_body["message"], "User created successfully");
    assert_eq!(register_body["user"]["username"], username.as_str());
    assert_eq!(register_body["user"]["email"], email.as_str());
    assert_eq!(register_body["user"]["first_name"], "Alice");
    assert_eq!(register_body["user"]["last_name"], "");
    assert!(register_body["user"].get("password_hash").is_none());
    assert!(register_body["access_token"].is_string());
    assert!(register_body["refresh_token"].is_string());

    // Login with the same pair
    let response = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": "pw123" }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 200);
    let login_body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(login_body["message"], "Login successful");
    assert_eq!(login_body["user"]["id"], register_body["user"]["id"]);

    // Renew the access token with the refresh token from login
    let refresh_token = login_body["refresh_token"].as_str().unwrap();
    let response = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": refresh_token }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 200);
    let refresh_body: serde_json::Value = test::read_body_json(response).await;
    assert!(refresh_body["access_token"].is_string());

    // Wrong password is rejected
    let response = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": "wrong" }))
        .send_request(&app)
        .await;

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Invalid credentials");
}

#[actix_web::test]
async fn test_duplicate_username_rejected() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);
    let username = unique_username("bob");

    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "password": "pw123" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);

    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "password": "other" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Username already exists");
}

#[actix_web::test]
async fn test_duplicate_email_rejected() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);
    let email = format!("{}@example.com", unique_username("shared"));

    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": unique_username("carol"),
            "password": "pw123",
            "email": email,
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);

    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": unique_username("dave"),
            "password": "pw123",
            "email": email,
        }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Email already exists");
}

#[actix_web::test]
async fn test_missing_fields_rejected() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);

    // Missing password on registration
    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": unique_username("eve") }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Username and password are required");

    // Empty username on login
    let response = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "", "password": "pw123" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Username and password are required");
}

#[actix_web::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);
    let username = unique_username("frank");

    let response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": username, "password": "pw123" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 201);

    let wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": "wrong" }))
        .send_request(&app)
        .await;
    let unknown_user = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": unique_username("nobody"), "password": "wrong" }))
        .send_request(&app)
        .await;

    assert_eq!(wrong_password.status(), 401);
    assert_eq!(unknown_user.status(), 401);

    let wrong_password_body = test::read_body(wrong_password).await;
    let unknown_user_body = test::read_body(unknown_user).await;
    assert_eq!(wrong_password_body, unknown_user_body);
}

#[actix_web::test]
async fn test_refresh_token_validation() {
    let Some(state) = test_state().await else { return };
    let app = auth_app!(state);

    // Corrupted token
    let response = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": "garbage" }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);
    let body: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Invalid refresh token");

    // Missing token
    let response = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({}))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 400);

    // An access token is not accepted in place of a refresh token
    let tokens = state.tokens.issue(Uuid::new_v4()).unwrap();
    let response = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": tokens.access_token }))
        .send_request(&app)
        .await;
    assert_eq!(response.status(), 401);
}
