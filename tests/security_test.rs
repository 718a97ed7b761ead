use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tower::util::ServiceExt; // for `oneshot`
use virtual_bookshelf::auth::{create_jwt, decode_jwt, hash_password, verify_password};
use virtual_bookshelf::config::Config;
use virtual_bookshelf::forms::NewAccount;
use virtual_bookshelf::models::account;
use virtual_bookshelf::services::account_service;
use virtual_bookshelf::state::AppState;
use virtual_bookshelf::{api, db};

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        session_secret: SECRET.to_string(),
        session_ttl_hours: 1,
        password_hash_iterations: 1,
        openlibrary_url: "http://127.0.0.1:9".to_string(),
    }
}

// Helper to create a test database and router over it
async fn setup_app() -> (Router, DatabaseConnection) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let app = api::app_router(AppState::new(db.clone(), test_config()));
    (app, db)
}

async fn create_account(db: &DatabaseConnection, username: &str, password: &str) -> account::Model {
    let hash = hash_password(password, 1).expect("Failed to hash password");
    let new_account = NewAccount {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: password.to_string(),
    };
    account_service::create_account(db, &new_account, hash)
        .await
        .expect("Failed to create account")
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_password_hashing() {
    let password = "super_secret_password";
    let hash = hash_password(password, 1).expect("Failed to hash password");

    assert_ne!(password, hash);
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password(password, &hash).unwrap());
    assert!(!verify_password("wrong_password", &hash).unwrap());
}

#[tokio::test]
async fn test_jwt_creation_and_verification() {
    let token = create_jwt(SECRET, 7, "reader", 0, 1).expect("Failed to create JWT");
    assert!(!token.is_empty());

    let claims = decode_jwt(SECRET, &token).expect("Failed to verify JWT");
    assert_eq!(claims.sub, "7");
    assert_eq!(claims.username, "reader");

    assert!(decode_jwt("another-secret", &token).is_err());
}

#[tokio::test]
async fn test_login_sets_session_for_correct_password() {
    let (app, db) = setup_app().await;
    let alice = create_account(&db, "alice", "wonderland").await;

    let response = app
        .oneshot(form_post("/login", "username=alice&password=wonderland"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/alice-profile");

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.contains("HttpOnly"));
    let token = cookie
        .strip_prefix("session=")
        .and_then(|rest| rest.split(';').next())
        .expect("session cookie");
    let claims = decode_jwt(SECRET, token).unwrap();
    assert_eq!(claims.sub, alice.id.to_string());
    assert_eq!(claims.epoch, alice.session_epoch);
    assert_eq!(claims.csrf.len(), 32);
}

#[tokio::test]
async fn test_login_with_wrong_password_sets_no_session() {
    let (app, db) = setup_app().await;
    create_account(&db, "alice", "wonderland").await;

    let response = app
        .oneshot(form_post("/login", "username=alice&password=looking-glass"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = body_text(response).await;
    assert!(page.contains("Invalid username or password"));
    assert!(!page.contains("looking-glass"));
}

#[tokio::test]
async fn test_login_with_unknown_user_matches_wrong_password() {
    let (app, _db) = setup_app().await;

    let response = app
        .oneshot(form_post("/login", "username=nobody&password=whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_with_invalid_form_is_rejected() {
    let (app, _db) = setup_app().await;

    let response = app
        .oneshot(form_post("/login", "username=al&password="))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_register_with_mismatched_confirm_creates_no_account() {
    let (app, db) = setup_app().await;

    let response = app
        .oneshot(form_post(
            "/register",
            "username=bobby&email=bob%40example.com&password=secret1&confirm=secret2",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("passwords must match"));
    assert_eq!(account::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_register_stores_hash_and_does_not_log_in() {
    let (app, db) = setup_app().await;

    let response = app
        .oneshot(form_post(
            "/register",
            "username=bobby&email=bob%40example.com&password=secret1&confirm=secret1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let accounts = account::Entity::find().all(&db).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "bobby");
    assert_ne!(accounts[0].password_hash, "secret1");
    assert!(verify_password("secret1", &accounts[0].password_hash).unwrap());
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let (app, db) = setup_app().await;
    create_account(&db, "bobby", "secret1").await;

    let response = app
        .oneshot(form_post(
            "/register",
            "username=bobby&email=other%40example.com&password=secret2&confirm=secret2",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("username is already taken"));
    assert_eq!(account::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_forged_session_is_rejected() {
    let (app, db) = setup_app().await;
    let alice = create_account(&db, "alice", "wonderland").await;
    let forged = create_jwt("not-the-secret", alice.id, "alice", 0, 1).unwrap();

    let req = Request::builder()
        .uri("/to_read")
        .header(header::COOKIE, format!("session={}", forged))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, db) = setup_app().await;
    let alice = create_account(&db, "alice", "wonderland").await;
    let token = create_jwt(SECRET, alice.id, "alice", 0, 1).unwrap();

    let req = Request::builder()
        .uri("/logout")
        .header(header::COOKIE, format!("session={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_token_is_useless_after_logout() {
    let (app, db) = setup_app().await;
    let alice = create_account(&db, "alice", "wonderland").await;
    let cookie = format!(
        "session={}",
        create_jwt(SECRET, alice.id, "alice", 0, 1).unwrap()
    );

    let page = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(page("/to_read")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(page("/logout")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // A copy of the old cookie no longer opens a session
    let response = app.oneshot(page("/to_read")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}
