use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tower::util::ServiceExt; // for `oneshot`
use virtual_bookshelf::auth;
use virtual_bookshelf::config::Config;
use virtual_bookshelf::models::{account, book, read_book};
use virtual_bookshelf::state::AppState;
use virtual_bookshelf::{api, db};

const SECRET: &str = "test-secret";

// Helper to create a test app over an in-memory database
async fn setup_test_app() -> (Router, DatabaseConnection) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        session_secret: SECRET.to_string(),
        session_ttl_hours: 1,
        password_hash_iterations: 1,
        openlibrary_url: "http://127.0.0.1:9".to_string(),
    };
    (api::app_router(AppState::new(db.clone(), config)), db)
}

// Helper to create a test account
async fn create_test_account(db: &DatabaseConnection, username: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let model = account::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("hash".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = model.insert(db).await.expect("Failed to create account");
    res.id
}

// Helper to create a read entry on a fresh book
async fn create_test_read_entry(db: &DatabaseConnection, account_id: i32) -> i32 {
    book::ActiveModel {
        isbn: Set("0140449266".to_string()),
        title: Set("The Odyssey".to_string()),
        author: Set("Homer".to_string()),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create book");

    let entry = read_book::ActiveModel {
        isbn: Set("0140449266".to_string()),
        account_id: Set(account_id),
        rating: Set(Some(6)),
        ..Default::default()
    };
    entry.insert(db).await.expect("Failed to create entry").id
}

fn session(account_id: i32, username: &str) -> String {
    let token =
        auth::create_jwt(SECRET, account_id, username, 0, 1).expect("Failed to create token");
    format!("session={}", token)
}

fn csrf_of(cookie: &str) -> String {
    let token = cookie.trim_start_matches("session=");
    auth::decode_jwt(SECRET, token)
        .expect("Failed to decode token")
        .csrf
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let (app, _db) = setup_test_app().await;

    for uri in [
        "/to_read",
        "/wishlist",
        "/add",
        "/book_entry",
        "/bookreview/1",
        "/delete/1",
        "/edit/1",
        "/logout",
        "/alice-profile",
    ] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "GET {}", uri);
        assert_eq!(response.headers()[header::LOCATION], "/login", "GET {}", uri);
    }
}

#[tokio::test]
async fn test_unauthenticated_delete_leaves_entry() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let entry_id = create_test_read_entry(&db, alice).await;

    let req = Request::builder()
        .uri(format!("/delete/{}", entry_id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(read_book::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_public_pages_need_no_session() {
    let (app, _db) = setup_test_app().await;

    for uri in ["/", "/login", "/register"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_delete_of_other_accounts_entry_is_forbidden() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let mallory = create_test_account(&db, "mallory").await;
    let entry_id = create_test_read_entry(&db, alice).await;

    let cookie = session(mallory, "mallory");
    let req = Request::builder()
        .uri(format!("/delete/{}?csrf={}", entry_id, csrf_of(&cookie)))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_book::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_review_of_other_accounts_entry_is_forbidden() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let mallory = create_test_account(&db, "mallory").await;
    let entry_id = create_test_read_entry(&db, alice).await;
    let cookie = session(mallory, "mallory");

    let req = Request::builder()
        .uri(format!("/bookreview/{}", entry_id))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .uri(format!("/bookreview/{}", entry_id))
        .method("POST")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "rating=0&review=vandalised&csrf_token={}",
            csrf_of(&cookie)
        )))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let entry = read_book::Entity::find_by_id(entry_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.rating, Some(6));
    assert_eq!(entry.review, None);
}

#[tokio::test]
async fn test_unknown_entries_are_not_found() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let cookie = session(alice, "alice");

    let delete_uri = format!("/delete/999?csrf={}", csrf_of(&cookie));
    for uri in ["/bookreview/999", delete_uri.as_str()] {
        let req = Request::builder()
            .uri(uri)
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_edit_of_other_profile_is_forbidden() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let mallory = create_test_account(&db, "mallory").await;

    let req = Request::builder()
        .uri(format!("/edit/{}", alice))
        .method("POST")
        .header(header::COOKIE, session(mallory, "mallory"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("about=pwned"))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let stored = account::Entity::find_by_id(alice)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.about, None);
}

#[tokio::test]
async fn test_other_users_profile_redirects_to_own() {
    let (app, db) = setup_test_app().await;
    create_test_account(&db, "alice").await;
    let mallory = create_test_account(&db, "mallory").await;

    let req = Request::builder()
        .uri("/alice-profile")
        .header(header::COOKIE, session(mallory, "mallory"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/mallory-profile");
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;

    let req = Request::builder()
        .uri("/no-such-page")
        .header(header::COOKIE, session(alice, "alice"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_for_deleted_account_is_rejected() {
    let (app, db) = setup_test_app().await;
    let cookie = session(42, "ghost");

    let req = Request::builder()
        .uri("/to_read")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert_eq!(account::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_without_csrf_token_is_forbidden() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let entry_id = create_test_read_entry(&db, alice).await;
    let cookie = session(alice, "alice");

    for uri in [
        format!("/delete/{}", entry_id),
        format!("/delete/{}?csrf=guessed", entry_id),
    ] {
        let req = Request::builder()
            .uri(&uri)
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "GET {}", uri);
    }
    assert_eq!(read_book::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_post_with_another_sessions_token_is_forbidden() {
    let (app, db) = setup_test_app().await;
    let alice = create_test_account(&db, "alice").await;
    let cookie = session(alice, "alice");
    let stale = session(alice, "alice");

    let req = Request::builder()
        .uri(format!("/edit/{}", alice))
        .method("POST")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("about=hello&csrf_token={}", csrf_of(&stale))))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let stored = account::Entity::find_by_id(alice)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.about, None);
}
