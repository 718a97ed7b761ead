pub mod auth;
pub mod books;
pub mod error;
pub mod health;
pub mod profile;
pub mod reviews;
pub mod shelves;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(profile::home))
        .route("/health", get(health::health_check))
        // Accounts
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
        .route("/edit/:id", get(profile::edit_page).post(profile::update_profile))
        // Lists
        .route("/to_read", get(shelves::to_read_page).post(shelves::to_read))
        .route("/wishlist", get(shelves::wishlist_page).post(shelves::wishlist))
        .route("/add", get(shelves::read_page).post(shelves::read))
        // Books and reviews
        .route("/book_entry", get(books::new_book_page).post(books::create_book))
        .route(
            "/bookreview/:id",
            get(reviews::review_page).post(reviews::submit_review),
        )
        .route("/delete/:id", get(reviews::delete_read_entry))
        // `/{user}-profile`; static routes above take precedence
        .route("/:slug", get(profile::show_profile))
        .with_state(state)
}
