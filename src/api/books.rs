//! Book creation, either from a catalog lookup or from the manual form.

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::auth::CurrentAccount;
use crate::domain::DomainError;
use crate::forms::{AddBookForm, NewBook, Validate};
use crate::openlibrary;
use crate::services::{Shelf, book_service, shelf_service};
use crate::state::AppState;
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct BookEntryQuery {
    pub isbn: Option<String>,
    /// List the user was adding to when the book turned out to be unknown
    pub shelf: Option<Shelf>,
    /// Session CSRF token; a lookup stores rows, so it needs one like a POST
    #[serde(default)]
    pub csrf: String,
}

fn form_action(shelf: Option<Shelf>) -> String {
    match shelf {
        Some(shelf) => format!("/book_entry?shelf={}", shelf),
        None => "/book_entry".to_string(),
    }
}

/// Finish the pending list action (if any) and return to the profile.
async fn complete(
    state: &AppState,
    account: &CurrentAccount,
    isbn: &str,
    shelf: Option<Shelf>,
) -> Result<Response, DomainError> {
    if let Some(shelf) = shelf {
        shelf_service::add_entry(&state.db, shelf, account.id(), isbn).await?;
    }
    Ok(Redirect::to(&views::profile_path(account.username())).into_response())
}

async fn create_and_complete(
    state: &AppState,
    account: &CurrentAccount,
    new_book: NewBook,
    shelf: Option<Shelf>,
    form: &AddBookForm,
) -> Result<Response, DomainError> {
    match book_service::create_book(&state.db, new_book).await {
        Ok(book) => complete(state, account, &book.isbn, shelf).await,
        Err(DomainError::Validation(msg)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            views::new_book(account, &form_action(shelf), form, &[msg]),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

/// With an `isbn` parameter the catalog is consulted and a found book is
/// stored straight away. Unknown ISBNs fall back to the manual form.
pub async fn new_book_page(
    State(state): State<AppState>,
    account: CurrentAccount,
    Query(query): Query<BookEntryQuery>,
) -> Result<Response, DomainError> {
    let action = form_action(query.shelf);
    let isbn = query
        .isbn
        .as_deref()
        .map(str::trim)
        .filter(|isbn| !isbn.is_empty());

    let Some(isbn) = isbn else {
        let form = AddBookForm::default();
        return Ok(views::new_book(&account, &action, &form, &[]).into_response());
    };

    account.check_csrf(&query.csrf)?;

    if book_service::find_by_isbn(&state.db, isbn).await?.is_some() {
        return complete(&state, &account, isbn, query.shelf).await;
    }

    let draft =
        openlibrary::fetch_book_draft(&state.http, &state.config.openlibrary_url, isbn).await?;

    let Some(draft) = draft else {
        tracing::info!("Catalog has no entry for ISBN {}", isbn);
        let form = AddBookForm {
            isbn: isbn.to_string(),
            ..Default::default()
        };
        return Ok(views::new_book(&account, &action, &form, &[]).into_response());
    };

    let form = AddBookForm::from(draft);
    match form.validate() {
        Ok(new_book) => {
            tracing::info!("Creating book {} from catalog data", isbn);
            create_and_complete(&state, &account, new_book, query.shelf, &form).await
        }
        Err(errors) => {
            // Incomplete catalog record: let the user fill in the gaps
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Ok(views::new_book(&account, &action, &form, &messages).into_response())
        }
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    account: CurrentAccount,
    Query(query): Query<BookEntryQuery>,
    Form(form): Form<AddBookForm>,
) -> Result<Response, DomainError> {
    account.check_csrf(&form.csrf_token)?;

    match form.validate() {
        Ok(new_book) => create_and_complete(&state, &account, new_book, query.shelf, &form).await,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                views::new_book(&account, &form_action(query.shelf), &form, &messages),
            )
                .into_response())
        }
    }
}
