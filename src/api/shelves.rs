//! The to-read, wishlist and read list forms share one add flow.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::CurrentAccount;
use crate::domain::DomainError;
use crate::forms::{ShelfForm, Validate};
use crate::services::{Shelf, book_service, shelf_service};
use crate::state::AppState;
use crate::views;

/// Link the submitted book to `shelf` if the catalog already knows it,
/// otherwise hand over to book creation with the submitted ISBN.
async fn add_to_shelf(
    state: &AppState,
    account: &CurrentAccount,
    shelf: Shelf,
    form: ShelfForm,
) -> Result<Response, DomainError> {
    account.check_csrf(&form.csrf_token)?;

    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                views::shelf_add(account, shelf, &form, &messages),
            )
                .into_response());
        }
    };

    match book_service::resolve_isbn(&state.db, &request).await? {
        Some(isbn) => {
            shelf_service::add_entry(&state.db, shelf, account.id(), &isbn).await?;
            Ok(Redirect::to(&views::profile_path(account.username())).into_response())
        }
        None => {
            tracing::info!(
                "No book matches ISBN '{}' or title '{}', sending to book entry",
                request.isbn,
                request.title
            );
            Ok(Redirect::to(&format!(
                "/book_entry?isbn={}&shelf={}&csrf={}",
                urlencoding::encode(&request.isbn),
                shelf,
                urlencoding::encode(&account.csrf_token)
            ))
            .into_response())
        }
    }
}

pub async fn to_read_page(account: CurrentAccount) -> Html<String> {
    views::shelf_add(&account, Shelf::ToRead, &ShelfForm::default(), &[])
}

pub async fn to_read(
    State(state): State<AppState>,
    account: CurrentAccount,
    Form(form): Form<ShelfForm>,
) -> Result<Response, DomainError> {
    add_to_shelf(&state, &account, Shelf::ToRead, form).await
}

pub async fn wishlist_page(account: CurrentAccount) -> Html<String> {
    views::shelf_add(&account, Shelf::Wishlist, &ShelfForm::default(), &[])
}

pub async fn wishlist(
    State(state): State<AppState>,
    account: CurrentAccount,
    Form(form): Form<ShelfForm>,
) -> Result<Response, DomainError> {
    add_to_shelf(&state, &account, Shelf::Wishlist, form).await
}

pub async fn read_page(account: CurrentAccount) -> Html<String> {
    views::shelf_add(&account, Shelf::Read, &ShelfForm::default(), &[])
}

pub async fn read(
    State(state): State<AppState>,
    account: CurrentAccount,
    Form(form): Form<ShelfForm>,
) -> Result<Response, DomainError> {
    add_to_shelf(&state, &account, Shelf::Read, form).await
}
