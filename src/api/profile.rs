use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::CurrentAccount;
use crate::domain::DomainError;
use crate::forms::{ProfileForm, Validate};
use crate::services::{Shelf, account_service, shelf_service};
use crate::state::AppState;
use crate::views::{self, ProfilePage};

pub async fn home(account: Option<CurrentAccount>) -> Html<String> {
    views::home(account.as_ref().map(|a| &a.account))
}

/// `/{user}-profile`. Always shows the caller's own shelves.
pub async fn show_profile(
    State(state): State<AppState>,
    account: CurrentAccount,
    Path(slug): Path<String>,
) -> Result<Response, DomainError> {
    let Some(user) = slug.strip_suffix("-profile") else {
        return Err(DomainError::NotFound);
    };

    if user != account.username() {
        return Ok(Redirect::to(&views::profile_path(account.username())).into_response());
    }

    let db = &state.db;
    let id = account.id();
    let page = ProfilePage {
        current: &account,
        favourite: shelf_service::random_favourite(db, id).await?,
        wish: shelf_service::random_wishlist_book(db, id).await?,
        to_read: shelf_service::list_entries(db, Shelf::ToRead, id).await?,
        wishlist: shelf_service::list_entries(db, Shelf::Wishlist, id).await?,
        read: shelf_service::list_entries(db, Shelf::Read, id).await?,
    };

    Ok(views::profile(page).into_response())
}

fn ensure_self(account: &CurrentAccount, id: i32) -> Result<(), DomainError> {
    if account.id() != id {
        tracing::warn!(
            "Account {} tried to edit the profile of account {}",
            account.id(),
            id
        );
        return Err(DomainError::Forbidden);
    }
    Ok(())
}

pub async fn edit_page(
    account: CurrentAccount,
    Path(id): Path<i32>,
) -> Result<Html<String>, DomainError> {
    ensure_self(&account, id)?;

    let current = &account.account;
    let form = ProfileForm {
        email: current.email.clone().unwrap_or_default(),
        hobbies: current.hobbies.clone().unwrap_or_default(),
        country: current.country.clone().unwrap_or_default(),
        about: current.about.clone().unwrap_or_default(),
        ..Default::default()
    };
    Ok(views::profile_edit(&account, &form))
}

pub async fn update_profile(
    State(state): State<AppState>,
    account: CurrentAccount,
    Path(id): Path<i32>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, DomainError> {
    ensure_self(&account, id)?;
    account.check_csrf(&form.csrf_token)?;

    let update = form.validate().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        DomainError::Validation(messages.join(", "))
    })?;
    account_service::update_profile(&state.db, id, update).await?;

    tracing::info!("Account {} updated its profile", id);
    Ok(Redirect::to(&views::profile_path(account.username())).into_response())
}
