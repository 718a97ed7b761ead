use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use serde::Deserialize;

use crate::auth::CurrentAccount;
use crate::domain::DomainError;
use crate::forms::{ReviewForm, Validate};
use crate::services::{review_service, shelf_service};
use crate::state::AppState;
use crate::views;

pub async fn review_page(
    State(state): State<AppState>,
    account: CurrentAccount,
    Path(entry_id): Path<i32>,
) -> Result<Response, DomainError> {
    let entry = review_service::owned_read_entry(&state.db, account.id(), entry_id).await?;
    let form = ReviewForm {
        rating: entry.rating.map(|r| r.to_string()).unwrap_or_default(),
        review: entry.review.unwrap_or_default(),
        ..Default::default()
    };
    Ok(views::review(&account, entry_id, &form, &[]).into_response())
}

pub async fn submit_review(
    State(state): State<AppState>,
    account: CurrentAccount,
    Path(entry_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, DomainError> {
    account.check_csrf(&form.csrf_token)?;

    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                views::review(&account, entry_id, &form, &messages),
            )
                .into_response());
        }
    };

    review_service::apply_review(&state.db, account.id(), entry_id, update).await?;
    Ok(Redirect::to(&views::profile_path(account.username())).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct CsrfQuery {
    #[serde(default)]
    pub csrf: String,
}

pub async fn delete_read_entry(
    State(state): State<AppState>,
    account: CurrentAccount,
    Path(entry_id): Path<i32>,
    Query(query): Query<CsrfQuery>,
) -> Result<Response, DomainError> {
    account.check_csrf(&query.csrf)?;
    shelf_service::delete_read_entry(&state.db, account.id(), entry_id).await?;
    Ok(Redirect::to(&views::profile_path(account.username())).into_response())
}
