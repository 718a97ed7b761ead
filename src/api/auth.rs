use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::auth::{CurrentAccount, cleared_session_cookie, create_jwt, session_cookie};
use crate::domain::DomainError;
use crate::forms::{LoginForm, RegisterForm, Validate};
use crate::services::account_service;
use crate::state::AppState;
use crate::views;

pub async fn login_page() -> Html<String> {
    views::login(&LoginForm::default(), &[])
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, DomainError> {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                views::login(&form, &messages),
            )
                .into_response());
        }
    };

    tracing::info!("Login attempt for user: {}", credentials.username);

    let Some(account) = account_service::authenticate(
        &state.db,
        &credentials,
        state.config.password_hash_iterations,
    )
    .await?
    else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            views::login(&form, &["Invalid username or password".to_string()]),
        )
            .into_response());
    };

    let token = create_jwt(
        &state.config.session_secret,
        account.id,
        &account.username,
        account.session_epoch,
        state.config.session_ttl_hours,
    )
    .map_err(DomainError::Internal)?;

    tracing::info!("Session started for user: {}", account.username);
    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.config.session_ttl_hours),
        )],
        Redirect::to(&views::profile_path(&account.username)),
    )
        .into_response())
}

/// Ends every session of the account, not only the one in this browser.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Response, DomainError> {
    let username = current.username().to_string();
    account_service::end_sessions(&state.db, current.account).await?;

    tracing::info!("Session ended for user: {}", username);
    Ok((
        [(header::SET_COOKIE, cleared_session_cookie())],
        Redirect::to("/"),
    )
        .into_response())
}

pub async fn register_page() -> Html<String> {
    views::register(&RegisterForm::default(), &[])
}

/// Creates the account and sends the user home; logging in is a separate step.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, DomainError> {
    let new_account = match form.validate() {
        Ok(new_account) => new_account,
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                views::register(&form, &messages),
            )
                .into_response());
        }
    };

    match account_service::register(
        &state.db,
        &new_account,
        state.config.password_hash_iterations,
    )
    .await
    {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(DomainError::Validation(msg)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            views::register(&form, &[msg]),
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
