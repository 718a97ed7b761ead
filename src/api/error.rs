//! HTTP mapping of domain errors

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::domain::DomainError;
use crate::views::escape;

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        match self {
            DomainError::Unauthorized => Redirect::to("/login").into_response(),
            DomainError::NotFound => {
                (StatusCode::NOT_FOUND, Html("<h1>Not found</h1>".to_string())).into_response()
            }
            DomainError::Forbidden => (
                StatusCode::FORBIDDEN,
                Html("<h1>You cannot change another reader's books</h1>".to_string()),
            )
                .into_response(),
            DomainError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(format!("<p>{}</p>", escape(&msg))),
            )
                .into_response(),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Something went wrong</h1>".to_string()),
                )
                    .into_response()
            }
        }
    }
}
