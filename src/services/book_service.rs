//! Book Service - catalog rows shared by every account's lists
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::DomainError;
use crate::forms::{NewBook, ShelfRequest};
use crate::models::book::{self, ActiveModel as BookActiveModel, Entity as BookEntity};

pub async fn find_by_isbn(
    db: &DatabaseConnection,
    isbn: &str,
) -> Result<Option<book::Model>, DomainError> {
    Ok(BookEntity::find()
        .filter(book::Column::Isbn.eq(isbn))
        .one(db)
        .await?)
}

pub async fn find_by_title(
    db: &DatabaseConnection,
    title: &str,
) -> Result<Option<book::Model>, DomainError> {
    Ok(BookEntity::find()
        .filter(book::Column::Title.eq(title))
        .one(db)
        .await?)
}

/// Resolve a list submission to the ISBN of a book already in the catalog.
///
/// An exact ISBN match wins; otherwise an exact title match supplies the
/// found book's ISBN. `None` means the book has to be created first.
pub async fn resolve_isbn(
    db: &DatabaseConnection,
    request: &ShelfRequest,
) -> Result<Option<String>, DomainError> {
    if !request.isbn.is_empty()
        && let Some(book) = find_by_isbn(db, &request.isbn).await?
    {
        return Ok(Some(book.isbn));
    }

    if !request.title.is_empty()
        && let Some(book) = find_by_title(db, &request.title).await?
    {
        tracing::debug!(
            "Resolved title '{}' to existing ISBN {}",
            request.title,
            book.isbn
        );
        return Ok(Some(book.isbn));
    }

    Ok(None)
}

/// Insert a validated book. A second book with the same ISBN is a
/// validation failure, not a storage error.
pub async fn create_book(
    db: &DatabaseConnection,
    new_book: NewBook,
) -> Result<book::Model, DomainError> {
    if find_by_isbn(db, &new_book.isbn).await?.is_some() {
        return Err(DomainError::Validation(format!(
            "a book with ISBN {} already exists",
            new_book.isbn
        )));
    }

    let model = BookActiveModel {
        isbn: Set(new_book.isbn),
        title: Set(new_book.title),
        author: Set(new_book.author),
        publication_date: Set(new_book.publication_date),
        publisher: Set(new_book.publisher),
        image_url: Set(new_book.image_url),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created book {} ({})", model.isbn, model.title);
    Ok(model)
}
