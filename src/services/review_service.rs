//! Review Service - ratings and reviews on read entries

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::domain::DomainError;
use crate::forms::ReviewUpdate;
use crate::models::{book, read_book};

/// Load a read entry and check that `account_id` owns it.
pub async fn owned_read_entry(
    db: &DatabaseConnection,
    account_id: i32,
    entry_id: i32,
) -> Result<read_book::Model, DomainError> {
    let entry = read_book::Entity::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    if entry.account_id != account_id {
        tracing::warn!(
            "Account {} tried to access read entry {} of account {}",
            account_id,
            entry_id,
            entry.account_id
        );
        return Err(DomainError::Forbidden);
    }

    Ok(entry)
}

/// Apply the fields present in `update` to a read entry owned by `account_id`.
///
/// Rating and review land on the entry; an image URL replaces the display
/// image of the linked book. Absent fields are left untouched. Both writes
/// commit together.
pub async fn apply_review(
    db: &DatabaseConnection,
    account_id: i32,
    entry_id: i32,
    update: ReviewUpdate,
) -> Result<read_book::Model, DomainError> {
    let entry = owned_read_entry(db, account_id, entry_id).await?;
    let isbn = entry.isbn.clone();

    let txn = db.begin().await?;

    let entry = if update.rating.is_some() || update.review.is_some() {
        let mut active: read_book::ActiveModel = entry.into();
        if let Some(rating) = update.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(review) = update.review {
            active.review = Set(Some(review));
        }
        active.update(&txn).await?
    } else {
        entry
    };

    if let Some(image_url) = update.image_url {
        let book = book::Entity::find()
            .filter(book::Column::Isbn.eq(&isbn))
            .one(&txn)
            .await?
            .ok_or(DomainError::NotFound)?;
        let mut active: book::ActiveModel = book.into();
        active.image_url = Set(Some(image_url));
        active.update(&txn).await?;
    }

    txn.commit().await?;

    tracing::info!("Account {} updated review on entry {}", account_id, entry_id);
    Ok(entry)
}
