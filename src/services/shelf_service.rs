//! Shelf Service - per-account to-read, wishlist and read lists
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::domain::DomainError;
use crate::models::{book, read_book, to_read, wishlist};
use crate::services::review_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shelf {
    ToRead,
    Wishlist,
    Read,
}

impl Shelf {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shelf::ToRead => "to_read",
            Shelf::Wishlist => "wishlist",
            Shelf::Read => "read",
        }
    }

    /// Path of the page holding this shelf's add form
    pub fn route(&self) -> &'static str {
        match self {
            Shelf::ToRead => "/to_read",
            Shelf::Wishlist => "/wishlist",
            Shelf::Read => "/add",
        }
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list row that links one account to one ISBN.
pub trait ShelfEntry: ActiveModelTrait + ActiveModelBehavior + Send + 'static {
    fn for_account(account_id: i32, isbn: String) -> Self;
}

impl ShelfEntry for to_read::ActiveModel {
    fn for_account(account_id: i32, isbn: String) -> Self {
        Self {
            isbn: Set(isbn),
            account_id: Set(account_id),
            ..Default::default()
        }
    }
}

impl ShelfEntry for wishlist::ActiveModel {
    fn for_account(account_id: i32, isbn: String) -> Self {
        Self {
            isbn: Set(isbn),
            account_id: Set(account_id),
            ..Default::default()
        }
    }
}

impl ShelfEntry for read_book::ActiveModel {
    fn for_account(account_id: i32, isbn: String) -> Self {
        Self {
            isbn: Set(isbn),
            account_id: Set(account_id),
            rating: Set(None),
            review: Set(None),
            ..Default::default()
        }
    }
}

async fn insert_entry<A>(
    db: &DatabaseConnection,
    account_id: i32,
    isbn: String,
) -> Result<(), DomainError>
where
    A: ShelfEntry,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    A::for_account(account_id, isbn).insert(db).await?;
    Ok(())
}

/// Create one list entry for `account_id`. The ISBN is stored as given;
/// callers resolve it against the catalog first.
pub async fn add_entry(
    db: &DatabaseConnection,
    shelf: Shelf,
    account_id: i32,
    isbn: &str,
) -> Result<(), DomainError> {
    let owned = isbn.to_string();
    match shelf {
        Shelf::ToRead => insert_entry::<to_read::ActiveModel>(db, account_id, owned).await?,
        Shelf::Wishlist => insert_entry::<wishlist::ActiveModel>(db, account_id, owned).await?,
        Shelf::Read => insert_entry::<read_book::ActiveModel>(db, account_id, owned).await?,
    }

    tracing::info!("Account {} added {} to {}", account_id, isbn, shelf);
    Ok(())
}

/// One list entry as shown on the profile page.
#[derive(Debug, Clone)]
pub struct ShelfItem {
    pub entry_id: i32,
    pub isbn: String,
    pub book: Option<book::Model>,
    pub rating: Option<i32>,
    pub review: Option<String>,
}

async fn books_by_isbn(
    db: &DatabaseConnection,
    isbns: Vec<String>,
) -> Result<HashMap<String, book::Model>, DomainError> {
    if isbns.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(book::Entity::find()
        .filter(book::Column::Isbn.is_in(isbns))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.isbn.clone(), b))
        .collect())
}

pub async fn list_entries(
    db: &DatabaseConnection,
    shelf: Shelf,
    account_id: i32,
) -> Result<Vec<ShelfItem>, DomainError> {
    let entries: Vec<(i32, String)> = match shelf {
        Shelf::ToRead => to_read::Entity::find()
            .filter(to_read::Column::AccountId.eq(account_id))
            .order_by_asc(to_read::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.isbn))
            .collect(),
        Shelf::Wishlist => wishlist::Entity::find()
            .filter(wishlist::Column::AccountId.eq(account_id))
            .order_by_asc(wishlist::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.isbn))
            .collect(),
        Shelf::Read => {
            let rows = read_book::Entity::find()
                .filter(read_book::Column::AccountId.eq(account_id))
                .order_by_asc(read_book::Column::Id)
                .find_also_related(book::Entity)
                .all(db)
                .await?;
            return Ok(rows
                .into_iter()
                .map(|(entry, book)| ShelfItem {
                    entry_id: entry.id,
                    isbn: entry.isbn,
                    book,
                    rating: entry.rating,
                    review: entry.review,
                })
                .collect());
        }
    };

    let isbns = entries.iter().map(|(_, isbn)| isbn.clone()).collect();
    let books = books_by_isbn(db, isbns).await?;

    Ok(entries
        .into_iter()
        .map(|(entry_id, isbn)| ShelfItem {
            entry_id,
            book: books.get(&isbn).cloned(),
            isbn,
            rating: None,
            review: None,
        })
        .collect())
}

/// A random read entry of the account rated 7 or higher, with its book.
pub async fn random_favourite(
    db: &DatabaseConnection,
    account_id: i32,
) -> Result<Option<ShelfItem>, DomainError> {
    let rows = read_book::Entity::find()
        .filter(read_book::Column::AccountId.eq(account_id))
        .filter(read_book::Column::Rating.gte(7))
        .find_also_related(book::Entity)
        .all(db)
        .await?;

    Ok(rows
        .choose(&mut rand::thread_rng())
        .cloned()
        .map(|(entry, book)| ShelfItem {
            entry_id: entry.id,
            isbn: entry.isbn,
            book,
            rating: entry.rating,
            review: entry.review,
        }))
}

/// A random book from the account's wishlist, if any entry resolves to one.
pub async fn random_wishlist_book(
    db: &DatabaseConnection,
    account_id: i32,
) -> Result<Option<book::Model>, DomainError> {
    let entries = wishlist::Entity::find()
        .filter(wishlist::Column::AccountId.eq(account_id))
        .all(db)
        .await?;

    let picked = entries.choose(&mut rand::thread_rng()).cloned();
    match picked {
        Some(entry) => crate::services::book_service::find_by_isbn(db, &entry.isbn).await,
        None => Ok(None),
    }
}

/// Delete a read entry owned by `account_id`.
pub async fn delete_read_entry(
    db: &DatabaseConnection,
    account_id: i32,
    entry_id: i32,
) -> Result<(), DomainError> {
    let entry = review_service::owned_read_entry(db, account_id, entry_id).await?;
    read_book::Entity::delete_by_id(entry.id).exec(db).await?;

    tracing::info!("Account {} deleted read entry {}", account_id, entry_id);
    Ok(())
}
