//! Loader for the Book-Crossing ratings dataset.
//!
//! The three semicolon-separated files fill `books`, `imported_users` and
//! `imported_ratings`. Rows that do not parse are skipped and counted, as are
//! ratings pointing at an ISBN or user that is not present.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, EntityTrait, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::domain::DomainError;
use crate::models::{book, imported_rating, imported_user};

pub const BOOKS_FILE: &str = "BX-Books.csv";
pub const USERS_FILE: &str = "BX-Users.csv";
pub const RATINGS_FILE: &str = "BX-Book-Ratings.csv";

// Keeps each multi-row insert under SQLite's bound-parameter limit
const BATCH_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct BookRecord {
    #[serde(rename = "ISBN")]
    isbn: String,
    #[serde(rename = "Book-Title")]
    title: String,
    #[serde(rename = "Book-Author")]
    author: String,
    #[serde(rename = "Year-Of-Publication")]
    year: Option<String>,
    #[serde(rename = "Publisher")]
    publisher: Option<String>,
    #[serde(rename = "Image-URL-L")]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(rename = "User-ID")]
    user_id: i32,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Age")]
    age: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "User-ID")]
    user_id: i32,
    #[serde(rename = "ISBN")]
    isbn: String,
    #[serde(rename = "Book-Rating")]
    rating: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub year: Option<String>,
    pub publisher: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedUserRow {
    pub user_id: i32,
    pub location: String,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRatingRow {
    pub user_id: i32,
    pub isbn: String,
    pub rating: i32,
}

/// Parsed rows plus the number of rows that could not be used.
#[derive(Debug)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NULL")
}

/// The dump is ISO-8859-1, where every byte is the code point of the same value.
fn decode_latin1(content: &[u8]) -> String {
    content.iter().map(|&b| char::from(b)).collect()
}

fn parse<R, T>(content: &[u8], convert: impl Fn(R) -> Option<T>) -> Parsed<T>
where
    R: for<'de> Deserialize<'de>,
{
    let text = decode_latin1(content);
    // Quotes inside fields are written as \" rather than doubled
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .escape(Some(b'\\'))
        .double_quote(false)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0;
    for result in rdr.deserialize::<R>() {
        match result.ok().and_then(&convert) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    Parsed { rows, skipped }
}

pub fn parse_books(content: &[u8]) -> Parsed<ImportedBook> {
    parse(content, |r: BookRecord| {
        let isbn = r.isbn.trim().to_string();
        let title = r.title.trim().to_string();
        let author = r.author.trim().to_string();
        if isbn.is_empty() || title.is_empty() || author.is_empty() {
            return None;
        }
        Some(ImportedBook {
            isbn,
            title,
            author,
            year: optional(r.year).filter(|y| y != "0"),
            publisher: optional(r.publisher),
            image_url: optional(r.image_url),
        })
    })
}

pub fn parse_users(content: &[u8]) -> Parsed<ImportedUserRow> {
    parse(content, |r: UserRecord| {
        Some(ImportedUserRow {
            user_id: r.user_id,
            location: r.location.trim().to_string(),
            age: optional(r.age).and_then(|a| a.parse().ok()),
        })
    })
}

pub fn parse_ratings(content: &[u8]) -> Parsed<ImportedRatingRow> {
    parse(content, |r: RatingRecord| {
        (0..=10).contains(&r.rating).then(|| ImportedRatingRow {
            user_id: r.user_id,
            isbn: r.isbn.trim().to_string(),
            rating: r.rating,
        })
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub books: u64,
    pub users: u64,
    pub ratings: u64,
    pub skipped: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} books, {} users, {} ratings imported; {} rows skipped",
            self.books, self.users, self.ratings, self.skipped
        )
    }
}

async fn insert_books(
    txn: &DatabaseTransaction,
    rows: Vec<ImportedBook>,
) -> Result<u64, DomainError> {
    let now = chrono::Utc::now().to_rfc3339();
    let mut inserted = 0;
    for chunk in rows.chunks(BATCH_SIZE) {
        let models = chunk.iter().map(|b| book::ActiveModel {
            isbn: Set(b.isbn.clone()),
            title: Set(b.title.clone()),
            author: Set(b.author.clone()),
            publication_date: Set(b.year.clone()),
            publisher: Set(b.publisher.clone()),
            image_url: Set(b.image_url.clone()),
            created_at: Set(now.clone()),
            ..Default::default()
        });
        inserted += book::Entity::insert_many(models)
            .on_conflict(OnConflict::column(book::Column::Isbn).do_nothing().to_owned())
            .exec_without_returning(txn)
            .await?;
    }
    Ok(inserted)
}

async fn insert_users(
    txn: &DatabaseTransaction,
    rows: Vec<ImportedUserRow>,
) -> Result<u64, DomainError> {
    let mut inserted = 0;
    for chunk in rows.chunks(BATCH_SIZE) {
        let models = chunk.iter().map(|u| imported_user::ActiveModel {
            user_id: Set(u.user_id),
            location: Set(u.location.clone()),
            age: Set(u.age),
        });
        inserted += imported_user::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(imported_user::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
    }
    Ok(inserted)
}

async fn insert_ratings(
    txn: &DatabaseTransaction,
    rows: Vec<ImportedRatingRow>,
) -> Result<(u64, usize), DomainError> {
    let known_isbns: HashSet<String> = book::Entity::find()
        .select_only()
        .column(book::Column::Isbn)
        .into_tuple::<String>()
        .all(txn)
        .await?
        .into_iter()
        .collect();
    let known_users: HashSet<i32> = imported_user::Entity::find()
        .select_only()
        .column(imported_user::Column::UserId)
        .into_tuple::<i32>()
        .all(txn)
        .await?
        .into_iter()
        .collect();

    let total = rows.len();
    let usable: Vec<ImportedRatingRow> = rows
        .into_iter()
        .filter(|r| known_isbns.contains(&r.isbn) && known_users.contains(&r.user_id))
        .collect();
    let orphaned = total - usable.len();

    let mut inserted = 0;
    for chunk in usable.chunks(BATCH_SIZE) {
        let models = chunk.iter().map(|r| imported_rating::ActiveModel {
            rating: Set(r.rating),
            book_isbn: Set(r.isbn.clone()),
            user_id: Set(r.user_id),
            ..Default::default()
        });
        inserted += imported_rating::Entity::insert_many(models)
            .exec_without_returning(txn)
            .await?;
    }
    Ok((inserted, orphaned))
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>, DomainError> {
    let path = dir.join(name);
    std::fs::read(&path)
        .map_err(|e| DomainError::Internal(format!("Cannot read {}: {}", path.display(), e)))
}

/// Import the three dataset files found in `dir` in a single transaction.
pub async fn import_dataset(
    db: &DatabaseConnection,
    dir: &Path,
) -> Result<ImportSummary, DomainError> {
    let books = parse_books(&read_file(dir, BOOKS_FILE)?);
    let users = parse_users(&read_file(dir, USERS_FILE)?);
    let ratings = parse_ratings(&read_file(dir, RATINGS_FILE)?);
    tracing::info!(
        "Parsed {} books, {} users, {} ratings",
        books.rows.len(),
        users.rows.len(),
        ratings.rows.len()
    );

    let mut summary = ImportSummary {
        skipped: books.skipped + users.skipped + ratings.skipped,
        ..Default::default()
    };

    let txn = db.begin().await?;
    summary.books = insert_books(&txn, books.rows).await?;
    summary.users = insert_users(&txn, users.rows).await?;
    let (inserted, orphaned) = insert_ratings(&txn, ratings.rows).await?;
    summary.ratings = inserted;
    summary.skipped += orphaned;
    txn.commit().await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = "\"ISBN\";\"Book-Title\";\"Book-Author\";\"Year-Of-Publication\";\"Publisher\";\"Image-URL-S\";\"Image-URL-M\";\"Image-URL-L\"\n\
\"0140449266\";\"The Odyssey\";\"Homer\";\"2003\";\"Penguin\";\"s\";\"m\";\"l.jpg\"\n\
\"0000000000\";\"\";\"Nobody\";\"0\";\"\";\"\";\"\";\"\"\n\
\"0451524934\";\"1984\";\"George Orwell\";\"0\";\"Signet\";\"\";\"\";\"\"\n";

    #[test]
    fn books_skip_rows_missing_title() {
        let parsed = parse_books(BOOKS.as_bytes());
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].image_url.as_deref(), Some("l.jpg"));
        assert_eq!(parsed.rows[1].year, None);
    }

    #[test]
    fn books_decode_latin1_and_backslash_quotes() {
        let mut csv = b"\"ISBN\";\"Book-Title\";\"Book-Author\";\"Year-Of-Publication\";\"Publisher\";\"Image-URL-S\";\"Image-URL-M\";\"Image-URL-L\"\n".to_vec();
        csv.extend_from_slice(b"\"0060883286\";\"Cien a\xf1os de soledad\";\"Gabriel Garc\xeda M\xe1rquez\";\"2006\";\"Harper\";\"\";\"\";\"\"\n");
        csv.extend_from_slice(b"\"0140449266\";\"The Odyssey \\\"Penguin\\\" ed\";\"Homer\";\"2003\";\"Penguin\";\"\";\"\";\"\"\n");

        let parsed = parse_books(&csv);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].title, "Cien años de soledad");
        assert_eq!(parsed.rows[0].author, "Gabriel García Márquez");
        assert_eq!(parsed.rows[1].title, "The Odyssey \"Penguin\" ed");
    }

    #[test]
    fn users_treat_null_age_as_missing() {
        let csv = "\"User-ID\";\"Location\";\"Age\"\n\"1\";\"nyc, new york, usa\";NULL\n\"2\";\"stockton, california, usa\";\"18\"\n";
        let parsed = parse_users(csv.as_bytes());
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.rows[0].age, None);
        assert_eq!(parsed.rows[1].age, Some(18));
    }

    #[test]
    fn ratings_outside_scale_are_skipped() {
        let csv = "\"User-ID\";\"ISBN\";\"Book-Rating\"\n\"1\";\"0140449266\";\"8\"\n\"2\";\"0140449266\";\"42\"\n\"x\";\"0140449266\";\"3\"\n";
        let parsed = parse_ratings(csv.as_bytes());
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 2);
    }

    #[tokio::test]
    async fn import_links_ratings_to_known_books_and_users() {
        let dir = std::env::temp_dir().join(format!("bx-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(BOOKS_FILE), BOOKS).unwrap();
        std::fs::write(
            dir.join(USERS_FILE),
            "\"User-ID\";\"Location\";\"Age\"\n\"1\";\"athens, greece\";\"30\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.join(RATINGS_FILE),
            "\"User-ID\";\"ISBN\";\"Book-Rating\"\n\"1\";\"0140449266\";\"9\"\n\"1\";\"9999999999\";\"5\"\n\"7\";\"0451524934\";\"4\"\n",
        )
        .unwrap();

        let db = crate::db::init_db("sqlite::memory:").await.unwrap();
        let summary = import_dataset(&db, &dir).await.unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(summary.books, 2);
        assert_eq!(summary.users, 1);
        assert_eq!(summary.ratings, 1);
        // one unparseable book row, one unknown ISBN, one unknown user
        assert_eq!(summary.skipped, 3);

        let ratings = imported_rating::Entity::find().all(&db).await.unwrap();
        assert_eq!(ratings[0].book_isbn, "0140449266");
        assert_eq!(ratings[0].rating, 9);
    }
}
