use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::forms::AddBookForm;

/// Catalog metadata for one ISBN, shaped like a manually entered book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub isbn: String,
    pub title: String,
    pub author: Option<String>,
    pub publish_date: Option<String>,
    pub publisher: Option<String>,
    pub image_url: Option<String>,
}

impl From<BookDraft> for AddBookForm {
    fn from(draft: BookDraft) -> Self {
        Self {
            isbn: draft.isbn,
            title: draft.title,
            author: draft.author.unwrap_or_default(),
            date: draft.publish_date.unwrap_or_default(),
            publisher: draft.publisher.unwrap_or_default(),
            image_url: draft.image_url.unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenLibraryResponse {
    #[serde(flatten)]
    books: HashMap<String, OpenLibraryBook>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: String,
    authors: Option<Vec<OpenLibraryName>>,
    publishers: Option<Vec<OpenLibraryName>>,
    publish_date: Option<String>,
    cover: Option<OpenLibraryCover>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryCover {
    large: Option<String>,
}

/// Look up an ISBN in the Open Library books API.
///
/// `Ok(None)` means the catalog has no entry for the ISBN. Transport errors,
/// non-success statuses and unparseable bodies are `DomainError::External`;
/// nothing is retried.
pub async fn fetch_book_draft(
    client: &reqwest::Client,
    base_url: &str,
    isbn: &str,
) -> Result<Option<BookDraft>, DomainError> {
    let url = format!("{}/api/books", base_url);
    let bibkey = format!("ISBN:{}", isbn);

    let resp = client
        .get(&url)
        .query(&[
            ("bibkeys", bibkey.as_str()),
            ("format", "json"),
            ("jscmd", "data"),
        ])
        .send()
        .await
        .map_err(|e| DomainError::External(format!("Failed to send request: {}", e)))?;

    if !resp.status().is_success() {
        return Err(DomainError::External(format!(
            "Open Library API returned status: {}",
            resp.status()
        )));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| DomainError::External(format!("Failed to read response body: {}", e)))?;

    parse_book_draft(isbn, &body)
}

fn parse_book_draft(isbn: &str, body: &str) -> Result<Option<BookDraft>, DomainError> {
    let parsed: OpenLibraryResponse = serde_json::from_str(body)
        .map_err(|e| DomainError::External(format!("Failed to parse JSON: {}", e)))?;

    let key = format!("ISBN:{}", isbn);
    let Some(book) = parsed.books.get(&key) else {
        return Ok(None);
    };

    let author = book
        .authors
        .as_ref()
        .and_then(|a| a.first())
        .map(|a| a.name.clone());

    let publisher = book
        .publishers
        .as_ref()
        .and_then(|p| p.first())
        .map(|p| p.name.clone());

    // Cover art wins; without one the publisher name stands in for the display image
    let image_url = book
        .cover
        .as_ref()
        .and_then(|c| c.large.clone())
        .or_else(|| publisher.clone());

    Ok(Some(BookDraft {
        isbn: isbn.to_string(),
        title: book.title.clone(),
        author,
        publish_date: book.publish_date.clone(),
        publisher,
        image_url,
    }))
}
