//! ISBN metadata lookup against the Open Library Books API
//!
//! Used by the add-book flow to prefill a candidate before it is appended.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Prefill for a new book; field names line up with `NewBook`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub isbn: String,
    pub title: String,
    /// Comma-separated
    pub authors: String,
    pub cover: String,
    pub publishers: String,
    pub pages: String,
    pub genres: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryResponse {
    #[serde(flatten)]
    books: HashMap<String, OpenLibraryBook>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: String,
    subtitle: Option<String>,
    authors: Option<Vec<Named>>,
    publishers: Option<Vec<Named>>,
    number_of_pages: Option<u32>,
    subjects: Option<Vec<Named>>,
    languages: Option<Vec<LanguageKey>>,
    cover: Option<OpenLibraryCover>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LanguageKey {
    key: String,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryCover {
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Clone)]
pub struct BookLookup {
    http: reqwest::Client,
    base_url: String,
}

impl BookLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::BackendUnavailable(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn lookup_isbn(&self, isbn: &str) -> Result<LookupResult, DomainError> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return Err(DomainError::MissingField("ISBN".to_string()));
        }

        let url = format!("{}/api/books", self.base_url.trim_end_matches('/'));
        let key = format!("ISBN:{}", isbn);

        let resp = self
            .http
            .get(&url)
            .query(&[("bibkeys", key.as_str()), ("format", "json"), ("jscmd", "data")])
            .send()
            .await
            .map_err(|e| DomainError::BackendUnavailable(format!("Failed to send request: {}", e)))?;

        if !resp.status().is_success() {
            return Err(DomainError::BackendUnavailable(format!(
                "Open Library API returned status: {}",
                resp.status()
            )));
        }

        let parsed: OpenLibraryResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::BackendUnavailable(format!("Failed to parse JSON: {}", e)))?;

        let Some(book) = parsed.books.get(&key) else {
            tracing::debug!("Open Library has no entry for {}", isbn);
            return Err(DomainError::NotFound(isbn.to_string()));
        };

        Ok(to_lookup_result(isbn, book))
    }
}

fn join_names(names: Option<&Vec<Named>>, limit: usize) -> String {
    names
        .map(|list| {
            list.iter()
                .map(|n| n.name.trim())
                .filter(|n| {
                    !n.is_empty()
                        && !n.eq_ignore_ascii_case("unknown author")
                        && !n.eq_ignore_ascii_case("unknown")
                })
                .take(limit)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn to_lookup_result(isbn: &str, book: &OpenLibraryBook) -> LookupResult {
    let title = match book.subtitle.as_deref().map(str::trim) {
        Some(sub) if !sub.is_empty() => format!("{}: {}", book.title.trim(), sub),
        _ => book.title.trim().to_string(),
    };

    // "/languages/eng" -> "eng"
    let language = book
        .languages
        .as_ref()
        .and_then(|l| l.first())
        .and_then(|l| l.key.rsplit('/').next())
        .unwrap_or_default()
        .to_string();

    LookupResult {
        isbn: isbn.to_string(),
        title,
        authors: join_names(book.authors.as_ref(), usize::MAX),
        cover: book
            .cover
            .as_ref()
            .and_then(|c| c.large.clone().or(c.medium.clone()))
            .unwrap_or_default(),
        publishers: join_names(book.publishers.as_ref(), usize::MAX),
        pages: book
            .number_of_pages
            .map(|p| p.to_string())
            .unwrap_or_default(),
        genres: join_names(book.subjects.as_ref(), 3),
        language,
    }
}
