//! Inventory Service - domain rules on top of the record store
//!
//! ISBN uniqueness, the fixed append layout, and the location/requester transitions:
//! a move always clears the requester, a request never touches the location.

use crate::domain::{CellWrite, DomainError};
use crate::infrastructure::RecordStore;
use crate::models::{BookRecord, Field, NewBook, encode_cover_cell};

/// All books of `sheet`, in sheet order
pub async fn list_books(store: &RecordStore, sheet: &str) -> Result<Vec<BookRecord>, DomainError> {
    store.read_all(sheet).await
}

/// Append `candidate` unless its ISBN is blank or already present
pub async fn add_book(
    store: &RecordStore,
    sheet: &str,
    candidate: &NewBook,
) -> Result<(), DomainError> {
    let isbn = candidate.isbn.trim();
    if isbn.is_empty() {
        return Err(DomainError::MissingField("ISBN".to_string()));
    }

    let existing = store.read_all(sheet).await?;
    if existing.iter().any(|b| b.isbn == isbn) {
        tracing::warn!("Rejecting duplicate ISBN {} in sheet \"{}\"", isbn, sheet);
        return Err(DomainError::DuplicateKey(isbn.to_string()));
    }

    let row = build_row(candidate);
    store.append_row(sheet, &row).await?;

    tracing::info!("Added book {} to sheet \"{}\"", isbn, sheet);
    Ok(())
}

/// Cells A..K of a new row. The cover becomes an `=IMAGE(...)` formula; every other cell is
/// quoted so the sheet keeps it as typed (`0140449132` stays text, `3/4` is not a date).
pub fn build_row(candidate: &NewBook) -> Vec<String> {
    Field::ROW_ORDER
        .iter()
        .map(|field| match field {
            Field::Isbn => literal(candidate.isbn.trim()),
            Field::Cover => encode_cover_cell(&candidate.cover),
            Field::Title => literal(&candidate.title),
            Field::Authors => literal(&candidate.authors),
            Field::ReadingLevel => literal(&candidate.reading_level),
            Field::Location => literal(&candidate.location),
            Field::Publishers => literal(&candidate.publishers),
            Field::Pages => literal(&candidate.pages),
            Field::Genres => literal(&candidate.genres),
            Field::Language => literal(&candidate.language),
            Field::Notes => literal(&candidate.notes),
            Field::RequestedBy => String::new(),
        })
        .collect()
}

fn literal(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("'{}", value)
    }
}

/// Set a new location and clear any pending request, in one batched write
pub async fn move_book(
    store: &RecordStore,
    sheet: &str,
    isbn: &str,
    new_location: &str,
) -> Result<(), DomainError> {
    let isbn = isbn.trim();
    if isbn.is_empty() {
        return Err(DomainError::MissingField("ISBN".to_string()));
    }
    if new_location.trim().is_empty() {
        return Err(DomainError::MissingField("location".to_string()));
    }

    let row = locate(store, sheet, isbn).await?;
    store
        .write_cells(&[
            CellWrite::new(sheet, Field::Location.column(), row, new_location),
            CellWrite::new(sheet, Field::RequestedBy.column(), row, ""),
        ])
        .await?;

    tracing::info!("Moved book {} to \"{}\" (row {})", isbn, new_location, row);
    Ok(())
}

/// Record who asked for the book; the location is left alone
pub async fn request_book(
    store: &RecordStore,
    sheet: &str,
    isbn: &str,
    requested_by: &str,
) -> Result<(), DomainError> {
    let isbn = isbn.trim();
    if isbn.is_empty() {
        return Err(DomainError::MissingField("ISBN".to_string()));
    }
    if requested_by.trim().is_empty() {
        return Err(DomainError::MissingField("requestedBy".to_string()));
    }

    let row = locate(store, sheet, isbn).await?;
    store
        .write_cell(sheet, Field::RequestedBy.column(), row, requested_by)
        .await?;

    tracing::info!("Book {} requested by \"{}\" (row {})", isbn, requested_by, row);
    Ok(())
}

/// Permitted locations for `sheet`. Any failure degrades to an empty list so callers can
/// fall back to free-text entry.
pub async fn get_location_options(store: &RecordStore, sheet: &str) -> Vec<String> {
    match store
        .get_validation_list(sheet, Field::Location.column())
        .await
    {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Failed to fetch location options for \"{}\": {}", sheet, e);
            Vec::new()
        }
    }
}

async fn locate(store: &RecordStore, sheet: &str, isbn: &str) -> Result<u32, DomainError> {
    store
        .find_row_index_by_isbn(sheet, isbn)
        .await?
        .ok_or_else(|| DomainError::NotFound(isbn.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationRule;
    use crate::infrastructure::MemoryBackend;
    use crate::models::BookState;
    use std::sync::Arc;

    const SHEET: &str = "Inventory";
    const HEADERS: &[&str] = &[
        "ISBN",
        "Cover",
        "Title",
        "Authors",
        "Reading Level",
        "Location",
        "Publishers",
        "Pages",
        "Genres",
        "Language",
        "Notes",
        "RequestedBy",
    ];

    fn setup(rows: &[&[&str]]) -> (Arc<MemoryBackend>, RecordStore) {
        let mut all: Vec<&[&str]> = vec![HEADERS];
        all.extend_from_slice(rows);
        let backend = Arc::new(MemoryBackend::new().with_sheet(SHEET, &all));
        let store = RecordStore::new(backend.clone());
        (backend, store)
    }

    fn candidate(isbn: &str) -> NewBook {
        NewBook {
            isbn: isbn.to_string(),
            cover: "https://example.com/cover.jpg".to_string(),
            title: "The Odyssey".to_string(),
            authors: "Homer".to_string(),
            reading_level: "Adult".to_string(),
            location: "Shelf A".to_string(),
            publishers: "Penguin".to_string(),
            pages: "541".to_string(),
            genres: "Epic".to_string(),
            language: "English".to_string(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn empty_sheet_lists_nothing() {
        let (_, store) = setup(&[]);
        assert!(list_books(&store, SHEET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_then_list_round_trips() {
        let (backend, store) = setup(&[]);
        add_book(&store, SHEET, &candidate(" 9780140449136 ")).await.unwrap();

        // Stored as a live formula
        assert_eq!(
            backend.cell(SHEET, 1, 2).as_deref(),
            Some(r#"=IMAGE("https://example.com/cover.jpg")"#)
        );
        assert_eq!(backend.cell(SHEET, 0, 2).as_deref(), Some("9780140449136"));

        let books = list_books(&store, SHEET).await.unwrap();
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.isbn, "9780140449136");
        assert_eq!(book.cover, "https://example.com/cover.jpg");
        assert_eq!(book.title, "The Odyssey");
        assert_eq!(book.authors, "Homer");
        assert_eq!(book.reading_level, "Adult");
        assert_eq!(book.pages, "541");
        assert_eq!(book.state(), BookState::Shelved { location: "Shelf A" });
    }

    #[tokio::test]
    async fn duplicate_isbn_is_rejected_without_append() {
        let (backend, store) = setup(&[]);
        add_book(&store, SHEET, &candidate("9780140449136")).await.unwrap();

        let err = add_book(&store, SHEET, &candidate("9780140449136 "))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateKey("9780140449136".to_string()));
        assert_eq!(backend.write_requests(), 1);
        assert_eq!(list_books(&store, SHEET).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_isbn_is_missing_field() {
        let (backend, store) = setup(&[]);
        let err = add_book(&store, SHEET, &candidate("   ")).await.unwrap_err();
        assert_eq!(err, DomainError::MissingField("ISBN".to_string()));
        assert_eq!(backend.write_requests(), 0);
    }

    #[tokio::test]
    async fn missing_cover_leaves_cell_empty() {
        let (backend, store) = setup(&[]);
        let mut book = candidate("1");
        book.cover = String::new();
        add_book(&store, SHEET, &book).await.unwrap();
        assert_eq!(backend.cell(SHEET, 1, 2).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn move_clears_requester() {
        let (backend, store) = setup(&[&[
            "111", "", "T", "", "", "Shelf A", "", "", "", "", "", "Alice",
        ]]);

        move_book(&store, SHEET, "111", "Shelf B").await.unwrap();

        let book = &list_books(&store, SHEET).await.unwrap()[0];
        assert_eq!(book.location, "Shelf B");
        assert_eq!(book.requested_by, "");
        assert_eq!(book.state(), BookState::Shelved { location: "Shelf B" });
        // location and requester went out together
        assert_eq!(backend.write_requests(), 1);
    }

    #[tokio::test]
    async fn request_keeps_location() {
        let (_, store) = setup(&[&["111", "", "T", "", "", "Shelf A"]]);

        request_book(&store, SHEET, " 111", "Alice").await.unwrap();
        let book = &list_books(&store, SHEET).await.unwrap()[0];
        assert_eq!(
            book.state(),
            BookState::Requested {
                location: "Shelf A",
                requested_by: "Alice"
            }
        );

        // A second request replaces the first
        request_book(&store, SHEET, "111", "Bob").await.unwrap();
        let book = &list_books(&store, SHEET).await.unwrap()[0];
        assert_eq!(book.requested_by, "Bob");
        assert_eq!(book.location, "Shelf A");
    }

    #[tokio::test]
    async fn unknown_isbn_is_not_found_and_writes_nothing() {
        let (backend, store) = setup(&[&["111", "", "T"]]);

        let err = move_book(&store, SHEET, "999", "Shelf B").await.unwrap_err();
        assert_eq!(err, DomainError::NotFound("999".to_string()));
        let err = request_book(&store, SHEET, "999", "Alice").await.unwrap_err();
        assert_eq!(err, DomainError::NotFound("999".to_string()));

        assert_eq!(backend.write_requests(), 0);
    }

    #[tokio::test]
    async fn blank_location_or_requester_is_rejected() {
        let (backend, store) = setup(&[&["111", "", "T"]]);
        assert_eq!(
            move_book(&store, SHEET, "111", "  ").await.unwrap_err(),
            DomainError::MissingField("location".to_string())
        );
        assert_eq!(
            request_book(&store, SHEET, "111", "").await.unwrap_err(),
            DomainError::MissingField("requestedBy".to_string())
        );
        assert_eq!(backend.write_requests(), 0);
    }

    #[tokio::test]
    async fn writes_target_the_physical_row() {
        let (backend, store) = setup(&[&["111", "", "A"], &[], &["222", "", "B"]]);
        move_book(&store, SHEET, "222", "Attic").await.unwrap();
        assert_eq!(backend.cell(SHEET, 5, 4).as_deref(), Some("Attic"));
        assert_eq!(backend.cell(SHEET, 5, 2).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn location_options_from_list_and_fallbacks() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_sheet(SHEET, &[HEADERS])
                .with_validation(
                    SHEET,
                    Field::Location.column(),
                    ValidationRule::OneOfList(vec!["Living Room".into(), "Kitchen".into()]),
                ),
        );
        let store = RecordStore::new(backend.clone());
        assert_eq!(
            get_location_options(&store, SHEET).await,
            vec!["Living Room", "Kitchen"]
        );

        let (_, bare) = setup(&[]);
        assert!(get_location_options(&bare, SHEET).await.is_empty());

        backend.fail_with("quota exceeded");
        assert!(get_location_options(&store, SHEET).await.is_empty());
    }

    #[test]
    fn row_layout_is_fixed() {
        let row = build_row(&candidate(" 42 "));
        assert_eq!(row.len(), 11);
        assert_eq!(row[0], "'42");
        assert_eq!(row[1], r#"=IMAGE("https://example.com/cover.jpg")"#);
        assert_eq!(row[5], "'Shelf A");
        assert_eq!(row[7], "'541");
        assert_eq!(row[10], "");
    }

    #[tokio::test]
    async fn leading_zero_isbn_keeps_its_identity() {
        let (backend, store) = setup(&[]);
        let mut book = candidate("0140449132");
        book.notes = "3/4".to_string();
        add_book(&store, SHEET, &book).await.unwrap();

        assert_eq!(backend.cell(SHEET, 0, 2).as_deref(), Some("0140449132"));
        let listed = &list_books(&store, SHEET).await.unwrap()[0];
        assert_eq!(listed.isbn, "0140449132");
        assert_eq!(listed.notes, "3/4");

        let err = add_book(&store, SHEET, &candidate("0140449132"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateKey("0140449132".to_string()));

        move_book(&store, SHEET, "0140449132", "Den").await.unwrap();
        assert_eq!(backend.cell(SHEET, 5, 2).as_deref(), Some("Den"));
    }
}
