//! Spreadsheet record store
//!
//! Treats one tab as a table: row 1 holds headers, every later row is a record keyed by ISBN.
//! Header text is resolved to [`Field`] once per read; nothing past this module sees header
//! strings or formula-wrapped cover cells.

use std::sync::Arc;

use crate::domain::{
    BackendError, CellWrite, DomainError, Grid, RangeReference, SheetBackend, SheetRange,
    ValidationRule,
};
use crate::domain::range::column_to_letters;
use crate::models::{BookRecord, Field, decode_cover_cell};

/// A record together with the physical sheet row it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-indexed; the header is row 1 so the first record is usually row 2
    pub row: u32,
    pub book: BookRecord,
}

#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn SheetBackend>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self { backend }
    }

    /// Every valid record of `sheet`, in sheet order. A missing tab reads as empty.
    pub async fn read_all(&self, sheet: &str) -> Result<Vec<BookRecord>, DomainError> {
        Ok(self
            .read_rows(sheet)
            .await?
            .into_iter()
            .map(|r| r.book)
            .collect())
    }

    /// Like [`read_all`](Self::read_all) but keeps each record's sheet row.
    pub async fn read_rows(&self, sheet: &str) -> Result<Vec<SheetRow>, DomainError> {
        let grid = match self.backend.read_values(&SheetRange::whole(sheet)).await {
            Ok(grid) => grid,
            Err(BackendError::MissingRange(range)) => {
                tracing::info!("Sheet \"{}\" not found ({}), returning no rows", sheet, range);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(headers) = grid.first() {
            for (field, col) in misplaced_write_columns(&header_fields(headers)) {
                tracing::warn!(
                    "Sheet \"{}\" has {:?} in column {} but updates write column {}",
                    sheet,
                    field,
                    column_to_letters(col),
                    column_to_letters(field.column())
                );
            }
        }

        let rows = rows_from_grid(grid);
        tracing::debug!("Read {} records from sheet \"{}\"", rows.len(), sheet);
        Ok(rows)
    }

    /// Physical row of the record whose trimmed ISBN equals `isbn` (also trimmed).
    ///
    /// Re-reads the whole tab on every call.
    pub async fn find_row_index_by_isbn(
        &self,
        sheet: &str,
        isbn: &str,
    ) -> Result<Option<u32>, DomainError> {
        let wanted = isbn.trim();
        Ok(self
            .read_rows(sheet)
            .await?
            .into_iter()
            .find(|r| r.book.isbn == wanted)
            .map(|r| r.row))
    }

    pub async fn write_cell(
        &self,
        sheet: &str,
        column: usize,
        row: u32,
        value: &str,
    ) -> Result<(), DomainError> {
        self.write_cells(&[CellWrite::new(sheet, column, row, value)])
            .await
    }

    /// All writes go out as one batched request
    pub async fn write_cells(&self, writes: &[CellWrite]) -> Result<(), DomainError> {
        tracing::debug!("Writing {} cell(s)", writes.len());
        self.backend.write_cells(writes).await?;
        Ok(())
    }

    /// Append after the used area; formula text (e.g. the cover cell) stays live
    pub async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), DomainError> {
        self.backend.append_row(sheet, values).await?;
        Ok(())
    }

    /// Permitted values configured on `column` of `sheet`.
    ///
    /// The first list or range rule found top-to-bottom wins. A range rule is resolved by
    /// reading the referenced range, flattening it and dropping blank cells. No rule, or a
    /// missing tab, yields an empty list.
    pub async fn get_validation_list(
        &self,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<String>, DomainError> {
        let rules = match self.backend.column_validation(sheet, column).await {
            Ok(rules) => rules,
            Err(BackendError::MissingRange(range)) => {
                tracing::info!("No validation metadata for {}", range);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        for rule in rules {
            match rule {
                ValidationRule::OneOfList(values) => {
                    return Ok(values.into_iter().filter(|v| !v.trim().is_empty()).collect());
                }
                ValidationRule::OneOfRange(formula) => {
                    let read = match RangeReference::parse(&formula, sheet) {
                        Ok(RangeReference::Range(range)) => self.backend.read_values(&range).await,
                        Ok(RangeReference::Named(name)) => {
                            self.backend.read_named_range(&name).await
                        }
                        Err(e) => {
                            tracing::warn!("Unusable validation range {:?}: {}", formula, e);
                            continue;
                        }
                    };
                    return match read {
                        Ok(grid) => Ok(flatten_non_blank(grid)),
                        Err(BackendError::MissingRange(_)) => Ok(Vec::new()),
                        Err(e) => Err(e.into()),
                    };
                }
                ValidationRule::Other(_) => continue,
            }
        }

        Ok(Vec::new())
    }
}

/// Header row -> field per column. Later duplicates of a field are ignored.
fn header_fields(headers: &[String]) -> Vec<Option<Field>> {
    let mut seen = Vec::new();
    headers
        .iter()
        .map(|h| {
            let field = Field::from_header(h)?;
            if seen.contains(&field) {
                return None;
            }
            seen.push(field);
            Some(field)
        })
        .collect()
}

/// Write-target fields whose header sits outside the fixed column moves and requests write to
fn misplaced_write_columns(fields: &[Option<Field>]) -> Vec<(Field, usize)> {
    [Field::Location, Field::RequestedBy]
        .into_iter()
        .filter_map(|field| {
            let col = fields.iter().position(|f| *f == Some(field))?;
            (col != field.column()).then_some((field, col))
        })
        .collect()
}

fn rows_from_grid(grid: Grid) -> Vec<SheetRow> {
    let mut rows = grid.into_iter();
    let Some(headers) = rows.next() else {
        return Vec::new();
    };
    let fields = header_fields(&headers);

    rows.enumerate()
        .filter_map(|(idx, cells)| {
            if cells.iter().all(|c| c.trim().is_empty()) {
                return None;
            }

            let mut book = BookRecord::default();
            for (col, field) in fields.iter().enumerate() {
                let Some(field) = field else { continue };
                let raw = cells.get(col).map(String::as_str).unwrap_or("");
                let value = match field {
                    Field::Isbn => raw.trim().to_string(),
                    Field::Cover => decode_cover_cell(raw).unwrap_or_default(),
                    _ => raw.to_string(),
                };
                book.set(*field, value);
            }

            if book.isbn.is_empty() {
                return None;
            }

            Some(SheetRow {
                row: idx as u32 + 2,
                book,
            })
        })
        .collect()
}

fn flatten_non_blank(grid: Grid) -> Vec<String> {
    grid.into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryBackend;

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

    fn store(backend: MemoryBackend) -> RecordStore {
        RecordStore::new(Arc::new(backend))
    }

    #[tokio::test]
    async fn header_only_sheet_is_empty() {
        let s = store(MemoryBackend::new().with_sheet("Inventory", &[HEADERS]));
        assert!(s.read_all("Inventory").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_sheet_is_empty() {
        let s = store(MemoryBackend::new());
        assert!(s.read_all("Adult Inventory").await.unwrap().is_empty());
        assert_eq!(
            s.find_row_index_by_isbn("Adult Inventory", "1").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn backend_faults_propagate() {
        let backend = MemoryBackend::new().with_sheet("Inventory", &[HEADERS]);
        backend.fail_with("connection reset");
        let err = store(backend).read_all("Inventory").await.unwrap_err();
        assert!(matches!(err, DomainError::BackendUnavailable(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn skips_blank_rows_and_blank_isbns() {
        let s = store(MemoryBackend::new().with_sheet(
            "Inventory",
            &[
                HEADERS,
                &["111", "", "First"],
                &["", "", "", ""],
                &["   ", "", "No key", "Someone"],
                &[" 222 ", "", "Second"],
            ],
        ));

        let rows = s.read_rows("Inventory").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].book.title, "First");
        // physical row survives skipped rows
        assert_eq!(rows[1].row, 5);
        assert_eq!(rows[1].book.isbn, "222");
        assert_eq!(rows[1].book.location, "");

        assert_eq!(
            s.find_row_index_by_isbn("Inventory", "222 ").await.unwrap(),
            Some(5)
        );
        assert_eq!(s.find_row_index_by_isbn("Inventory", "333").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lowercase_and_reordered_headers() {
        let s = store(MemoryBackend::new().with_sheet(
            "Inventory",
            &[
                &["title", "isbn", "location", "cover", "Mystery"],
                &["Dune", "9780441013593", "Den", "=IMAGE(\"https://x.test/d.jpg\")", "?"],
            ],
        ));

        let books = s.read_all("Inventory").await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn, "9780441013593");
        assert_eq!(books[0].title, "Dune");
        assert_eq!(books[0].location, "Den");
        assert_eq!(books[0].cover, "https://x.test/d.jpg");
        assert_eq!(books[0].requested_by, "");
    }

    #[test]
    fn write_columns_checked_against_headers() {
        let standard: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        assert!(misplaced_write_columns(&header_fields(&standard)).is_empty());

        let reordered: Vec<String> = ["title", "isbn", "location", "cover", "requested by"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        assert_eq!(
            misplaced_write_columns(&header_fields(&reordered)),
            vec![(Field::Location, 2), (Field::RequestedBy, 4)]
        );

        // absent columns are not reported
        let bare = vec!["ISBN".to_string()];
        assert!(misplaced_write_columns(&header_fields(&bare)).is_empty());
    }

    #[tokio::test]
    async fn unqualified_validation_range_reads_current_tab() {
        let s = store(
            MemoryBackend::new()
                .with_sheet(
                    "Adult Inventory",
                    &[
                        &["ISBN", "", "", "", "", "", "", "", "", "", "", "", "Rooms"],
                        &["1", "", "", "", "", "", "", "", "", "", "", "", "Study"],
                    ],
                )
                .with_validation(
                    "Adult Inventory",
                    5,
                    ValidationRule::OneOfRange("=$M$2:$M".into()),
                ),
        );
        assert_eq!(
            s.get_validation_list("Adult Inventory", 5).await.unwrap(),
            vec!["Study"]
        );
    }

    #[tokio::test]
    async fn named_validation_range_is_read_by_name() {
        let s = store(
            MemoryBackend::new()
                .with_sheet("Inventory", &[HEADERS])
                .with_sheet("Lists", &[&["Den"], &[""], &["Garage"]])
                .with_named_range("LocationList", SheetRange::column("Lists", 0))
                .with_validation(
                    "Inventory",
                    5,
                    ValidationRule::OneOfRange("=LocationList".into()),
                ),
        );
        assert_eq!(
            s.get_validation_list("Inventory", 5).await.unwrap(),
            vec!["Den", "Garage"]
        );
    }

    #[tokio::test]
    async fn explicit_list_validation_keeps_order() {
        let s = store(
            MemoryBackend::new()
                .with_sheet("Inventory", &[HEADERS])
                .with_validation(
                    "Inventory",
                    5,
                    ValidationRule::OneOfList(vec!["Living Room".into(), "Kitchen".into()]),
                ),
        );
        assert_eq!(
            s.get_validation_list("Inventory", 5).await.unwrap(),
            vec!["Living Room", "Kitchen"]
        );
    }

    #[tokio::test]
    async fn range_validation_is_resolved() {
        let s = store(
            MemoryBackend::new()
                .with_sheet("Inventory", &[HEADERS])
                .with_sheet(
                    "Locations",
                    &[&["Location"], &["Shelf A"], &[""], &["Shelf B"]],
                )
                .with_validation("Inventory", 5, ValidationRule::Other("BOOLEAN".into()))
                .with_validation(
                    "Inventory",
                    5,
                    ValidationRule::OneOfRange("=Locations!$A$2:$A".into()),
                ),
        );
        assert_eq!(
            s.get_validation_list("Inventory", 5).await.unwrap(),
            vec!["Shelf A", "Shelf B"]
        );
    }

    #[tokio::test]
    async fn no_rule_means_no_values() {
        let s = store(MemoryBackend::new().with_sheet("Inventory", &[HEADERS]));
        assert!(s.get_validation_list("Inventory", 5).await.unwrap().is_empty());
        assert!(s.get_validation_list("Missing", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batched_write_is_one_request() {
        let backend = Arc::new(
            MemoryBackend::new().with_sheet("Inventory", &[HEADERS, &["111", "", "T"]]),
        );
        let s = RecordStore::new(backend.clone());
        s.write_cells(&[
            CellWrite::new("Inventory", 5, 2, "Shelf B"),
            CellWrite::new("Inventory", 11, 2, ""),
        ])
        .await
        .unwrap();
        s.write_cell("Inventory", 9, 2, "French").await.unwrap();

        assert_eq!(backend.write_requests(), 2);
        let books = s.read_all("Inventory").await.unwrap();
        assert_eq!(books[0].location, "Shelf B");
        assert_eq!(books[0].language, "French");
    }
}
