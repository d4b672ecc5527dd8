//! Spreadsheet backend contract
//!
//! The record store talks to the spreadsheet only through this trait.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::BackendError;
use super::range::SheetRange;

/// Row-major cell text. Formulas are kept as their formula text.
pub type Grid = Vec<Vec<String>>;

/// A single-cell overwrite at an absolute position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub sheet: String,
    /// 0-indexed column
    pub column: usize,
    /// 1-indexed sheet row (row 1 is the header)
    pub row: u32,
    pub value: String,
}

impl CellWrite {
    pub fn new(sheet: &str, column: usize, row: u32, value: impl Into<String>) -> Self {
        Self {
            sheet: sheet.to_string(),
            column,
            row,
            value: value.into(),
        }
    }

    pub fn range(&self) -> SheetRange {
        SheetRange::cell(self.sheet.clone(), self.column, self.row)
    }
}

/// Data-validation rule attached to a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Explicit enumerated values (`ONE_OF_LIST`)
    OneOfList(Vec<String>),
    /// Values taken from another range; holds the formula text, e.g. `=Locations!A2:A` (`ONE_OF_RANGE`)
    OneOfRange(String),
    /// Any other condition type (numbers, dates, checkboxes, ...)
    Other(String),
}

#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Read a range as raw cell text, formulas preserved.
    ///
    /// Returns `BackendError::MissingRange` when the tab does not exist.
    async fn read_values(&self, range: &SheetRange) -> Result<Grid, BackendError>;

    /// Read a spreadsheet-level named range. An unknown name is `BackendError::MissingRange`.
    async fn read_named_range(&self, name: &str) -> Result<Grid, BackendError>;

    /// Apply every write in one batched request.
    async fn write_cells(&self, writes: &[CellWrite]) -> Result<(), BackendError>;

    /// Append one row after the used area of `sheet`.
    ///
    /// Cells are parsed as if typed into the sheet: `=` starts a formula, numeric text becomes
    /// a number and a leading `'` keeps the rest as literal text.
    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), BackendError>;

    /// Validation rules found in `column` of `sheet`, top to bottom, skipping cells without one.
    async fn column_validation(
        &self,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<ValidationRule>, BackendError>;
}
