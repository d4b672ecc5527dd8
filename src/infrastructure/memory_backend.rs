//! In-process spreadsheet used by tests and offline demos.
//!
//! Reads return formula text as stored, like the Sheets API with `valueRenderOption=FORMULA`.
//! Appends parse input the way `valueInputOption=USER_ENTERED` does for numbers and quotes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::{BackendError, CellWrite, Grid, SheetBackend, SheetRange, ValidationRule};

#[derive(Default)]
pub struct MemoryBackend {
    sheets: Mutex<HashMap<String, Grid>>,
    validations: Mutex<HashMap<(String, usize), Vec<ValidationRule>>>,
    named_ranges: Mutex<HashMap<String, SheetRange>>,
    write_requests: AtomicUsize,
    unavailable: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a tab from literal rows
    pub fn with_sheet(self, name: &str, rows: &[&[&str]]) -> Self {
        let grid = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.lock_sheets().insert(name.to_string(), grid);
        self
    }

    pub fn with_validation(self, sheet: &str, column: usize, rule: ValidationRule) -> Self {
        self.lock_validations()
            .entry((sheet.to_string(), column))
            .or_default()
            .push(rule);
        self
    }

    pub fn with_named_range(self, name: &str, range: SheetRange) -> Self {
        self.named_ranges
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), range);
        self
    }

    /// Make every subsequent call fail with `BackendError::Unavailable`
    pub fn fail_with(&self, message: &str) {
        *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.to_string());
    }

    /// Snapshot of a tab, trailing blanks included
    pub fn sheet(&self, name: &str) -> Option<Grid> {
        self.lock_sheets().get(name).cloned()
    }

    /// Text of one cell (0-indexed column, 1-indexed row)
    pub fn cell(&self, name: &str, column: usize, row: u32) -> Option<String> {
        let sheets = self.lock_sheets();
        let grid = sheets.get(name)?;
        let row = grid.get(row.checked_sub(1)? as usize)?;
        Some(row.get(column).cloned().unwrap_or_default())
    }

    /// Number of write or append requests received
    pub fn write_requests(&self) -> usize {
        self.write_requests.load(Ordering::SeqCst)
    }

    fn lock_sheets(&self) -> std::sync::MutexGuard<'_, HashMap<String, Grid>> {
        self.sheets.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_validations(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(String, usize), Vec<ValidationRule>>> {
        self.validations.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), BackendError> {
        match self
            .unavailable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(msg) => Err(BackendError::Unavailable(msg.clone())),
            None => Ok(()),
        }
    }
}

fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

/// Stored form of a typed cell: `'` forces text, plain numbers lose their formatting
fn user_entered(input: &str) -> String {
    if let Some(text) = input.strip_prefix('\'') {
        return text.to_string();
    }
    let numeric = !input.is_empty()
        && input.bytes().any(|b| b.is_ascii_digit())
        && input
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'));
    if numeric {
        if let Ok(n) = input.parse::<i64>() {
            return n.to_string();
        }
        if let Ok(n) = input.parse::<f64>() {
            return n.to_string();
        }
    }
    input.to_string()
}

/// Drop trailing blank cells and rows, as the Sheets API does
fn trim_grid(mut grid: Grid) -> Grid {
    for row in grid.iter_mut() {
        while row.last().is_some_and(|c| is_blank(c)) {
            row.pop();
        }
    }
    while grid.last().is_some_and(|r| r.is_empty()) {
        grid.pop();
    }
    grid
}

#[async_trait]
impl SheetBackend for MemoryBackend {
    async fn read_values(&self, range: &SheetRange) -> Result<Grid, BackendError> {
        self.check_available()?;

        let sheets = self.lock_sheets();
        let grid = sheets
            .get(&range.sheet)
            .ok_or_else(|| BackendError::MissingRange(range.to_string()))?;

        let first_row = range.start.row.unwrap_or(1) as usize;
        let last_row = range.end.row.map(|r| r as usize).unwrap_or(grid.len());
        let first_col = range.start.col.unwrap_or(0);
        let last_col = range.end.col;

        let rows = grid
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx + 1 >= first_row && idx + 1 <= last_row)
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(c, _)| *c >= first_col && last_col.is_none_or(|last| *c <= last))
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();

        Ok(trim_grid(rows))
    }

    async fn read_named_range(&self, name: &str) -> Result<Grid, BackendError> {
        let range = self
            .named_ranges
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::MissingRange(name.to_string()))?;
        self.read_values(&range).await
    }

    async fn write_cells(&self, writes: &[CellWrite]) -> Result<(), BackendError> {
        self.check_available()?;
        self.write_requests.fetch_add(1, Ordering::SeqCst);

        let mut sheets = self.lock_sheets();
        for w in writes {
            let grid = sheets
                .get_mut(&w.sheet)
                .ok_or_else(|| BackendError::Unavailable(format!("No sheet {}", w.sheet)))?;
            let row_idx = (w.row as usize).saturating_sub(1);
            if grid.len() <= row_idx {
                grid.resize(row_idx + 1, Vec::new());
            }
            let row = &mut grid[row_idx];
            if row.len() <= w.column {
                row.resize(w.column + 1, String::new());
            }
            row[w.column] = w.value.clone();
        }
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<(), BackendError> {
        self.check_available()?;
        self.write_requests.fetch_add(1, Ordering::SeqCst);

        let mut sheets = self.lock_sheets();
        let grid = sheets
            .get_mut(sheet)
            .ok_or_else(|| BackendError::Unavailable(format!("No sheet {}", sheet)))?;

        // Land after the last non-blank row
        while grid.last().is_some_and(|r| r.iter().all(|c| is_blank(c))) {
            grid.pop();
        }
        grid.push(values.iter().map(|v| user_entered(v)).collect());
        Ok(())
    }

    async fn column_validation(
        &self,
        sheet: &str,
        column: usize,
    ) -> Result<Vec<ValidationRule>, BackendError> {
        self.check_available()?;

        if !self.lock_sheets().contains_key(sheet) {
            return Err(BackendError::MissingRange(
                SheetRange::column(sheet, column).to_string(),
            ));
        }

        Ok(self
            .lock_validations()
            .get(&(sheet.to_string(), column))
            .cloned()
            .unwrap_or_default())
    }
}
