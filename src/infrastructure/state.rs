//! Application state shared across all handlers

use std::sync::Arc;

use super::config::Config;
use super::record_store::RecordStore;
use super::sheets_backend::GoogleSheetsBackend;
use crate::domain::{DomainError, SheetBackend};
use crate::services::BookLookup;

#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub lookup: BookLookup,
    /// Tab used when a request does not name one
    pub default_sheet: String,
}

impl AppState {
    pub fn new(backend: Arc<dyn SheetBackend>, lookup: BookLookup, default_sheet: &str) -> Self {
        Self {
            store: RecordStore::new(backend),
            lookup,
            default_sheet: default_sheet.to_string(),
        }
    }

    /// State backed by the real Google Sheets API
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let backend = GoogleSheetsBackend::new(config.sheets.clone())?;
        let lookup = BookLookup::new(&config.openlibrary_base, config.sheets.timeout)?;
        Ok(Self::new(Arc::new(backend), lookup, &config.default_sheet))
    }

    /// `requested` when given and non-blank, otherwise the default tab
    pub fn sheet_or_default<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.default_sheet.as_str(),
        }
    }
}
