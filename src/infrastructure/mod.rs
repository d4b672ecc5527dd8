//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - Google service-account authorisation (google_auth)
//! - Spreadsheet backends (sheets_backend, memory_backend)
//! - The spreadsheet record store (record_store)
//! - Application state and HTTP server setup (state, server)

pub mod config;
pub mod google_auth;
pub mod memory_backend;
pub mod record_store;
pub mod server;
pub mod sheets_backend;
pub mod state;

pub use memory_backend::MemoryBackend;
pub use record_store::{RecordStore, SheetRow};
pub use sheets_backend::GoogleSheetsBackend;
pub use state::AppState;
