//! Services Layer
//!
//! Inventory rules and metadata lookup, independent of the HTTP layer.

pub mod inventory_service;
pub mod lookup_service;

pub use lookup_service::{BookLookup, LookupResult};
