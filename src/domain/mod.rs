//! Domain layer - Pure inventory abstractions
//!
//! This layer contains NO framework dependencies (no Axum, no reqwest).
//! Only the backend trait, range addressing and domain error types.

pub mod errors;
pub mod range;
pub mod repositories;

pub use errors::{BackendError, DomainError};
pub use range::{Bound, RangeParseError, RangeReference, SheetRange};
pub use repositories::*;
