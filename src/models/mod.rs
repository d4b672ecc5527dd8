pub mod book;
pub mod cover;

pub use book::{BookRecord, BookState, Field, NewBook};
pub use cover::{decode_cover_cell, encode_cover_cell};
