pub mod books;
pub mod error;
pub mod health;
pub mod lookup;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Inventory
        .route("/getBooks", get(books::get_books))
        .route("/addBook", post(books::add_book))
        .route("/checkoutBook", post(books::checkout_book))
        .route("/requestBook", post(books::request_book))
        .route("/getLocations", get(books::get_locations))
        // Lookup
        .route("/lookupBook", get(lookup::lookup_book))
        .with_state(state)
}
