use utoipa::OpenApi;

use crate::api;
use crate::api::books::{BookRequest, CheckoutRequest};
use crate::models::{BookRecord, NewBook};
use crate::services::LookupResult;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::get_books,
        api::books::add_book,
        api::books::checkout_book,
        api::books::request_book,
        api::books::get_locations,
        api::lookup::lookup_book,
    ),
    components(schemas(BookRecord, NewBook, CheckoutRequest, BookRequest, LookupResult)),
    tags(
        (name = "inventory", description = "Spreadsheet-backed book inventory")
    )
)]
pub struct ApiDoc;
