use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::book::string_or_number;
use crate::models::{BookRecord, NewBook};
use crate::services::inventory_service;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SheetQuery {
    /// Sheet tab, defaults to the configured inventory
    pub sheet_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: String,
    #[serde(default)]
    pub new_location: String,
    pub sheet_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: String,
    #[serde(default)]
    pub requested_by: String,
    pub sheet_name: Option<String>,
}

/// `NewBook` fields plus an optional target tab
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookRequest {
    #[serde(flatten)]
    pub book: NewBook,
    pub sheet_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/getBooks",
    params(SheetQuery),
    responses(
        (status = 200, description = "Books in sheet order", body = [BookRecord]),
        (status = 502, description = "Spreadsheet unavailable")
    )
)]
pub async fn get_books(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<Vec<BookRecord>>, DomainError> {
    let sheet = state.sheet_or_default(query.sheet_name.as_deref());
    let books = inventory_service::list_books(&state.store, sheet).await?;
    Ok(Json(books))
}

#[utoipa::path(
    post,
    path = "/api/checkoutBook",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Book moved, pending request cleared"),
        (status = 400, description = "ISBN or location missing"),
        (status = 404, description = "ISBN not in the sheet")
    )
)]
pub async fn checkout_book(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let sheet = state.sheet_or_default(req.sheet_name.as_deref());
    inventory_service::move_book(&state.store, sheet, &req.isbn, &req.new_location).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Book {} moved to {}", req.isbn.trim(), req.new_location)
    })))
}

#[utoipa::path(
    post,
    path = "/api/requestBook",
    request_body = BookRequest,
    responses(
        (status = 200, description = "Request recorded"),
        (status = 400, description = "ISBN or requester missing"),
        (status = 404, description = "ISBN not in the sheet")
    )
)]
pub async fn request_book(
    State(state): State<AppState>,
    Json(req): Json<BookRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let sheet = state.sheet_or_default(req.sheet_name.as_deref());
    inventory_service::request_book(&state.store, sheet, &req.isbn, &req.requested_by).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Book {} requested by {}", req.isbn.trim(), req.requested_by)
    })))
}

#[utoipa::path(
    post,
    path = "/api/addBook",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book appended"),
        (status = 400, description = "ISBN missing"),
        (status = 409, description = "ISBN already present")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    Json(req): Json<AddBookRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let sheet = state.sheet_or_default(req.sheet_name.as_deref());
    inventory_service::add_book(&state.store, sheet, &req.book).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Book added successfully",
            "isbn": req.book.isbn.trim()
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/getLocations",
    params(SheetQuery),
    responses(
        (status = 200, description = "Permitted locations; empty when none are configured", body = [String])
    )
)]
pub async fn get_locations(
    State(state): State<AppState>,
    Query(query): Query<SheetQuery>,
) -> Json<Vec<String>> {
    let sheet = state.sheet_or_default(query.sheet_name.as_deref());
    Json(inventory_service::get_location_options(&state.store, sheet).await)
}
