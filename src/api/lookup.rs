use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::LookupResult;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    /// ISBN-10 or ISBN-13
    #[serde(default)]
    pub isbn: String,
}

#[utoipa::path(
    get,
    path = "/api/lookupBook",
    params(LookupQuery),
    responses(
        (status = 200, description = "Metadata found", body = LookupResult),
        (status = 404, description = "Unknown ISBN"),
        (status = 502, description = "Lookup service unavailable")
    )
)]
pub async fn lookup_book(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResult>, DomainError> {
    let metadata = state.lookup.lookup_isbn(&query.isbn).await?;
    Ok(Json(metadata))
}
