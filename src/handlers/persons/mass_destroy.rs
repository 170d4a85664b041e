use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MassDestroyRequest {
    pub indices: Vec<i64>,
}

/// POST /api/contacts/persons/mass-destroy
pub async fn mass_destroy(
    State(state): State<AppState>,
    payload: Result<Json<MassDestroyRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.persons.mass_destroy(&request.indices).await?;
    Ok(ApiResponse::message("Selected persons deleted successfully."))
}
