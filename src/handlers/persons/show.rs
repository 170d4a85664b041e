use axum::extract::{Path, State};

use crate::api::PersonResource;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/contacts/persons/:id
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PersonResource> {
    let person = state.persons.show(id).await?;
    Ok(ApiResponse::success(person.into()))
}
