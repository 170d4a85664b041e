use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::api::PersonResource;
use crate::authorization::Caller;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::PersonPayload;
use crate::state::AppState;

/// PUT|PATCH /api/contacts/persons/:id - full replacement of the person's fields
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> ApiResult<PersonResource> {
    let Json(payload) = payload?;
    let person = state.persons.update(&caller, id, payload).await?;
    Ok(ApiResponse::success(person.into()).with_message("Person updated successfully."))
}
