use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::api::PersonResource;
use crate::authorization::Caller;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::PersonPayload;
use crate::state::AppState;

/// POST /api/contacts/persons
pub async fn store(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<PersonPayload>, JsonRejection>,
) -> ApiResult<PersonResource> {
    let Json(payload) = payload?;
    let person = state.persons.create(&caller, payload).await?;
    Ok(ApiResponse::created(person.into()).with_message("Person created successfully."))
}
