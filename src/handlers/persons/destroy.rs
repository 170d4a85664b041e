use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::DeleteOutcome;
use crate::state::AppState;

const DELETED: &str = "Person deleted successfully.";
const NOT_DELETED: &str = "Person could not be deleted.";

/// DELETE /api/contacts/persons/:id
///
/// Unknown ids are 404. A failure after the lookup is a 500 carrying a plain
/// message body.
pub async fn destroy(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    match state.persons.destroy(id).await? {
        DeleteOutcome::Deleted => Ok(ApiResponse::message(DELETED)),
        DeleteOutcome::Failed => {
            let message = if state.config.persons.legacy_delete_failure_message {
                DELETED
            } else {
                NOT_DELETED
            };
            Ok(ApiResponse::message(message).with_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
