use axum::{
    extract::{OriginalUri, RawQuery, State},
    Extension, Json,
};

use crate::api::{Paginated, PersonResource};
use crate::authorization::Caller;
use crate::error::ApiError;
use crate::services::SearchParams;
use crate::state::AppState;

/// GET /api/contacts/persons/search - typed search
///
/// `search` tokens are `field:value` (`name`, `job_title`, `email`,
/// `emails.value`) or a bare value matched against name and email. Tokens
/// combine with AND; unknown fields are ignored.
pub async fn search(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Result<Json<Paginated<PersonResource>>, ApiError> {
    let (params, link_query) = SearchParams::from_query(query.as_deref().unwrap_or(""));
    let page = state.persons.search(&caller, &params).await?;
    Ok(Json(Paginated::from_page(page, uri.path(), &link_query)))
}
