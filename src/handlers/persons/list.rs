use axum::{
    extract::{OriginalUri, RawQuery, State},
    Extension, Json,
};

use crate::api::{Paginated, PersonResource};
use crate::authorization::Caller;
use crate::error::ApiError;
use crate::services::ListParams;
use crate::state::AppState;

/// GET /api/contacts/persons - paginated list, restricted to visible owners
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Result<Json<Paginated<PersonResource>>, ApiError> {
    let (params, link_query) = ListParams::from_query(query.as_deref().unwrap_or(""));
    let page = state.persons.list(&caller, &params).await?;
    Ok(Json(Paginated::from_page(page, uri.path(), &link_query)))
}
