use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::decode_jwt;
use crate::authorization::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the bearer token into a `Caller` extension; no token, no route.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let caller: Caller = decode_jwt(token, &state.config.security.jwt_secret)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::unauthorized(e.to_string())
        })?
        .caller();
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some("") => Err("Empty bearer token"),
        Some(token) => Ok(token),
        None => Err("Authorization header must use the Bearer scheme"),
    }
}
