use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};

use common::{observability, types::TokenResponse};

use super::{outcome, AppState};
use crate::errors::ApiError;

/// `POST /authenticate`: exchange `{username, password}` for the client's token.
pub async fn authenticate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let result = match body {
        Ok(body) => state.auth.issue_token(body.to_vec()).await.map_err(ApiError::from),
        Err(_) => Err(ApiError::unreadable_body()),
    };
    let status = result.as_ref().map(|_| StatusCode::OK).unwrap_or_else(|e| e.status);
    observability::record_operation("authenticate", outcome(status));
    Ok(Json(TokenResponse { token: result? }))
}
