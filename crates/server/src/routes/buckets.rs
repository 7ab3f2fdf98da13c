use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};

use common::{
    observability,
    types::{SuccessResponse, ValueResponse},
};
use service::buckets::domain::{KeyRequest, PutRequest};

use super::{outcome, AppState};
use crate::errors::ApiError;

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|e| {
        tracing::warn!(error = %e, "request body unreadable");
        ApiError::unreadable_body()
    })
}

fn record<T>(operation: &str, result: &Result<T, ApiError>) {
    let status = result.as_ref().map(|_| StatusCode::OK).unwrap_or_else(|e| e.status);
    observability::record_operation(operation, outcome(status));
}

/// `POST /update`: `{key, bucket, value, token}` → `{success: true}`.
pub async fn update(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = async {
        let req = PutRequest::parse(&read_body(body)?)?;
        state.buckets.put(req).await?;
        Ok::<_, ApiError>(())
    }
    .await;
    record("update", &result);
    result.map(|_| Json(SuccessResponse { success: true }))
}

/// `POST /retrieve`: `{key, bucket, token}` → `{value}`.
pub async fn retrieve(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ValueResponse>, ApiError> {
    let result = async {
        let req = KeyRequest::parse(&read_body(body)?)?;
        Ok::<_, ApiError>(state.buckets.get(req).await?)
    }
    .await;
    record("retrieve", &result);
    result.map(|value| Json(ValueResponse { value }))
}

/// `POST /remove`: `{key, bucket, token}` → `{success: true}`.
pub async fn remove(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let result = async {
        let req = KeyRequest::parse(&read_body(body)?)?;
        state.buckets.delete(req).await?;
        Ok::<_, ApiError>(())
    }
    .await;
    record("remove", &result);
    result.map(|_| Json(SuccessResponse { success: true }))
}
