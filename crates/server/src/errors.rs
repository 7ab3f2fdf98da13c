use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::auth::errors::AuthError;
use service::buckets::errors::BucketError;
use tracing::{error, warn};

const INTERNAL: &str = "Unable to provide response!";

/// Client-facing error: a status code and a fixed `{"error": ...}` message.
///
/// Internal details never reach the body; they are logged when the error is
/// built from a service error.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    pub fn unreadable_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Unable to read request body!")
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<BucketError> for ApiError {
    fn from(e: BucketError) -> Self {
        let api = match &e {
            BucketError::InvalidBody(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid request body!"),
            BucketError::ReservedBucket(_) => Self::new(StatusCode::BAD_REQUEST, "Bucket is reserved!"),
            BucketError::BucketUnavailable(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Unable to create or open requested bucket!")
            }
            BucketError::BucketMissing(_) => Self::new(StatusCode::BAD_REQUEST, "Bucket doesn't exist!"),
            BucketError::InvalidToken => Self::new(StatusCode::UNAUTHORIZED, "Invalid request token!"),
            BucketError::KeyMissing(_) => Self::new(StatusCode::BAD_REQUEST, "Error retrieving requested key!"),
            BucketError::DeleteFailed(_) => Self::new(StatusCode::BAD_REQUEST, "Error deleting requested key!"),
            BucketError::Store(_) | BucketError::Task(_) => Self::internal(),
        };
        if api.status.is_server_error() {
            error!(code = e.code(), error = %e, "bucket operation failed");
        } else {
            warn!(code = e.code(), error = %e, status = api.status.as_u16(), "bucket request rejected");
        }
        api
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let api = match &e {
            AuthError::InvalidBody(_) => Self::new(StatusCode::BAD_REQUEST, "Invalid request body!"),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, "Unable to authenticate!"),
            _ => Self::internal(),
        };
        if api.status.is_server_error() {
            error!(code = e.code(), error = %e, "token issue failed");
        } else {
            warn!(code = e.code(), error = %e, status = api.status.as_u16(), "authenticate rejected");
        }
        api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_errors_map_to_fixed_messages() {
        let cases = [
            (BucketError::InvalidBody("x".into()), StatusCode::BAD_REQUEST, "Invalid request body!"),
            (BucketError::BucketMissing("b".into()), StatusCode::BAD_REQUEST, "Bucket doesn't exist!"),
            (BucketError::InvalidToken, StatusCode::UNAUTHORIZED, "Invalid request token!"),
            (BucketError::KeyMissing("k".into()), StatusCode::BAD_REQUEST, "Error retrieving requested key!"),
            (BucketError::DeleteFailed("io".into()), StatusCode::BAD_REQUEST, "Error deleting requested key!"),
        ];
        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn auth_errors_hide_internal_details() {
        let api = ApiError::from(AuthError::CredentialsFile("secret path".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Unable to provide response!");
        assert_eq!(ApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
    }
}
