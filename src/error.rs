// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Business-rule failures are caught at the handler boundary and rendered as
/// a structured JSON body; internal detail (SQL errors, integrity breaches)
/// is logged and never serialized into the response.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request - duplicate id / already enrolled / class full
    Conflict(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error - counter/ledger divergence and the like.
    // The detail stays server-side; clients get a generic message.
    IntegrityViolation(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::IntegrityViolation(_) => 500,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::IntegrityViolation(_) => "An internal error occurred",
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::IntegrityViolation(_) => "INTERNAL_SERVER_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Record an invariant breach. Logged here so every construction site
    /// leaves a trace; the client still only sees a generic 500.
    pub fn integrity_violation(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!("integrity violation: {}", detail);
        ApiError::IntegrityViolation(detail)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            // Pre-insert existence checks can lose a race; the constraint is
            // the last word and still reports as a conflict, not a 500.
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                ApiError::conflict("Record already exists")
            }
            sqlx::Error::Database(db)
                if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
            {
                ApiError::conflict("Record is referenced by another record")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::error!("database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("database error: {}", other);
                ApiError::internal_server_error("An internal error occurred")
            }
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;
        match err {
            AuthError::Expired | AuthError::Invalid => {
                ApiError::unauthorized("Invalid or expired token")
            }
            AuthError::MissingSecret | AuthError::TokenGeneration(_) => {
                tracing::error!("token issue failed: {}", err);
                ApiError::internal_server_error("An internal error occurred")
            }
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!("password hashing error: {}", err);
        ApiError::internal_server_error("An internal error occurred")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), 400);
        // Duplicate/already-enrolled conflicts are 400, not 409.
        assert_eq!(ApiError::conflict("x").status_code(), 400);
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::IntegrityViolation("x".into()).status_code(), 500);
        assert_eq!(ApiError::service_unavailable("x").status_code(), 503);
    }

    #[test]
    fn integrity_violations_hide_detail() {
        let err = ApiError::IntegrityViolation("signed_people went negative".into());
        assert_eq!(err.message(), "An internal error occurred");
        let body = err.to_json();
        assert_eq!(body["error"], true);
        assert!(!body["message"]
            .as_str()
            .unwrap()
            .contains("signed_people"));
    }

    // Stand-in for a driver error carrying a Postgres SQLSTATE.
    #[derive(Debug)]
    struct StubDbError(&'static str);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "constraint violation ({})", self.0)
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.0 {
                "23505" => sqlx::error::ErrorKind::UniqueViolation,
                "23503" => sqlx::error::ErrorKind::ForeignKeyViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err: ApiError = sqlx::Error::Database(Box::new(StubDbError("23505"))).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn foreign_key_violation_maps_to_conflict() {
        let err: ApiError = sqlx::Error::Database(Box::new(StubDbError("23503"))).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err: ApiError = sqlx::Error::Database(Box::new(StubDbError("40001"))).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "An internal error occurred");
    }

    #[test]
    fn token_failures_collapse_to_one_message() {
        let expired: ApiError = crate::auth::AuthError::Expired.into();
        let invalid: ApiError = crate::auth::AuthError::Invalid.into();
        assert_eq!(expired.message(), invalid.message());
        assert_eq!(expired.status_code(), 401);
    }
}
