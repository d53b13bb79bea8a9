// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 403 Forbidden - monthly quota exhausted; always carries the values the
    // client needs to render the upgrade prompt
    QuotaExceeded {
        current: i64,
        limit: i64,
        plan_name: String,
    },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::QuotaExceeded { .. } => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::QuotaExceeded { current, limit, plan_name } => format!(
                "You've analyzed {} of {} files this month on the {} plan. Please upgrade to continue.",
                current, limit, plan_name
            ),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::QuotaExceeded { current, limit, plan_name } => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code(),
                    "current": current,
                    "limit": limit,
                    "plan_name": plan_name,
                })
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code(),
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn quota_exceeded(status: &crate::usage::UsageStatus) -> Self {
        ApiError::QuotaExceeded {
            current: status.current,
            limit: status.limit,
            plan_name: status.plan_name.clone(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert subsystem error types to ApiError
impl From<crate::database::DatabaseError> for ApiError {
    fn from(err: crate::database::DatabaseError) -> Self {
        match err {
            crate::database::DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::DatabaseError::ConfigMissing(name) => {
                tracing::error!("Missing configuration: {}", name);
                ApiError::service_unavailable("Database is not configured")
            }
            crate::database::DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<crate::usage::MeterError> for ApiError {
    fn from(err: crate::usage::MeterError) -> Self {
        // Meter unavailability is a deny, never an implicit allow
        tracing::error!("Usage meter error: {}", err);
        ApiError::service_unavailable("Usage metering temporarily unavailable")
    }
}

impl From<crate::usage::StoreError> for ApiError {
    fn from(err: crate::usage::StoreError) -> Self {
        tracing::error!("Usage store error: {}", err);
        ApiError::service_unavailable("Usage metering temporarily unavailable")
    }
}

impl From<crate::services::ServiceError> for ApiError {
    fn from(err: crate::services::ServiceError) -> Self {
        use crate::services::ServiceError;
        match err {
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::InvalidInput(msg) => ApiError::bad_request(msg),
            ServiceError::TeamFull { limit } => ApiError::conflict(format!(
                "Team is full: the owner's plan allows up to {} members",
                limit
            )),
            ServiceError::Database(sqlx_err) => {
                tracing::error!("Service database error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            ServiceError::Pool(db_err) => ApiError::from(db_err),
        }
    }
}

impl From<crate::analyzer::AnalyzerError> for ApiError {
    fn from(err: crate::analyzer::AnalyzerError) -> Self {
        use crate::analyzer::AnalyzerError;
        match &err {
            AnalyzerError::MissingApiKey => {
                tracing::error!("Analyzer invoked without an API key configured");
                ApiError::service_unavailable("Document analysis is not configured")
            }
            _ => {
                tracing::error!("Analyzer error: {}", err);
                ApiError::bad_gateway("Failed to analyze document")
            }
        }
    }
}

impl From<crate::extract::ExtractError> for ApiError {
    fn from(err: crate::extract::ExtractError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        use crate::auth::AuthError;
        match err {
            AuthError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
            AuthError::InvalidSecret => {
                tracing::error!("JWT secret is not configured");
                ApiError::service_unavailable("Authentication is not configured")
            }
            AuthError::TokenGeneration(msg) | AuthError::PasswordHash(msg) => {
                tracing::error!("Auth error: {}", msg);
                ApiError::internal_server_error("Authentication error")
            }
        }
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
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exceeded_carries_display_values() {
        let err = ApiError::QuotaExceeded {
            current: 50,
            limit: 50,
            plan_name: "Free".to_string(),
        };
        assert_eq!(err.status_code(), 403);

        let body = err.to_json();
        assert_eq!(body["current"], 50);
        assert_eq!(body["limit"], 50);
        assert_eq!(body["plan_name"], "Free");
        assert_eq!(body["code"], "QUOTA_EXCEEDED");
    }

    #[test]
    fn store_errors_map_to_service_unavailable() {
        let err: ApiError = crate::usage::StoreError::Unavailable("down".to_string()).into();
        assert_eq!(err.status_code(), 503);
    }
}
