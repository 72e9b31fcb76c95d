use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Inactive: {0}")]
    Inactive(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Quota not set: {0}")]
    NotQuotaSet(String),

    #[error("Schedule overlaps with {} existing schedule(s)", .conflicting.len())]
    Overlap { conflicting: Vec<Uuid> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Authentication(_) => "authentication_error",
            AppError::Authorization(_) => "authorization_error",
            AppError::NotFound(_) => "not_found",
            AppError::Inactive(_) => "inactive",
            AppError::Conflict(_) => "conflict",
            AppError::QuotaExhausted(_) => "quota_exhausted",
            AppError::NotQuotaSet(_) => "quota_not_set",
            AppError::Overlap { .. } => "schedule_overlap",
            _ => "internal_server_error",
        }
    }

    /// Map a Postgres unique violation to `Conflict`, passing anything else through.
    pub fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        Self::conflict_on_sqlstate(err, "23505", message)
    }

    /// Map a Postgres foreign key violation (a row still referenced elsewhere)
    /// to `Conflict`, passing anything else through.
    pub fn from_foreign_key_violation(err: sqlx::Error, message: &str) -> Self {
        Self::conflict_on_sqlstate(err, "23503", message)
    }

    fn conflict_on_sqlstate(err: sqlx::Error, sqlstate: &str, message: &str) -> Self {
        let matches = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == sqlstate)
            .unwrap_or(false);

        if matches {
            AppError::Conflict(message.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NotQuotaSet(_) => StatusCode::NOT_FOUND,
            AppError::Inactive(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) | AppError::QuotaExhausted(_) | AppError::Overlap { .. } => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Validation(msg)
            | AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Inactive(msg)
            | AppError::Conflict(msg)
            | AppError::QuotaExhausted(msg)
            | AppError::NotQuotaSet(msg) => msg.clone(),
            AppError::Overlap { .. } => self.to_string(),
            _ => {
                tracing::error!("Request failed: {}", self);
                "An internal server error occurred".to_string()
            }
        };

        let conflicting = match self {
            AppError::Overlap { conflicting } => Some(conflicting.clone()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            status: false,
            error: self.code().to_string(),
            message,
            conflicting_schedule_ids: conflicting,
        })
    }
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    status: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicting_schedule_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Inactive("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::QuotaExhausted("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Overlap { conflicting: vec![Uuid::new_v4()] }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn overlap_message_counts_conflicts() {
        let err = AppError::Overlap { conflicting: vec![Uuid::new_v4(), Uuid::new_v4()] };
        assert_eq!(err.to_string(), "Schedule overlaps with 2 existing schedule(s)");
    }
}
