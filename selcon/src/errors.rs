use crate::api::models::users::Role;
use crate::db::errors::DbError;
use crate::types::Operation;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller has the wrong role, or does not own the resource
    #[error("Insufficient permissions to {action:?} {resource}")]
    InsufficientPermissions {
        required: Option<Role>,
        action: Operation,
        resource: String,
    },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Duplicate username, email or enrollment
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Enrollment refused because the course has no free seats
    #[error("Course {course_id} is full")]
    CourseFull { course_id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body returned for every error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::CourseFull { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "未登录".to_string()),
            Error::InsufficientPermissions { required, action, resource } => match required {
                Some(role) => format!("权限不足：仅{}可以{action}{resource}", role.label()),
                None => format!("权限不足：无权{action}{resource}"),
            },
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource}不存在"),
            Error::Conflict { message } => message.clone(),
            Error::CourseFull { .. } => "课程已满".to_string(),
            Error::Internal { .. } => "服务器内部错误".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "资源不存在".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => unique_violation_message(table.as_deref(), constraint.as_deref()),
                DbError::ForeignKeyViolation { .. } => "关联的资源不存在".to_string(),
                DbError::CheckViolation { .. } => "提供的数据无效".to_string(),
                DbError::CapacityExceeded { .. } => "课程已满".to_string(),
                DbError::Other(_) => "数据库错误".to_string(),
            },
            Error::Other(_) => "服务器内部错误".to_string(),
        }
    }
}

/// User-friendly messages for the unique constraints in the schema
fn unique_violation_message(table: Option<&str>, constraint: Option<&str>) -> String {
    match (table, constraint) {
        (Some("users"), Some(c)) if c.contains("username") => "用户名已存在".to_string(),
        (Some("users"), Some(c)) if c.contains("email") => "邮箱已存在".to_string(),
        (Some("enrollments"), _) => "已经选过这门课程".to_string(),
        _ => "资源已存在".to_string(),
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } | Error::CourseFull { .. } => {
                tracing::warn!("Constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

const INVALID_REQUEST: &str = "请求参数无效";

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
        Error::BadRequest {
            message: INVALID_REQUEST.to_string(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected path parameters: {}", rejection.body_text());
        Error::BadRequest {
            message: INVALID_REQUEST.to_string(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (
                Error::InsufficientPermissions {
                    required: Some(Role::Teacher),
                    action: Operation::Access,
                    resource: "course".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::BadRequest {
                    message: "bad".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::NotFound {
                    resource: "课程".to_string(),
                    id: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::Conflict {
                    message: "dup".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::CourseFull {
                    course_id: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Internal {
                    operation: "x".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::Database(DbError::NotFound), StatusCode::NOT_FOUND),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "wrong status for {error:?}");
        }
    }

    #[test]
    fn test_unique_violation_messages() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("username".to_string()),
            table: Some("users".to_string()),
            message: "UNIQUE constraint failed: users.username".to_string(),
        });
        assert_eq!(err.user_message(), "用户名已存在");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("email".to_string()),
            table: Some("users".to_string()),
            message: String::new(),
        });
        assert_eq!(err.user_message(), "邮箱已存在");
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = Error::Internal {
            operation: "connect to /var/lib/secret.db".to_string(),
        };
        assert!(!err.user_message().contains("secret"));

        let err = Error::Other(anyhow::anyhow!("password hash for admin was abc"));
        assert_eq!(err.user_message(), "服务器内部错误");
    }

    #[test]
    fn test_course_full_message() {
        let err = Error::CourseFull {
            course_id: "c".to_string(),
        };
        assert_eq!(err.user_message(), "课程已满");
    }
}
