use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// A conditional insert was refused because the parent entity is at capacity.
    /// NOTE: this is a storage-level rule (row counts), not an authorization decision.
    #[error("{entity_type} {entity_id} is at capacity ({capacity})")]
    CapacityExceeded {
        entity_type: String,
        entity_id: String,
        capacity: i64,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                // SQLite reports neither table nor constraint name, only "<KIND> constraint failed: table.col, ..."
                let (table, constraint) = match db_err.table() {
                    Some(table) => (Some(table.to_string()), db_err.constraint().map(|s| s.to_string())),
                    None => split_constraint_target(db_err.message()),
                };

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint,
                        table,
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract `(table, columns)` from an SQLite constraint message.
///
/// "UNIQUE constraint failed: users.email" -> (Some("users"), Some("email"))
/// "UNIQUE constraint failed: enrollments.student_id, enrollments.course_id"
///     -> (Some("enrollments"), Some("student_id,course_id"))
fn split_constraint_target(message: &str) -> (Option<String>, Option<String>) {
    let Some((_, target)) = message.split_once("constraint failed:") else {
        return (None, None);
    };

    let mut table = None;
    let mut columns = Vec::new();
    for part in target.split(',') {
        match part.trim().split_once('.') {
            Some((t, c)) => {
                table.get_or_insert_with(|| t.to_string());
                columns.push(c.to_string());
            }
            // CHECK failures name the constraint (or the expression), not a column
            None if !part.trim().is_empty() => columns.push(part.trim().to_string()),
            None => {}
        }
    }

    let constraint = if columns.is_empty() { None } else { Some(columns.join(",")) };
    (table, constraint)
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
