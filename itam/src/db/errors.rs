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
                let message = db_err.message().to_string();
                // SQLite reports neither table nor constraint; both live in the message text,
                // e.g. "UNIQUE constraint failed: users.username".
                let (table, constraint) = match (db_err.table(), db_err.constraint()) {
                    (None, None) => parse_constraint_target(&message),
                    (table, constraint) => (table.map(str::to_string), constraint.map(str::to_string)),
                };

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint,
                        table,
                        message,
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

/// Split a SQLite constraint message into `(table, constraint)`.
///
/// `"UNIQUE constraint failed: users.username"` yields `(Some("users"), Some("users.username"))`.
/// Messages without a `table.column` target (foreign key failures) yield `(None, None)`.
fn parse_constraint_target(message: &str) -> (Option<String>, Option<String>) {
    let Some((_, target)) = message.split_once("failed: ") else {
        return (None, None);
    };
    // Composite keys are reported as "t.a, t.b"; the table is the same for every column.
    let target = target.trim();
    let table = target.split('.').next().filter(|t| !t.is_empty()).map(str::to_string);
    (table, Some(target.to_string()))
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unique_target() {
        let (table, constraint) = parse_constraint_target("UNIQUE constraint failed: users.username");
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(constraint.as_deref(), Some("users.username"));
    }

    #[test]
    fn test_parse_composite_target() {
        let (table, constraint) = parse_constraint_target("UNIQUE constraint failed: devices.name, devices.os");
        assert_eq!(table.as_deref(), Some("devices"));
        assert_eq!(constraint.as_deref(), Some("devices.name, devices.os"));
    }

    #[test]
    fn test_parse_without_target() {
        assert_eq!(parse_constraint_target("FOREIGN KEY constraint failed"), (None, None));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }
}
