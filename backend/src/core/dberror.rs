use thiserror::Error;

pub type DbContext = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionFailed(sqlx::Error),

    #[error("Database operation failed: {0}")]
    OperationFailed(sqlx::Error),

    #[error("Row not found: {0}")]
    RowNotFound(sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(sqlx::Error),

    #[error("Stored value could not be decoded: {0}")]
    InvalidStoredValue(String),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        let unique = matches!(&error, sqlx::Error::Database(e) if e.is_unique_violation());
        match error {
            sqlx::Error::RowNotFound => Self::RowNotFound(error),
            _ if unique => Self::UniqueViolation(error),
            _ => Self::OperationFailed(error),
        }
    }
}

impl DbError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RowNotFound(_))
    }
}
