use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Relation does not exist: {0}")]
    UndefinedTable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Classify a raw sqlx error, pulling out the SQLSTATE codes callers care about.
    pub fn classify(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = error {
            match db_err.code().as_deref() {
                Some("42P01") => return Self::UndefinedTable(db_err.message().to_string()),
                Some("23505") | Some("23514") => {
                    return Self::ConstraintViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        Self::Database(error)
    }

    pub fn is_undefined_table(&self) -> bool {
        matches!(self, StorageError::UndefinedTable(_))
    }
}

/// Failures of fixture generation.
///
/// `NotEnoughParticipants`, `TooManyParticipants` and `SchemaNotReady` are
/// generation errors the operator can act on. `AlreadyExists` is a no-op
/// signal rather than a failure. Everything else comes from storage, after
/// rollback.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("At least 2 participants are required to generate a fixture ({found} provided)")]
    NotEnoughParticipants { found: usize },

    #[error("{found} participants produce more matchdays than a fixture can store")]
    TooManyParticipants { found: usize },

    #[error(
        "Fixture tables are not available yet. Run the pending database migrations and try again"
    )]
    SchemaNotReady,

    #[error("The fixture for this tournament has already been generated")]
    AlreadyExists,

    #[error(transparent)]
    Storage(StorageError),
}

impl FixtureError {
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            FixtureError::NotEnoughParticipants { .. }
                | FixtureError::TooManyParticipants { .. }
                | FixtureError::SchemaNotReady
        )
    }
}

impl From<StorageError> for FixtureError {
    fn from(error: StorageError) -> Self {
        if error.is_undefined_table() {
            FixtureError::SchemaNotReady
        } else {
            FixtureError::Storage(error)
        }
    }
}
