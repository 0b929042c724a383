use rusqlite::ffi;
use rusqlite::ErrorCode;

/// Which relational constraint rejected a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
    NotNull,
    Other,
}

impl ConstraintKind {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Unique,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => Self::Check,
            ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
            _ => Self::Other,
        }
    }
}

/// Errors produced by the relational store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A uniqueness, foreign-key or check constraint rejected the write.
    #[error("constraint violated ({kind:?}): {message}")]
    Constraint { kind: ConstraintKind, message: String },

    /// An update or delete addressed a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("migration {id} failed: {source}")]
    Migration {
        id: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Whether this is a violated UNIQUE or PRIMARY KEY constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        )
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, message) if e.code == ErrorCode::ConstraintViolation => {
                Self::Constraint {
                    kind: ConstraintKind::from_extended_code(e.extended_code),
                    message: message.unwrap_or_else(|| e.to_string()),
                }
            }
            other => Self::Sqlite(other),
        }
    }
}

/// Result alias for relational store operations.
pub type DbResult<T> = Result<T, DbError>;
