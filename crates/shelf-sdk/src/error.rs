use shelf_db::{ConstraintKind, DbError};
use shelf_policy::PolicyError;
use shelf_store::StoreError;
use thiserror::Error;

/// Every failure a catalog operation can report.
///
/// Policy and validation failures are raised before any state changes.
/// Everything raised inside a transaction rolls that transaction back.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("authentication required to {0}")]
    Unauthenticated(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// The write collides with existing data. The message is user-facing.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested association is already in place. The message is user-facing.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LibraryError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Short message suitable for showing to the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, reason } => format!("Please check {field}: {reason}."),
            Self::Forbidden(_) => "You do not have permission to perform this action.".into(),
            Self::Unauthenticated(_) => "You must sign in to perform this action.".into(),
            Self::NotFound { entity, .. } => format!("The requested {entity} does not exist."),
            Self::Conflict(message) | Self::AlreadyExists(message) => message.clone(),
            Self::UnsupportedMediaType(_) => {
                "Only jpg, jpeg, png and gif images can be uploaded.".into()
            }
            Self::Storage(_) | Self::Config(_) => {
                "The change could not be saved. Please try again.".into()
            }
        }
    }
}

impl From<DbError> for LibraryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Constraint { kind, message } => {
                tracing::debug!(?kind, %message, "constraint violation");
                match kind {
                    ConstraintKind::Unique => {
                        Self::Conflict("This change conflicts with existing data.".into())
                    }
                    ConstraintKind::ForeignKey => Self::not_found("record", message),
                    _ => Self::Conflict("The change is not allowed by the catalog rules.".into()),
                }
            }
            DbError::NotFound { entity, id } => Self::not_found(entity, id),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<StoreError> for LibraryError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<PolicyError> for LibraryError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthenticated(action) => Self::Unauthenticated(action.to_string()),
            forbidden @ PolicyError::Forbidden { .. } => Self::Forbidden(forbidden.to_string()),
        }
    }
}

impl From<shelf_crypto::PasswordError> for LibraryError {
    fn from(err: shelf_crypto::PasswordError) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_policy::Action;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: LibraryError = DbError::Constraint {
            kind: ConstraintKind::Unique,
            message: "UNIQUE constraint failed: genres.name".into(),
        }
        .into();
        assert!(matches!(err, LibraryError::Conflict(_)));
        assert!(!err.user_message().contains("genres.name"));
    }

    #[test]
    fn dangling_reference_becomes_not_found() {
        let err: LibraryError = DbError::Constraint {
            kind: ConstraintKind::ForeignKey,
            message: "FOREIGN KEY constraint failed".into(),
        }
        .into();
        assert!(matches!(err, LibraryError::NotFound { entity: "record", .. }));
        assert_eq!(err.user_message(), "The requested record does not exist.");
    }

    #[test]
    fn policy_errors_keep_their_kind() {
        let anon: LibraryError = PolicyError::Unauthenticated(Action::CreateReview).into();
        assert!(matches!(anon, LibraryError::Unauthenticated(_)));
        assert_eq!(anon.to_string(), "authentication required to write reviews");

        let denied: LibraryError = PolicyError::Forbidden {
            role: "Reader".into(),
            action: Action::DeleteBook,
        }
        .into();
        assert!(matches!(denied, LibraryError::Forbidden(_)));
    }

    #[test]
    fn db_not_found_maps_to_not_found() {
        let err: LibraryError = DbError::NotFound {
            entity: "book",
            id: 9,
        }
        .into();
        assert_eq!(err.to_string(), "book 9 not found");
        assert_eq!(err.user_message(), "The requested book does not exist.");
    }

    #[test]
    fn every_variant_has_a_user_message() {
        let all = [
            LibraryError::validation("title", "must not be empty"),
            LibraryError::Forbidden("x".into()),
            LibraryError::Unauthenticated("x".into()),
            LibraryError::not_found("review", 1),
            LibraryError::Conflict("You have already reviewed this book.".into()),
            LibraryError::AlreadyExists("The book is already in this collection.".into()),
            LibraryError::UnsupportedMediaType("bmp".into()),
            LibraryError::Storage("disk full".into()),
            LibraryError::Config("bad toml".into()),
        ];
        for err in all {
            assert!(!err.user_message().is_empty());
        }
    }
}
