use std::fmt;

use serde::{Deserialize, Serialize};

/// Every role-gated operation in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    CreateBook,
    EditBook,
    DeleteBook,
    CreateReview,
    DeleteReview,
    ViewModerationQueue,
    CreateCollection,
    /// Add or remove books in a collection the caller owns.
    ManageCollection,
    /// Read collections owned by someone else.
    ViewAnyCollection,
    ManageGenres,
    ManageUsers,
    /// Catalog maintenance such as sweeping orphaned cover artifacts.
    ManageCatalog,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Self::CreateBook,
        Self::EditBook,
        Self::DeleteBook,
        Self::CreateReview,
        Self::DeleteReview,
        Self::ViewModerationQueue,
        Self::CreateCollection,
        Self::ManageCollection,
        Self::ViewAnyCollection,
        Self::ManageGenres,
        Self::ManageUsers,
        Self::ManageCatalog,
    ];

    /// Short verb phrase used in denial messages.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CreateBook => "create books",
            Self::EditBook => "edit books",
            Self::DeleteBook => "delete books",
            Self::CreateReview => "write reviews",
            Self::DeleteReview => "delete reviews",
            Self::ViewModerationQueue => "view the moderation queue",
            Self::CreateCollection => "create collections",
            Self::ManageCollection => "change collections",
            Self::ViewAnyCollection => "view other users' collections",
            Self::ManageGenres => "manage genres",
            Self::ManageUsers => "manage users",
            Self::ManageCatalog => "maintain the catalog",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
