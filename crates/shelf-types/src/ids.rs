use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw key as assigned by the store.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw key.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }
    };
}

surrogate_id!(
    /// Identifier of a [`Role`](crate::Role) row.
    RoleId,
    "role"
);
surrogate_id!(
    /// Identifier of a [`User`](crate::User).
    UserId,
    "user"
);
surrogate_id!(
    /// Identifier of a [`Genre`](crate::Genre).
    GenreId,
    "genre"
);
surrogate_id!(
    /// Identifier of a [`Book`](crate::Book).
    BookId,
    "book"
);
surrogate_id!(
    /// Identifier of a [`Cover`](crate::Cover).
    CoverId,
    "cover"
);
surrogate_id!(
    /// Identifier of a [`Review`](crate::Review).
    ReviewId,
    "review"
);
surrogate_id!(
    /// Identifier of a [`Collection`](crate::Collection).
    CollectionId,
    "collection"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_entity() {
        assert_eq!(BookId::new(7).to_string(), "book 7");
        assert_eq!(CollectionId::new(3).to_string(), "collection 3");
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&ReviewId::new(42)).unwrap();
        assert_eq!(json, "42");
        let parsed: ReviewId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.get(), 42);
    }

    #[test]
    fn ordering_follows_raw_key() {
        assert!(UserId::new(1) < UserId::new(2));
    }
}
