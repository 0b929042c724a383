use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::RoleId;

/// A persisted role row.
///
/// Roles are stored by name so the set can grow without a schema change.
/// Permissions are looked up by [`Role::name`]; a user holds exactly one role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    /// The built-in tier this role corresponds to, if any.
    pub fn builtin(&self) -> Option<BuiltinRole> {
        self.name.parse().ok()
    }
}

/// The permission tiers shipped with the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuiltinRole {
    /// Full access to the catalog, users, and moderation.
    Administrator,
    /// Edits book data and moderates reviews.
    Moderator,
    /// Posts reviews and keeps personal collections.
    Reader,
}

impl BuiltinRole {
    /// Every built-in tier, highest privilege first.
    pub const ALL: [BuiltinRole; 3] = [Self::Administrator, Self::Moderator, Self::Reader];

    /// Name stored in the `roles` table.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Moderator => "Moderator",
            Self::Reader => "Reader",
        }
    }

    /// Human-readable description stored alongside the name.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Administrator => "Superuser with full access to the system",
            Self::Moderator => "May edit book data and moderate reviews",
            Self::Reader => "May post reviews and keep personal collections",
        }
    }
}

impl fmt::Display for BuiltinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinRole {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| TypeError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for role in BuiltinRole::ALL {
            assert_eq!(role.name().parse::<BuiltinRole>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "Librarian".parse::<BuiltinRole>(),
            Err(TypeError::UnknownRole("Librarian".into()))
        );
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("reader".parse::<BuiltinRole>().is_err());
    }

    #[test]
    fn role_row_maps_to_builtin() {
        let row = Role {
            id: RoleId::new(1),
            name: "Moderator".into(),
            description: None,
        };
        assert_eq!(row.builtin(), Some(BuiltinRole::Moderator));
    }
}
