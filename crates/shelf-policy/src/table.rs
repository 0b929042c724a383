use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use shelf_types::BuiltinRole;

use crate::action::Action;
use crate::error::PolicyError;
use crate::identity::Principal;

// ---------------------------------------------------------------------------
// Standard grants
// ---------------------------------------------------------------------------

/// Grants shipped with the catalog. Collections are a reader feature; staff
/// roles have no collection grants.
const STANDARD_GRANTS: &[(BuiltinRole, &[Action])] = &[
    (
        BuiltinRole::Administrator,
        &[
            Action::CreateBook,
            Action::EditBook,
            Action::DeleteBook,
            Action::CreateReview,
            Action::DeleteReview,
            Action::ViewModerationQueue,
            Action::ViewAnyCollection,
            Action::ManageGenres,
            Action::ManageUsers,
            Action::ManageCatalog,
        ],
    ),
    (
        BuiltinRole::Moderator,
        &[
            Action::EditBook,
            Action::CreateReview,
            Action::DeleteReview,
            Action::ViewModerationQueue,
        ],
    ),
    (
        BuiltinRole::Reader,
        &[
            Action::CreateReview,
            Action::CreateCollection,
            Action::ManageCollection,
        ],
    ),
];

// ---------------------------------------------------------------------------
// PolicyTable
// ---------------------------------------------------------------------------

/// Role name → granted actions.
///
/// This is the single place permission decisions are made. A role that has
/// no row is denied everything, so new role names are safe until granted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    grants: BTreeMap<String, BTreeSet<Action>>,
}

impl PolicyTable {
    /// A table with no grants at all.
    pub fn empty() -> Self {
        Self {
            grants: BTreeMap::new(),
        }
    }

    /// The standard Administrator / Moderator / Reader table.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for (role, actions) in STANDARD_GRANTS {
            for action in *actions {
                table.grant(role.name(), *action);
            }
        }
        table
    }

    /// Grant an action to a role, creating the role row if needed.
    pub fn grant(&mut self, role: impl Into<String>, action: Action) -> &mut Self {
        self.grants.entry(role.into()).or_default().insert(action);
        self
    }

    /// Whether `role` may perform `action`.
    pub fn allows(&self, role: &str, action: Action) -> bool {
        self.grants
            .get(role)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Actions granted to `role`, in declaration order.
    pub fn actions_for(&self, role: &str) -> Vec<Action> {
        self.grants
            .get(role)
            .map(|actions| actions.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Gate a request: returns the principal when the action is allowed.
    pub fn authorize<'a>(
        &self,
        identity: Option<&'a Principal>,
        action: Action,
    ) -> Result<&'a Principal, PolicyError> {
        let Some(principal) = identity else {
            tracing::debug!(%action, "anonymous request denied");
            return Err(PolicyError::Unauthenticated(action));
        };
        if self.allows(&principal.role, action) {
            Ok(principal)
        } else {
            tracing::debug!(
                user = principal.user_id.get(),
                role = %principal.role,
                %action,
                "request denied by policy"
            );
            Err(PolicyError::Forbidden {
                role: principal.role.clone(),
                action,
            })
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Whether `role_name` may perform `action` under the standard table.
pub fn allowed(role_name: &str, action: Action) -> bool {
    static STANDARD: OnceLock<PolicyTable> = OnceLock::new();
    STANDARD
        .get_or_init(PolicyTable::standard)
        .allows(role_name, action)
}
