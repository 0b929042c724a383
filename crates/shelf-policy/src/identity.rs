use serde::{Deserialize, Serialize};
use shelf_types::UserId;

/// An authenticated caller, as established by the session layer.
///
/// Services never look this up from ambient state; it is passed into every
/// gated call as `Option<&Principal>` (`None` for anonymous visitors).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    /// Name of the caller's single role.
    pub role: String,
}

impl Principal {
    pub fn new(user_id: UserId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}
