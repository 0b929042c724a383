use crate::action::Action;

/// Why a request was refused by the policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// No identity was presented for an action that requires one.
    #[error("authentication required for {0}")]
    Unauthenticated(Action),

    /// The caller's role does not grant the action.
    #[error("role '{role}' may not {action}")]
    Forbidden { role: String, action: Action },
}
