//! Authorization policy for the Shelf catalog.
//!
//! Every service entry point asks whether the caller may perform an action,
//! and this crate is the only place that question is answered. The answer
//! depends on nothing but the caller's single role name and the action.
//!
//! # Quick Start
//!
//! ```rust
//! use shelf_policy::{allowed, Action, PolicyTable, Principal};
//! use shelf_types::UserId;
//!
//! assert!(allowed("Moderator", Action::EditBook));
//! assert!(!allowed("Moderator", Action::DeleteBook));
//!
//! let table = PolicyTable::standard();
//! let reader = Principal::new(UserId::new(3), "Reader");
//! assert!(table.authorize(Some(&reader), Action::CreateCollection).is_ok());
//! assert!(table.authorize(None, Action::CreateReview).is_err());
//! ```

pub mod action;
pub mod error;
pub mod identity;
pub mod table;

pub use action::Action;
pub use error::PolicyError;
pub use identity::Principal;
pub use table::{allowed, PolicyTable};
