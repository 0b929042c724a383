use serde::{Deserialize, Serialize};
use shelf_crypto::PasswordCredential;
use shelf_db::{roles, users, NewUserRow};
use shelf_policy::{Action, Principal};
use shelf_types::{BuiltinRole, Role, User, UserId};

use crate::error::{LibraryError, LibraryResult};
use crate::library::Library;
use crate::validate;

/// Registration details for a new account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub login: String,
    pub password: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("login", &self.login)
            .field("last_name", &self.last_name)
            .field("first_name", &self.first_name)
            .field("middle_name", &self.middle_name)
            .finish_non_exhaustive()
    }
}

impl Library {
    /// Create the first administrator. Only possible while no account exists.
    pub fn bootstrap_admin(&mut self, new: &NewUser) -> LibraryResult<UserId> {
        let role = BuiltinRole::Administrator.name();
        let id = self.db.transaction(|tx| {
            if users::count(tx)? > 0 {
                return Err(LibraryError::Conflict(
                    "The library already has accounts; ask an administrator.".into(),
                ));
            }
            insert_user(tx, new, role)
        })?;
        tracing::info!(user = id.get(), login = %new.login, "administrator bootstrapped");
        Ok(id)
    }

    /// Register an account with the named role.
    pub fn create_user(
        &mut self,
        identity: Option<&Principal>,
        new: &NewUser,
        role: &str,
    ) -> LibraryResult<UserId> {
        let principal = self.policy.authorize(identity, Action::ManageUsers)?;
        let id = self.db.transaction(|tx| insert_user(tx, new, role))?;
        tracing::info!(
            user = id.get(),
            login = %new.login,
            role,
            by = principal.user_id.get(),
            "user created"
        );
        Ok(id)
    }

    /// Check a login and password. `None` when either is wrong.
    pub fn authenticate(&self, login: &str, password: &str) -> LibraryResult<Option<Principal>> {
        let Some((user, hash)) = users::credentials(self.db.conn(), login.trim())? else {
            tracing::debug!(login, "login for unknown account");
            return Ok(None);
        };
        if !PasswordCredential::from_phc(hash).verify(password) {
            tracing::debug!(user = user.id.get(), "wrong password");
            return Ok(None);
        }
        Ok(Some(Principal::new(user.id, user.role_name)))
    }

    /// Delete an account together with its reviews and collections.
    pub fn delete_user(
        &mut self,
        identity: Option<&Principal>,
        user_id: UserId,
    ) -> LibraryResult<()> {
        let principal = self.policy.authorize(identity, Action::ManageUsers)?;
        if principal.user_id == user_id {
            return Err(LibraryError::Conflict(
                "You cannot delete your own account.".into(),
            ));
        }
        if !users::delete(self.db.conn(), user_id)? {
            return Err(LibraryError::not_found("user", user_id.get()));
        }
        tracing::info!(user = user_id.get(), by = principal.user_id.get(), "user deleted");
        Ok(())
    }

    pub fn get_user(&self, user_id: UserId) -> LibraryResult<User> {
        users::get(self.db.conn(), user_id)?
            .ok_or_else(|| LibraryError::not_found("user", user_id.get()))
    }

    pub fn list_roles(&self) -> LibraryResult<Vec<Role>> {
        Ok(roles::list(self.db.conn())?)
    }
}

fn insert_user(conn: &shelf_db::Connection, new: &NewUser, role: &str) -> LibraryResult<UserId> {
    let login = validate::short_text("login", &new.login)?;
    let last_name = validate::short_text("last name", &new.last_name)?;
    let first_name = validate::short_text("first name", &new.first_name)?;
    let middle_name = new
        .middle_name
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if new.password.is_empty() {
        return Err(LibraryError::validation("password", "must not be empty"));
    }

    let role = roles::find_by_name(conn, role)?.ok_or_else(|| LibraryError::not_found("role", role))?;
    let credential = PasswordCredential::hash(&new.password)?;
    users::insert(
        conn,
        &NewUserRow {
            login: &login,
            password_hash: credential.as_str(),
            last_name: &last_name,
            first_name: &first_name,
            middle_name,
            role_id: role.id,
        },
    )
    .map_err(|e| {
        if e.is_unique_violation() {
            LibraryError::Conflict(format!("The login \"{login}\" is taken."))
        } else {
            e.into()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{book_fields, Fixture};

    fn new_user(login: &str) -> NewUser {
        NewUser {
            login: login.into(),
            password: format!("{login}-secret"),
            last_name: "Petrova".into(),
            first_name: "Anna".into(),
            middle_name: Some(" ".into()),
        }
    }

    #[test]
    fn bootstrap_then_login() {
        let mut fx = Fixture::new();
        let id = fx.lib.bootstrap_admin(&new_user("root")).unwrap();

        let principal = fx.lib.authenticate("root", "root-secret").unwrap().unwrap();
        assert_eq!(principal.user_id, id);
        assert_eq!(principal.role, "Administrator");
        assert!(fx.lib.authenticate("root", "wrong").unwrap().is_none());
        assert!(fx.lib.authenticate("nobody", "root-secret").unwrap().is_none());

        let user = fx.lib.get_user(id).unwrap();
        assert_eq!(user.full_name(), "Petrova Anna");
        assert_eq!(user.middle_name, None);
    }

    #[test]
    fn bootstrap_refused_once_accounts_exist() {
        let mut fx = Fixture::new();
        fx.reader("early");
        assert!(matches!(
            fx.lib.bootstrap_admin(&new_user("late")),
            Err(LibraryError::Conflict(_))
        ));
    }

    #[test]
    fn create_user_requires_manage_users_and_known_role() {
        let mut fx = Fixture::new();
        let admin = fx.admin();
        let reader = fx.reader("rita");

        assert!(matches!(
            fx.lib.create_user(Some(&reader), &new_user("x"), "Reader"),
            Err(LibraryError::Forbidden(_))
        ));
        assert!(matches!(
            fx.lib.create_user(Some(&admin), &new_user("x"), "Librarian"),
            Err(LibraryError::NotFound { entity: "role", .. })
        ));

        let id = fx
            .lib
            .create_user(Some(&admin), &new_user("mod"), "Moderator")
            .unwrap();
        assert_eq!(fx.lib.get_user(id).unwrap().role_name, "Moderator");
        assert!(matches!(
            fx.lib.create_user(Some(&admin), &new_user("mod"), "Reader"),
            Err(LibraryError::Conflict(_))
        ));
    }

    #[test]
    fn empty_password_is_rejected() {
        let mut fx = Fixture::new();
        let admin = fx.admin();
        let new = NewUser {
            password: String::new(),
            ..new_user("blank")
        };
        assert!(matches!(
            fx.lib.create_user(Some(&admin), &new, "Reader"),
            Err(LibraryError::Validation { field: "password", .. })
        ));
    }

    #[test]
    fn deleting_user_removes_reviews_and_collections() {
        let mut fx = Fixture::new();
        let admin = fx.admin();
        let book = fx
            .lib
            .create_book(Some(&admin), &book_fields("Stays"), &[], None)
            .unwrap();
        let reader = fx.reader("leaving");
        fx.lib.add_review(Some(&reader), book, 4, "bye").unwrap();
        let coll = fx.lib.create_collection(Some(&reader), "Soon gone").unwrap();
        fx.lib.add_book(Some(&reader), coll, book).unwrap();

        fx.lib.delete_user(Some(&admin), reader.user_id).unwrap();

        assert_eq!(fx.lib.review_count(book).unwrap(), 0);
        assert!(matches!(
            fx.lib.get_collection(Some(&admin), coll),
            Err(LibraryError::NotFound { .. })
        ));
        assert!(fx.lib.get_book(None, book).is_ok());
        assert!(matches!(
            fx.lib.delete_user(Some(&admin), reader.user_id),
            Err(LibraryError::NotFound { entity: "user", .. })
        ));
        assert!(matches!(
            fx.lib.delete_user(Some(&admin), admin.user_id),
            Err(LibraryError::Conflict(_))
        ));
    }

    #[test]
    fn debug_hides_password() {
        let debug = format!("{:?}", new_user("shy"));
        assert!(!debug.contains("shy-secret"));
    }

    #[test]
    fn builtin_roles_are_listed() {
        let fx = Fixture::new();
        let names: Vec<String> = fx.lib.list_roles().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Administrator", "Moderator", "Reader"]);
    }
}
