use serde::{Deserialize, Serialize};
use shelf_db::{books, collections, DbError};
use shelf_policy::{Action, Principal};
use shelf_types::{BookId, Collection, CollectionDetail, CollectionId, CollectionSummary, UserId};

use crate::error::{LibraryError, LibraryResult};
use crate::library::Library;
use crate::validate;

const ALREADY_MEMBER: &str = "The book is already in this collection.";

/// A membership insert that finds the pair already present.
fn membership_error(e: DbError) -> LibraryError {
    if e.is_unique_violation() {
        LibraryError::AlreadyExists(ALREADY_MEMBER.into())
    } else {
        e.into()
    }
}

/// Outcome reported to asynchronous callers of collection changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
}

impl ToggleResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Success with `message`, or failure carrying the error's user message.
    pub fn from_outcome<T>(outcome: &LibraryResult<T>, message: impl Into<String>) -> Self {
        match outcome {
            Ok(_) => Self::ok(message),
            Err(e) => Self::failed(e.user_message()),
        }
    }
}

impl Library {
    /// Whether `principal` may read collections owned by `owner`.
    fn can_view_collections_of(&self, principal: &Principal, owner: UserId) -> bool {
        principal.user_id == owner || self.policy.allows(&principal.role, Action::ViewAnyCollection)
    }

    fn visible_collection(
        &self,
        identity: Option<&Principal>,
        collection_id: CollectionId,
    ) -> LibraryResult<Collection> {
        let principal = identity.ok_or_else(|| {
            LibraryError::Unauthenticated("view collections".into())
        })?;
        let collection = collections::get(self.db.conn(), collection_id)?
            .ok_or_else(|| LibraryError::not_found("collection", collection_id.get()))?;
        if !self.can_view_collections_of(principal, collection.user_id) {
            return Err(LibraryError::Forbidden(format!(
                "{collection_id} belongs to another user"
            )));
        }
        Ok(collection)
    }

    /// Create an empty collection owned by the caller.
    pub fn create_collection(
        &mut self,
        identity: Option<&Principal>,
        name: &str,
    ) -> LibraryResult<CollectionId> {
        let principal = self.policy.authorize(identity, Action::CreateCollection)?;
        let name = validate::short_text("collection name", name)?;
        let id = collections::insert(self.db.conn(), principal.user_id, &name)?;
        tracing::info!(collection = id.get(), user = principal.user_id.get(), %name, "collection created");
        Ok(id)
    }

    /// Add a book to one of the caller's collections.
    ///
    /// Adding a book that is already a member is reported as
    /// [`LibraryError::AlreadyExists`] and leaves the collection unchanged.
    pub fn add_book(
        &mut self,
        identity: Option<&Principal>,
        collection_id: CollectionId,
        book_id: BookId,
    ) -> LibraryResult<()> {
        let principal = self.policy.authorize(identity, Action::ManageCollection)?;
        let user_id = principal.user_id;
        self.db.transaction(|tx| {
            let collection = collections::get(tx, collection_id)?
                .ok_or_else(|| LibraryError::not_found("collection", collection_id.get()))?;
            if collection.user_id != user_id {
                return Err(LibraryError::Forbidden(format!(
                    "{collection_id} belongs to another user"
                )));
            }
            if !books::exists(tx, book_id)? {
                return Err(LibraryError::not_found("book", book_id.get()));
            }
            if collections::is_member(tx, collection_id, book_id)? {
                return Err(LibraryError::AlreadyExists(ALREADY_MEMBER.into()));
            }
            collections::add_member(tx, collection_id, book_id).map_err(membership_error)
        })?;
        tracing::info!(
            collection = collection_id.get(),
            book = book_id.get(),
            user = user_id.get(),
            "book added to collection"
        );
        Ok(())
    }

    /// Remove a book from one of the caller's collections.
    pub fn remove_book(
        &mut self,
        identity: Option<&Principal>,
        collection_id: CollectionId,
        book_id: BookId,
    ) -> LibraryResult<()> {
        let principal = self.policy.authorize(identity, Action::ManageCollection)?;
        let user_id = principal.user_id;
        self.db.transaction(|tx| {
            let collection = collections::get(tx, collection_id)?
                .ok_or_else(|| LibraryError::not_found("collection", collection_id.get()))?;
            if collection.user_id != user_id {
                return Err(LibraryError::Forbidden(format!(
                    "{collection_id} belongs to another user"
                )));
            }
            if !collections::remove_member(tx, collection_id, book_id)? {
                return Err(LibraryError::not_found(
                    "collection member",
                    format!("{book_id} in {collection_id}"),
                ));
            }
            Ok(())
        })?;
        tracing::info!(
            collection = collection_id.get(),
            book = book_id.get(),
            user = user_id.get(),
            "book removed from collection"
        );
        Ok(())
    }

    /// Collections owned by `user_id`, with book counts.
    pub fn list_collections(
        &self,
        identity: Option<&Principal>,
        user_id: UserId,
    ) -> LibraryResult<Vec<CollectionSummary>> {
        let principal = identity.ok_or_else(|| {
            LibraryError::Unauthenticated("view collections".into())
        })?;
        if !self.can_view_collections_of(principal, user_id) {
            return Err(LibraryError::Forbidden(format!(
                "collections of {user_id} are private"
            )));
        }
        Ok(collections::list_for_user(self.db.conn(), user_id)?)
    }

    /// A collection with its books.
    pub fn get_collection(
        &self,
        identity: Option<&Principal>,
        collection_id: CollectionId,
    ) -> LibraryResult<CollectionDetail> {
        let collection = self.visible_collection(identity, collection_id)?;
        let books = collections::books(self.db.conn(), collection_id)?;
        Ok(CollectionDetail { collection, books })
    }
}
