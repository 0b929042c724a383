use shelf_db::{books, covers, genres, reviews, Connection};
use shelf_policy::{Action, Principal};
use shelf_types::{BookDetail, BookFields, BookId, BookSummary, Genre, GenreId, Page};

use crate::covers::{self as cover_store, CoverUpload};
use crate::error::{LibraryError, LibraryResult};
use crate::library::Library;
use crate::reviews::round_rating;
use crate::validate;

/// Drop genre ids that name nothing, logging what was dropped.
fn known_genres(conn: &Connection, requested: &[GenreId]) -> LibraryResult<Vec<GenreId>> {
    let known = genres::existing(conn, requested)?;
    if known.len() != requested.len() {
        let dropped: Vec<i64> = requested
            .iter()
            .filter(|id| !known.contains(id))
            .map(|id| id.get())
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(?dropped, "unknown genre ids ignored");
        }
    }
    Ok(known)
}

impl Library {
    /// Create a book with its genres and, optionally, a cover.
    ///
    /// Everything happens in one transaction: a failed cover write leaves
    /// neither the book nor the cover behind.
    pub fn create_book(
        &mut self,
        identity: Option<&Principal>,
        fields: &BookFields,
        genre_ids: &[GenreId],
        cover: Option<CoverUpload>,
    ) -> LibraryResult<BookId> {
        let principal = self.policy.authorize(identity, Action::CreateBook)?;
        let fields = validate::book_fields(fields)?;
        let cover = match cover {
            Some(upload) => {
                let ext = upload.check(self.config.max_cover_bytes)?;
                Some((upload, ext))
            }
            None => None,
        };

        let blobs = self.blobs.as_ref();
        let id = self.db.transaction(|tx| {
            let id = books::insert(tx, &fields)?;
            books::replace_genres(tx, id, &known_genres(tx, genre_ids)?)?;
            if let Some((upload, ext)) = &cover {
                cover_store::accept(tx, blobs, upload, ext, id)?;
            }
            Ok::<_, LibraryError>(id)
        })?;
        tracing::info!(
            book = id.get(),
            user = principal.user_id.get(),
            title = %fields.title,
            "book created"
        );
        Ok(id)
    }

    /// Replace a book's scalar fields and its whole genre set.
    pub fn update_book(
        &mut self,
        identity: Option<&Principal>,
        book_id: BookId,
        fields: &BookFields,
        genre_ids: &[GenreId],
    ) -> LibraryResult<()> {
        let principal = self.policy.authorize(identity, Action::EditBook)?;
        let fields = validate::book_fields(fields)?;
        self.db.transaction(|tx| {
            books::update(tx, book_id, &fields)?;
            books::replace_genres(tx, book_id, &known_genres(tx, genre_ids)?)?;
            Ok::<_, LibraryError>(())
        })?;
        tracing::info!(book = book_id.get(), user = principal.user_id.get(), "book updated");
        Ok(())
    }

    /// Delete a book. The schema cascade removes its reviews and
    /// associations; covers no other book uses are deleted too, and their
    /// artifacts are removed once the transaction has committed.
    pub fn delete_book(
        &mut self,
        identity: Option<&Principal>,
        book_id: BookId,
    ) -> LibraryResult<()> {
        let principal = self.policy.authorize(identity, Action::DeleteBook)?;
        let orphaned = self.db.transaction(|tx| {
            if !books::delete(tx, book_id)? {
                return Err(LibraryError::not_found("book", book_id.get()));
            }
            let orphaned = covers::unlinked(tx)?;
            for cover in &orphaned {
                covers::delete(tx, cover.id)?;
            }
            Ok(orphaned)
        })?;
        cover_store::remove_artifacts(self.blobs.as_ref(), &orphaned);
        tracing::info!(
            book = book_id.get(),
            user = principal.user_id.get(),
            covers_removed = orphaned.len(),
            "book deleted"
        );
        Ok(())
    }

    /// One page of the catalog, newest publication year first.
    ///
    /// Pages are 1-based; a page past the end is empty.
    pub fn list_books(&self, page: u32, per_page: u32) -> LibraryResult<Page<BookSummary>> {
        validate::paging(page, per_page)?;
        let conn = self.db.conn();
        let total = books::count(conn)?;
        let offset = u64::from(page - 1) * u64::from(per_page);
        let items = books::list_page(conn, per_page, offset)?
            .into_iter()
            .map(|book| -> LibraryResult<BookSummary> {
                let stats = reviews::stats(conn, book.id)?;
                Ok(BookSummary {
                    genres: genres::for_book(conn, book.id)?,
                    review_count: stats.count,
                    average_rating: stats.mean.map(round_rating),
                    book,
                })
            })
            .collect::<LibraryResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Everything shown on a book's page. Anyone may read it; a signed-in
    /// caller also gets their own review, if any.
    pub fn get_book(
        &self,
        identity: Option<&Principal>,
        book_id: BookId,
    ) -> LibraryResult<BookDetail> {
        let conn = self.db.conn();
        let book = books::get(conn, book_id)?
            .ok_or_else(|| LibraryError::not_found("book", book_id.get()))?;
        let stats = reviews::stats(conn, book_id)?;
        let own_review = match identity {
            Some(principal) => reviews::by_book_and_user(conn, book_id, principal.user_id)?,
            None => None,
        };
        Ok(BookDetail {
            genres: genres::for_book(conn, book_id)?,
            covers: covers::for_book(conn, book_id)?,
            reviews: reviews::for_book(conn, book_id)?,
            review_count: stats.count,
            average_rating: stats.mean.map(round_rating),
            own_review,
            book,
        })
    }

    pub fn create_genre(
        &mut self,
        identity: Option<&Principal>,
        name: &str,
    ) -> LibraryResult<GenreId> {
        self.policy.authorize(identity, Action::ManageGenres)?;
        let name = validate::short_text("genre name", name)?;
        let id = genres::insert(self.db.conn(), &name).map_err(|e| {
            if e.is_unique_violation() {
                LibraryError::Conflict(format!("A genre named \"{name}\" already exists."))
            } else {
                e.into()
            }
        })?;
        tracing::info!(genre = id.get(), %name, "genre created");
        Ok(id)
    }

    /// All genres by name.
    pub fn list_genres(&self) -> LibraryResult<Vec<Genre>> {
        Ok(genres::list(self.db.conn())?)
    }
}
