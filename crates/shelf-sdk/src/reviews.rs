use chrono::{DateTime, Utc};
use shelf_db::{books, reviews, DbError};
use shelf_policy::{Action, Principal};
use shelf_types::{BookId, Page, Review, ReviewEntry, ReviewId, UserId};

use crate::error::{LibraryError, LibraryResult};
use crate::library::Library;
use crate::validate;

/// Mean rating rounded to one decimal place.
pub(crate) fn round_rating(mean: f64) -> f64 {
    (mean * 10.0).round() / 10.0
}

/// Current time truncated to the millisecond precision the store keeps.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

const DUPLICATE_REVIEW: &str = "You have already reviewed this book.";

/// A second review by the same user for the same book is a conflict.
fn review_insert_error(e: DbError) -> LibraryError {
    if e.is_unique_violation() {
        LibraryError::Conflict(DUPLICATE_REVIEW.into())
    } else {
        e.into()
    }
}

impl Library {
    /// Post the caller's review of a book. A caller reviews each book once.
    pub fn add_review(
        &mut self,
        identity: Option<&Principal>,
        book_id: BookId,
        rating: u8,
        text: &str,
    ) -> LibraryResult<ReviewId> {
        let principal = self.policy.authorize(identity, Action::CreateReview)?;
        let rating = validate::rating(rating)?;
        let text = validate::rich_text("review text", text)?;
        let user_id = principal.user_id;

        let id = self.db.transaction(|tx| {
            if !books::exists(tx, book_id)? {
                return Err(LibraryError::not_found("book", book_id.get()));
            }
            if reviews::by_book_and_user(tx, book_id, user_id)?.is_some() {
                return Err(LibraryError::Conflict(DUPLICATE_REVIEW.into()));
            }
            reviews::insert(tx, book_id, user_id, rating, &text, now())
                .map_err(review_insert_error)
        })?;
        tracing::info!(
            review = id.get(),
            book = book_id.get(),
            user = user_id.get(),
            rating,
            "review added"
        );
        Ok(id)
    }

    /// Remove a review. Returns the book it belonged to.
    pub fn delete_review(
        &mut self,
        identity: Option<&Principal>,
        review_id: ReviewId,
    ) -> LibraryResult<BookId> {
        let principal = self.policy.authorize(identity, Action::DeleteReview)?;
        let book_id = self.db.transaction(|tx| {
            let review = reviews::get(tx, review_id)?
                .ok_or_else(|| LibraryError::not_found("review", review_id.get()))?;
            reviews::delete(tx, review_id)?;
            Ok::<_, LibraryError>(review.book_id)
        })?;
        tracing::info!(
            review = review_id.get(),
            book = book_id.get(),
            moderator = principal.user_id.get(),
            "review deleted"
        );
        Ok(book_id)
    }

    /// Mean rating rounded to one decimal, `None` without reviews.
    pub fn average_rating(&self, book_id: BookId) -> LibraryResult<Option<f64>> {
        Ok(reviews::stats(self.db.conn(), book_id)?.mean.map(round_rating))
    }

    pub fn review_count(&self, book_id: BookId) -> LibraryResult<u64> {
        Ok(reviews::stats(self.db.conn(), book_id)?.count)
    }

    /// The review `user_id` wrote for `book_id`, if any.
    pub fn user_review(&self, book_id: BookId, user_id: UserId) -> LibraryResult<Option<Review>> {
        Ok(reviews::by_book_and_user(self.db.conn(), book_id, user_id)?)
    }

    /// All reviews across the catalog, newest first, for moderation.
    pub fn moderation_queue(
        &self,
        identity: Option<&Principal>,
        page: u32,
        per_page: u32,
    ) -> LibraryResult<Page<ReviewEntry>> {
        self.policy.authorize(identity, Action::ViewModerationQueue)?;
        validate::paging(page, per_page)?;
        let conn = self.db.conn();
        let offset = u64::from(page - 1) * u64::from(per_page);
        Ok(Page {
            items: reviews::page(conn, per_page, offset)?,
            total: reviews::count_all(conn)?,
            page,
            per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_types::BookFields;
    use crate::testing::{book_fields, staff, Fixture};

    fn book(fx: &mut Fixture, title: &str) -> BookId {
        let admin = fx.admin();
        fx.lib
            .create_book(Some(&admin), &book_fields(title), &[], None)
            .unwrap()
    }

    #[test]
    fn rounding_to_one_decimal() {
        assert_eq!(round_rating(4.0), 4.0);
        assert_eq!(round_rating(11.0 / 3.0), 3.7);
        assert_eq!(round_rating(4.25), 4.3);
    }

    #[test]
    fn one_review_per_user_per_book() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Once");
        let alice = fx.reader("alice");
        fx.lib.add_review(Some(&alice), id, 5, "great").unwrap();

        let err = fx.lib.add_review(Some(&alice), id, 1, "again").unwrap_err();
        assert!(matches!(err, LibraryError::Conflict(_)));
        assert_eq!(err.user_message(), "You have already reviewed this book.");
        assert_eq!(fx.lib.review_count(id).unwrap(), 1);
    }

    #[test]
    fn concurrent_duplicate_review_is_a_conflict() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Raced");
        let alice = fx.reader("alice");
        let conn = fx.lib.database().conn();
        reviews::insert(conn, id, alice.user_id, 4, "first", now()).unwrap();
        let lost = reviews::insert(conn, id, alice.user_id, 2, "second", now()).unwrap_err();

        let err = review_insert_error(lost);
        assert!(matches!(err, LibraryError::Conflict(_)));
        assert_eq!(err.user_message(), DUPLICATE_REVIEW);
    }

    #[test]
    fn review_by_a_deleted_user_is_not_found() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Orphaned");
        let ghost = UserId::new(4242);
        let err = reviews::insert(fx.lib.database().conn(), id, ghost, 3, "late", now())
            .map_err(review_insert_error)
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[test]
    fn review_requires_identity_existing_book_and_valid_input() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Checked");
        let alice = fx.reader("alice");

        assert!(matches!(
            fx.lib.add_review(None, id, 5, "anon"),
            Err(LibraryError::Unauthenticated(_))
        ));
        assert!(matches!(
            fx.lib.add_review(Some(&alice), BookId::new(404), 5, "ghost"),
            Err(LibraryError::NotFound { entity: "book", .. })
        ));
        assert!(matches!(
            fx.lib.add_review(Some(&alice), id, 6, "too much"),
            Err(LibraryError::Validation { field: "rating", .. })
        ));
        assert!(matches!(
            fx.lib.add_review(Some(&alice), id, 3, "   "),
            Err(LibraryError::Validation { field: "review text", .. })
        ));
        assert_eq!(fx.lib.review_count(id).unwrap(), 0);
    }

    #[test]
    fn review_text_is_sanitized() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Safe");
        let alice = fx.reader("alice");
        fx.lib
            .add_review(Some(&alice), id, 4, "<strong>Good</strong><script>x()</script>")
            .unwrap();
        let review = fx.lib.user_review(id, alice.user_id).unwrap().unwrap();
        assert_eq!(review.text, "<strong>Good</strong>");
        assert_eq!(review.rating, 4);
    }

    #[test]
    fn aggregates_over_reviews() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Rated");
        assert_eq!(fx.lib.average_rating(id).unwrap(), None);
        assert_eq!(fx.lib.review_count(id).unwrap(), 0);

        for (login, rating) in [("a", 5), ("b", 4), ("c", 3)] {
            let who = fx.reader(login);
            fx.lib.add_review(Some(&who), id, rating, "ok").unwrap();
        }
        assert_eq!(fx.lib.review_count(id).unwrap(), 3);
        assert_eq!(fx.lib.average_rating(id).unwrap(), Some(4.0));
    }

    #[test]
    fn only_staff_delete_reviews() {
        let mut fx = Fixture::new();
        let id = book(&mut fx, "Moderated");
        let alice = fx.reader("alice");
        let review = fx.lib.add_review(Some(&alice), id, 2, "meh").unwrap();

        assert!(matches!(
            fx.lib.delete_review(Some(&alice), review),
            Err(LibraryError::Forbidden(_))
        ));
        let moderator = staff(&mut fx, "mo", "Moderator");
        assert_eq!(fx.lib.delete_review(Some(&moderator), review).unwrap(), id);
        assert!(matches!(
            fx.lib.delete_review(Some(&moderator), review),
            Err(LibraryError::NotFound { entity: "review", .. })
        ));
    }

    #[test]
    fn moderation_queue_is_staff_only_and_newest_first() {
        let mut fx = Fixture::new();
        let first = book(&mut fx, "First");
        let second = book(&mut fx, "Second");
        let alice = fx.reader("alice");
        fx.lib.add_review(Some(&alice), first, 5, "one").unwrap();
        let newest = fx.lib.add_review(Some(&alice), second, 4, "two").unwrap();

        assert!(matches!(
            fx.lib.moderation_queue(Some(&alice), 1, 20),
            Err(LibraryError::Forbidden(_))
        ));
        let moderator = staff(&mut fx, "mo", "Moderator");
        let queue = fx.lib.moderation_queue(Some(&moderator), 1, 20).unwrap();
        assert_eq!(queue.total, 2);
        // Same millisecond is possible; ties fall back to the newer id.
        assert_eq!(queue.items[0].review.id, newest);
        assert_eq!(queue.items[0].book_title, "Second");
        assert_eq!(queue.items[0].author_name, "Reader alice");
    }

    #[test]
    fn end_to_end_review_moderation() {
        let mut fx = Fixture::new();
        let admin = fx.admin();
        let sci_fi = fx.lib.create_genre(Some(&admin), "Sci-Fi").unwrap();
        let fields = BookFields {
            pages: 100,
            ..book_fields("Foo")
        };
        let foo = fx
            .lib
            .create_book(Some(&admin), &fields, &[sci_fi], None)
            .unwrap();
        let detail = fx.lib.get_book(None, foo).unwrap();
        assert_eq!(detail.book.year, 2001);
        assert_eq!(detail.book.pages, 100);
        let genres: Vec<_> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(genres, ["Sci-Fi"]);

        let alice = fx.reader("alice");
        let bob = fx.reader("bob");
        fx.lib.add_review(Some(&alice), foo, 5, "excellent").unwrap();
        let bobs = fx.lib.add_review(Some(&bob), foo, 3, "average").unwrap();

        assert_eq!(fx.lib.average_rating(foo).unwrap(), Some(4.0));
        assert_eq!(fx.lib.review_count(foo).unwrap(), 2);

        let moderator = staff(&mut fx, "mo", "Moderator");
        fx.lib.delete_review(Some(&moderator), bobs).unwrap();

        assert_eq!(fx.lib.average_rating(foo).unwrap(), Some(5.0));
        assert_eq!(fx.lib.review_count(foo).unwrap(), 1);
    }
}
