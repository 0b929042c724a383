//! Field checks shared by the services. All run before any state changes.

use shelf_types::BookFields;

use crate::error::{LibraryError, LibraryResult};
use crate::sanitize::sanitize_markup;

/// Longest accepted title, publisher, author, collection or genre name.
pub const MAX_NAME_CHARS: usize = 255;
pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_RATING: u8 = 5;

/// Trimmed, non-empty, at most [`MAX_NAME_CHARS`] characters.
pub fn short_text(field: &'static str, value: &str) -> LibraryResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::validation(field, "must not be empty"));
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(LibraryError::validation(
            field,
            format!("must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(value.to_string())
}

/// Sanitized markup that still has content once disallowed markup is gone.
pub fn rich_text(field: &'static str, value: &str) -> LibraryResult<String> {
    let clean = sanitize_markup(value);
    if clean.is_empty() {
        return Err(LibraryError::validation(field, "must not be empty"));
    }
    Ok(clean)
}

/// Normalized copy of `fields` ready to persist.
pub fn book_fields(fields: &BookFields) -> LibraryResult<BookFields> {
    let title = short_text("title", &fields.title)?;
    let publisher = short_text("publisher", &fields.publisher)?;
    let author = short_text("author", &fields.author)?;
    let description = rich_text("description", &fields.description)?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&fields.year) {
        return Err(LibraryError::validation(
            "year",
            format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
    if fields.pages < 1 {
        return Err(LibraryError::validation("pages", "must be at least 1"));
    }
    Ok(BookFields {
        title,
        description,
        year: fields.year,
        publisher,
        author,
        pages: fields.pages,
    })
}

pub fn rating(value: u8) -> LibraryResult<u8> {
    if value > MAX_RATING {
        return Err(LibraryError::validation(
            "rating",
            format!("must be between 0 and {MAX_RATING}"),
        ));
    }
    Ok(value)
}

/// 1-based page number and a non-zero page size.
pub fn paging(page: u32, per_page: u32) -> LibraryResult<()> {
    if page == 0 {
        return Err(LibraryError::validation("page", "pages are numbered from 1"));
    }
    if per_page == 0 {
        return Err(LibraryError::validation("page size", "must be at least 1"));
    }
    Ok(())
}
