//! crates/booktrack_core/src/ledger.rs
//!
//! Pure ledger logic: constructing a new book from caller input and applying
//! partial updates while holding the page/progress invariants. Handlers call
//! these functions and persist whatever comes back, so the invariants live in
//! one place and can be tested without a database.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Book, BookPatch, BookStatus, NewBook};
use crate::ports::{PortError, PortResult};

/// Validates caller input and constructs a fresh `Book` for the given owner.
///
/// Every new book starts at page zero regardless of status; `date_finished`
/// is only ever stamped by a later status update. A record with an unknown
/// (zero) page count is rejected here - the caller must correct the count
/// before adding, since progress tracking needs a positive denominator.
pub fn build_book(owner_id: Uuid, new: NewBook, now: DateTime<Utc>) -> PortResult<Book> {
    let isbn = new.isbn.trim();
    if isbn.is_empty() {
        return Err(PortError::Validation("isbn must not be empty".to_string()));
    }
    if new.title.trim().is_empty() {
        return Err(PortError::Validation("title must not be empty".to_string()));
    }
    if new.total_pages <= 0 {
        return Err(PortError::Validation(
            "totalPages must be a positive integer".to_string(),
        ));
    }

    Ok(Book {
        id: Uuid::new_v4(),
        owner_id,
        isbn: isbn.to_string(),
        title: new.title.trim().to_string(),
        author: new.author,
        cover_image: new.cover_image,
        total_pages: new.total_pages,
        current_page: 0,
        status: new.status,
        date_added: now,
        date_finished: None,
        notes: None,
        rating: None,
    })
}

/// Applies a partial update to a book, returning the updated copy.
///
/// Rejections leave the caller's stored record untouched:
/// - `current_page` outside `[0, total_pages]` is a validation error, never
///   silently clamped;
/// - `rating` outside `[1, 5]` is a validation error.
///
/// Moving to `read` snaps the page to the end and stamps `date_finished`
/// when it was never set. Moving away from `read` keeps `date_finished`
/// (history-preserving). An explicit `date_finished` in the patch is always
/// honored, applied after the status transition.
pub fn apply_patch(book: &Book, patch: &BookPatch, now: DateTime<Utc>) -> PortResult<Book> {
    let mut updated = book.clone();

    if let Some(page) = patch.current_page {
        if page < 0 || page > updated.total_pages {
            return Err(PortError::Validation(format!(
                "currentPage must be between 0 and {}",
                updated.total_pages
            )));
        }
        updated.current_page = page;
    }

    if let Some(rating) = patch.rating {
        if !(1..=5).contains(&rating) {
            return Err(PortError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        updated.rating = Some(rating);
    }

    if let Some(status) = patch.status {
        updated.status = status;
        if status == BookStatus::Read {
            updated.current_page = updated.total_pages;
            if updated.date_finished.is_none() {
                updated.date_finished = Some(now);
            }
        }
    }

    if let Some(finished) = patch.date_finished {
        updated.date_finished = Some(finished);
    }

    if let Some(notes) = &patch.notes {
        updated.notes = Some(notes.clone());
    }

    Ok(updated)
}
