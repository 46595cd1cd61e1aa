//! crates/booktrack_core/src/stats.rs
//!
//! Read-time aggregation over one owner's ledger. No persistence and no
//! caching: callers pass the books as they stand and get derived values back.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{Book, BookStatus, Stats};

/// Computes summary statistics for a set of books owned by one user.
///
/// `total_pages_read` sums `current_page` across every book, so partial
/// progress on in-progress books counts. `average_progress` is the mean of
/// the derived progress values, defined as 0 for an empty ledger. The
/// month histogram buckets only finished books that carry a `date_finished`;
/// books marked read without one are still counted in `books_read`.
pub fn compute_stats(books: &[Book]) -> Stats {
    let mut stats = Stats {
        total_books: books.len() as u32,
        books_read: 0,
        books_reading: 0,
        books_to_read: 0,
        total_pages_read: 0,
        average_progress: 0.0,
        books_by_month: BTreeMap::new(),
    };

    let mut progress_sum = 0.0;
    for book in books {
        match book.status {
            BookStatus::Read => stats.books_read += 1,
            BookStatus::CurrentlyReading => stats.books_reading += 1,
            BookStatus::WantToRead => stats.books_to_read += 1,
        }
        stats.total_pages_read += i64::from(book.current_page);
        progress_sum += book.progress();

        if book.status == BookStatus::Read {
            if let Some(finished) = book.date_finished {
                let bucket = format!("{:04}-{:02}", finished.year(), finished.month());
                *stats.books_by_month.entry(bucket).or_insert(0) += 1;
            }
        }
    }

    if !books.is_empty() {
        stats.average_progress = progress_sum / books.len() as f64;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    fn book(
        status: BookStatus,
        current_page: i32,
        total_pages: i32,
        date_finished: Option<DateTime<Utc>>,
    ) -> Book {
        Book {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            isbn: "9780439708180".to_string(),
            title: "A Book".to_string(),
            author: "An Author".to_string(),
            cover_image: None,
            total_pages,
            current_page,
            status,
            date_added: Utc::now(),
            date_finished,
            notes: None,
            rating: None,
        }
    }

    #[test]
    fn empty_ledger_yields_zeroes_not_errors() {
        let stats = compute_stats(&[]);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.books_read, 0);
        assert_eq!(stats.total_pages_read, 0);
        assert_eq!(stats.average_progress, 0.0);
        assert!(stats.books_by_month.is_empty());
    }

    #[test]
    fn pages_read_includes_partial_progress() {
        let books = vec![
            book(BookStatus::Read, 320, 320, None),
            book(BookStatus::CurrentlyReading, 150, 300, None),
            book(BookStatus::WantToRead, 0, 200, None),
        ];
        let stats = compute_stats(&books);
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.books_read, 1);
        assert_eq!(stats.books_reading, 1);
        assert_eq!(stats.books_to_read, 1);
        assert_eq!(stats.total_pages_read, 470);
        // (100 + 50 + 0) / 3
        assert!((stats.average_progress - 50.0).abs() < 1e-9);
    }

    #[test]
    fn month_histogram_buckets_finished_books_only() {
        let march = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        let also_march = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let december = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let books = vec![
            book(BookStatus::Read, 100, 100, Some(march)),
            book(BookStatus::Read, 200, 200, Some(also_march)),
            book(BookStatus::Read, 50, 50, Some(december)),
            // finished date on an unread book is ignored by the histogram
            book(BookStatus::CurrentlyReading, 10, 100, Some(march)),
        ];
        let stats = compute_stats(&books);
        assert_eq!(stats.books_by_month.get("2024-03"), Some(&2));
        assert_eq!(stats.books_by_month.get("2023-12"), Some(&1));
        assert_eq!(stats.books_by_month.len(), 2);
    }

    #[test]
    fn read_without_finish_date_counts_but_is_not_bucketed() {
        let books = vec![book(BookStatus::Read, 100, 100, None)];
        let stats = compute_stats(&books);
        assert_eq!(stats.books_read, 1);
        assert!(stats.books_by_month.is_empty());
    }
}
