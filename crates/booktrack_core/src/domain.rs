//! crates/booktrack_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a registered user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Represents a browser login session (auth cookie).
///
/// The token is the sole bearer credential; it must never be logged.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The reading status of a tracked book.
///
/// All three states are mutually reachable; a finished book may be moved
/// back to "want to read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    WantToRead,
    CurrentlyReading,
    Read,
}

impl BookStatus {
    /// The snake_case name used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::WantToRead => "want_to_read",
            BookStatus::CurrentlyReading => "currently_reading",
            BookStatus::Read => "read",
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(BookStatus::WantToRead),
            "currently_reading" => Ok(BookStatus::CurrentlyReading),
            "read" => Ok(BookStatus::Read),
            other => Err(format!("'{}' is not a valid book status", other)),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A book tracked by exactly one owner.
///
/// `current_page` is always within `[0, total_pages]`; `total_pages` is
/// strictly positive for every stored book. Reading progress is derived
/// via [`Book::progress`], never stored.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
    pub current_page: i32,
    pub status: BookStatus,
    pub date_added: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
}

impl Book {
    /// Percentage read, in `[0, 100]`. Zero when `total_pages` is zero.
    pub fn progress(&self) -> f64 {
        if self.total_pages <= 0 {
            return 0.0;
        }
        (f64::from(self.current_page) / f64::from(self.total_pages)) * 100.0
    }
}

/// A bibliographic result reshaped into the common structure regardless
/// of which catalog source produced it.
///
/// `total_pages` is 0 when the source did not report a page count; such a
/// record cannot be stored as-is and must be corrected before the add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
}

/// The fields a caller may supply when adding a book to their ledger.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
    pub status: BookStatus,
}

/// A partial update to an owned book. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub current_page: Option<i32>,
    pub status: Option<BookStatus>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
}

/// Summary statistics derived on demand from one owner's ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total_books: u32,
    pub books_read: u32,
    pub books_reading: u32,
    pub books_to_read: u32,
    pub total_pages_read: i64,
    pub average_progress: f64,
    pub books_by_month: std::collections::BTreeMap<String, u32>,
}
