//! crates/booktrack_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Book, BookStatus, NormalizedBook, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// and carries the full request-scoped error taxonomy the web layer maps to HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Malformed input; the message is a field-level description for the caller.
    #[error("{0}")]
    Validation(String),
    /// Missing or not-owned resource. Deliberately identical for both cases so
    /// the existence of another user's resource is never leaked.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was violated (duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Bad credentials or a missing/expired session.
    #[error("Unauthorized")]
    Unauthorized,
    /// A transient failure in an external catalog source. Skipped inside the
    /// fallback chain; only surfaced if every source fails.
    #[error("Upstream source error: {0}")]
    Upstream(String),
    /// A catch-all for unexpected internal failures.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---

    /// Creates a user. Fails with `PortError::Conflict` when the email is
    /// already registered (emails are stored lowercased, so matching is
    /// case-insensitive).
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        issued_at: chrono::DateTime<chrono::Utc>,
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired session token to its user id.
    /// Fails with `PortError::Unauthorized` for unknown or expired tokens.
    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid>;

    /// Deletes a session token. Idempotent: deleting an absent token is Ok.
    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;

    // --- Book Ledger ---

    async fn insert_book(&self, book: &Book) -> PortResult<()>;

    /// Owner-scoped lookup: the owner id is part of the query key, so a book
    /// belonging to another user is indistinguishable from a missing one.
    async fn get_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<Book>;

    /// All books for one owner in insertion order, optionally filtered to one
    /// status.
    async fn list_books(&self, owner_id: Uuid, status: Option<BookStatus>)
        -> PortResult<Vec<Book>>;

    /// Persists a modified book, keyed by `(owner_id, id)`. Last write wins on
    /// concurrent updates to the same book.
    async fn update_book(&self, book: &Book) -> PortResult<()>;

    /// Hard delete, owner-scoped. Fails with `NotFound` when nothing matched.
    async fn delete_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<()>;
}

/// One external bibliographic catalog, queried by identifier.
///
/// `Ok(None)` means the source answered but had no usable record; `Err` means
/// the source itself failed (network, HTTP status, parse). The resolver treats
/// both as "try the next source".
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn lookup(&self, isbn: &str) -> PortResult<Option<NormalizedBook>>;
}
