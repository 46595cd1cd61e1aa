//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use booktrack_core::domain::{Book, BookStatus, User, UserCredentials};
use booktrack_core::ports::{DatabaseService, PortError, PortResult};

// Postgres unique_violation, used to detect duplicate emails.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
}

impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    owner_id: Uuid,
    isbn: String,
    title: String,
    author: String,
    cover_image: Option<String>,
    total_pages: i32,
    current_page: i32,
    status: String,
    date_added: DateTime<Utc>,
    date_finished: Option<DateTime<Utc>>,
    notes: Option<String>,
    rating: Option<i32>,
}

impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        let status = self
            .status
            .parse::<BookStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(Book {
            id: self.id,
            owner_id: self.owner_id,
            isbn: self.isbn,
            title: self.title,
            author: self.author,
            cover_image: self.cover_image,
            total_pages: self.total_pages,
            current_page: self.current_page,
            status,
            date_added: self.date_added,
            date_finished: self.date_finished,
            notes: self.notes,
            rating: self.rating,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> PortResult<User> {
        let email = email.trim().to_lowercase();
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict("email is already registered".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.trim().to_lowercase();
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, email, name, password_hash FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("no such user".to_string()),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (token, user_id, issued_at, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(token)
        .bind(user_id)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<Uuid> {
        // Expired rows are reaped on sight rather than by a background task.
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1 AND expires_at <= now()")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_book(&self, book: &Book) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO books (id, owner_id, isbn, title, author, cover_image, total_pages, \
             current_page, status, date_added, date_finished, notes, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(book.id)
        .bind(book.owner_id)
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.cover_image)
        .bind(book.total_pages)
        .bind(book.current_page)
        .bind(book.status.as_str())
        .bind(book.date_added)
        .bind(book.date_finished)
        .bind(&book.notes)
        .bind(book.rating)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "SELECT id, owner_id, isbn, title, author, cover_image, total_pages, current_page, \
             status, date_added, date_finished, notes, rating \
             FROM books WHERE id = $1 AND owner_id = $2",
        )
        .bind(book_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Book {} not found", book_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_books(
        &self,
        owner_id: Uuid,
        status: Option<BookStatus>,
    ) -> PortResult<Vec<Book>> {
        let records = match status {
            Some(status) => {
                sqlx::query_as::<_, BookRecord>(
                    "SELECT id, owner_id, isbn, title, author, cover_image, total_pages, \
                     current_page, status, date_added, date_finished, notes, rating \
                     FROM books WHERE owner_id = $1 AND status = $2 ORDER BY date_added ASC, id ASC",
                )
                .bind(owner_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, BookRecord>(
                    "SELECT id, owner_id, isbn, title, author, cover_image, total_pages, \
                     current_page, status, date_added, date_finished, notes, rating \
                     FROM books WHERE owner_id = $1 ORDER BY date_added ASC, id ASC",
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_book(&self, book: &Book) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE books SET current_page = $1, status = $2, date_finished = $3, notes = $4, \
             rating = $5 WHERE id = $6 AND owner_id = $7",
        )
        .bind(book.current_page)
        .bind(book.status.as_str())
        .bind(book.date_finished)
        .bind(&book.notes)
        .bind(book.rating)
        .bind(book.id)
        .bind(book.owner_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book.id)));
        }
        Ok(())
    }

    async fn delete_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND owner_id = $2")
            .bind(book_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }
}
