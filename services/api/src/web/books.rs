//! services/api/src/web/books.rs
//!
//! The book ledger endpoints: catalog search, add, list, update, and delete.
//! Field names on the wire are camelCase; progress is derived per response
//! rather than stored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use booktrack_core::domain::{Book, BookPatch, BookStatus, NewBook, NormalizedBook};
use booktrack_core::ledger;
use booktrack_core::ports::PortError;

use crate::error::ApiError;
use crate::web::middleware::AuthedUser;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A catalog lookup result, before the book is added to the ledger.
/// `totalPages` is 0 when the source did not report a page count; the add
/// request must then supply a corrected positive count.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchResponse {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
}

impl From<NormalizedBook> for BookSearchResponse {
    fn from(record: NormalizedBook) -> Self {
        Self {
            isbn: record.isbn,
            title: record.title,
            author: record.author,
            cover_image: record.cover_image,
            total_pages: record.total_pages,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
    /// Defaults to `want_to_read` when omitted.
    #[schema(value_type = Option<String>, example = "want_to_read")]
    pub status: Option<BookStatus>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub current_page: Option<i32>,
    #[schema(value_type = Option<String>, example = "currently_reading")]
    pub status: Option<BookStatus>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub cover_image: Option<String>,
    pub total_pages: i32,
    pub current_page: i32,
    #[schema(value_type = String, example = "currently_reading")]
    pub status: BookStatus,
    pub progress: f64,
    pub date_added: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let progress = book.progress();
        Self {
            id: book.id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            cover_image: book.cover_image,
            total_pages: book.total_pages,
            current_page: book.current_page,
            status: book.status,
            progress,
            date_added: book.date_added,
            date_finished: book.date_finished,
            notes: book.notes,
            rating: book.rating,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/books/search/{isbn} - Look an identifier up in the external catalogs
#[utoipa::path(
    get,
    path = "/api/books/search/{isbn}",
    params(("isbn" = String, Path, description = "ISBN or other identifier")),
    responses(
        (status = 200, description = "Normalized catalog record", body = BookSearchResponse),
        (status = 404, description = "No catalog source had the identifier"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn search_book_handler(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.resolver.resolve(&isbn).await?;
    Ok(Json(BookSearchResponse::from(record)))
}

/// POST /api/books - Add a book to the caller's ledger
#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid input (empty isbn/title, non-positive page count)"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn create_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewBook {
        isbn: req.isbn,
        title: req.title,
        author: req.author,
        cover_image: req.cover_image,
        total_pages: req.total_pages,
        status: req.status.unwrap_or(BookStatus::WantToRead),
    };
    let book = ledger::build_book(owner_id, new, Utc::now())?;
    state.db.insert_book(&book).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /api/books - All of the caller's books, in insertion order
#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "The caller's books", body = [BookResponse]),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let books = state.db.list_books(owner_id, None).await?;
    let response: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/books/status/{status} - The caller's books filtered to one status
#[utoipa::path(
    get,
    path = "/api/books/status/{status}",
    params(("status" = String, Path, description = "want_to_read, currently_reading, or read")),
    responses(
        (status = 200, description = "Matching books", body = [BookResponse]),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn list_books_by_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Path(status): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = status
        .parse::<BookStatus>()
        .map_err(PortError::Validation)?;
    let books = state.db.list_books(owner_id, Some(status)).await?;
    let response: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/books/{id} - One of the caller's books
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = BookResponse),
        (status = 404, description = "No such book in the caller's ledger"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn get_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state.db.get_book(owner_id, book_id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// PUT /api/books/{id} - Update progress, status, notes, or rating
///
/// Concurrent updates to the same book resolve as last-write-wins at the
/// storage layer; there is no optimistic version token.
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "The updated book", body = BookResponse),
        (status = 400, description = "Page or rating out of range"),
        (status = 404, description = "No such book in the caller's ledger"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn update_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = state.db.get_book(owner_id, book_id).await?;
    let patch = BookPatch {
        current_page: req.current_page,
        status: req.status,
        date_finished: req.date_finished,
        notes: req.notes,
        rating: req.rating,
    };
    let updated = ledger::apply_patch(&book, &patch, Utc::now())?;
    state.db.update_book(&updated).await?;
    Ok(Json(BookResponse::from(updated)))
}

/// DELETE /api/books/{id} - Hard-delete a book from the caller's ledger
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = Uuid, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "No such book in the caller's ledger"),
        (status = 401, description = "Missing or expired session")
    )
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(owner_id)): Extension<AuthedUser>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.delete_book(owner_id, book_id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::response::Response;
    use booktrack_core::domain::{User, UserCredentials};
    use booktrack_core::ports::DatabaseService;
    use booktrack_core::resolver::CatalogResolver;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing::Level;

    use crate::config::Config;

    /// In-memory stand-in for the persistence port, with the same
    /// owner-scoped lookup and ordering semantics as the SQL adapter:
    /// the owner id is part of every book lookup key, and listings sort
    /// by `(date_added, id)`.
    #[derive(Default)]
    struct InMemoryDb {
        books: Mutex<Vec<Book>>,
    }

    fn book_not_found(book_id: Uuid) -> booktrack_core::ports::PortError {
        PortError::NotFound(format!("Book {} not found", book_id))
    }

    #[async_trait]
    impl DatabaseService for InMemoryDb {
        async fn create_user(
            &self,
            _email: &str,
            _name: &str,
            _password_hash: &str,
        ) -> booktrack_core::ports::PortResult<User> {
            Err(PortError::Unexpected("not exercised".to_string()))
        }

        async fn get_user_by_id(
            &self,
            user_id: Uuid,
        ) -> booktrack_core::ports::PortResult<User> {
            Err(PortError::NotFound(format!("User {} not found", user_id)))
        }

        async fn get_user_credentials_by_email(
            &self,
            _email: &str,
        ) -> booktrack_core::ports::PortResult<UserCredentials> {
            Err(PortError::NotFound("no such user".to_string()))
        }

        async fn create_auth_session(
            &self,
            _token: &str,
            _user_id: Uuid,
            _issued_at: chrono::DateTime<chrono::Utc>,
            _expires_at: chrono::DateTime<chrono::Utc>,
        ) -> booktrack_core::ports::PortResult<()> {
            Ok(())
        }

        async fn validate_auth_session(
            &self,
            _token: &str,
        ) -> booktrack_core::ports::PortResult<Uuid> {
            Err(PortError::Unauthorized)
        }

        async fn delete_auth_session(
            &self,
            _token: &str,
        ) -> booktrack_core::ports::PortResult<()> {
            Ok(())
        }

        async fn insert_book(&self, book: &Book) -> booktrack_core::ports::PortResult<()> {
            self.books.lock().unwrap().push(book.clone());
            Ok(())
        }

        async fn get_book(
            &self,
            owner_id: Uuid,
            book_id: Uuid,
        ) -> booktrack_core::ports::PortResult<Book> {
            self.books
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == book_id && b.owner_id == owner_id)
                .cloned()
                .ok_or_else(|| book_not_found(book_id))
        }

        async fn list_books(
            &self,
            owner_id: Uuid,
            status: Option<BookStatus>,
        ) -> booktrack_core::ports::PortResult<Vec<Book>> {
            let mut books: Vec<Book> = self
                .books
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.owner_id == owner_id && status.map_or(true, |s| b.status == s))
                .cloned()
                .collect();
            books.sort_by_key(|b| (b.date_added, b.id));
            Ok(books)
        }

        async fn update_book(&self, book: &Book) -> booktrack_core::ports::PortResult<()> {
            let mut books = self.books.lock().unwrap();
            match books
                .iter_mut()
                .find(|b| b.id == book.id && b.owner_id == book.owner_id)
            {
                Some(slot) => {
                    *slot = book.clone();
                    Ok(())
                }
                None => Err(book_not_found(book.id)),
            }
        }

        async fn delete_book(
            &self,
            owner_id: Uuid,
            book_id: Uuid,
        ) -> booktrack_core::ports::PortResult<()> {
            let mut books = self.books.lock().unwrap();
            let before = books.len();
            books.retain(|b| !(b.id == book_id && b.owner_id == owner_id));
            if books.len() == before {
                return Err(book_not_found(book_id));
            }
            Ok(())
        }
    }

    fn test_state(db: Arc<InMemoryDb>) -> Arc<AppState> {
        Arc::new(AppState {
            db,
            resolver: Arc::new(CatalogResolver::new(Vec::new())),
            config: Arc::new(Config {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                database_url: String::new(),
                log_level: Level::INFO,
                cors_origin: "http://localhost:3000".to_string(),
                catalog_timeout: Duration::from_secs(1),
                session_ttl_days: 30,
                finna_base_url: String::new(),
                google_books_base_url: String::new(),
                open_library_base_url: String::new(),
            }),
        })
    }

    fn create_request(title: &str) -> CreateBookRequest {
        CreateBookRequest {
            isbn: "9780439708180".to_string(),
            title: title.to_string(),
            author: "J.K. Rowling".to_string(),
            cover_image: None,
            total_pages: 320,
            status: None,
        }
    }

    fn page_patch(current_page: i32) -> UpdateBookRequest {
        UpdateBookRequest {
            current_page: Some(current_page),
            status: None,
            date_finished: None,
            notes: None,
            rating: None,
        }
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn add_book(state: &Arc<AppState>, owner: Uuid, title: &str) -> Uuid {
        let response = create_book_handler(
            State(state.clone()),
            Extension(AuthedUser(owner)),
            Json(create_request(title)),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn create_list_delete_round_trip() {
        let state = test_state(Arc::new(InMemoryDb::default()));
        let owner = Uuid::new_v4();

        let book_id = add_book(&state, owner, "Harry Potter").await;

        let listed = list_books_handler(State(state.clone()), Extension(AuthedUser(owner)))
            .await
            .unwrap()
            .into_response();
        let books = response_json(listed).await;
        let books = books.as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"].as_str().unwrap(), book_id.to_string());

        delete_book_handler(
            State(state.clone()),
            Extension(AuthedUser(owner)),
            Path(book_id),
        )
        .await
        .unwrap();

        let listed = list_books_handler(State(state), Extension(AuthedUser(owner)))
            .await
            .unwrap()
            .into_response();
        let books = response_json(listed).await;
        assert!(books.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_owner_gets_not_found_for_every_operation() {
        let db = Arc::new(InMemoryDb::default());
        let state = test_state(db);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let book_id = add_book(&state, owner, "Harry Potter").await;

        let err = get_book_handler(
            State(state.clone()),
            Extension(AuthedUser(stranger)),
            Path(book_id),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));

        let err = update_book_handler(
            State(state.clone()),
            Extension(AuthedUser(stranger)),
            Path(book_id),
            Json(page_patch(10)),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));

        let err = delete_book_handler(
            State(state.clone()),
            Extension(AuthedUser(stranger)),
            Path(book_id),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));

        // The owner's record is untouched by the failed foreign update.
        let book = state.db.get_book(owner, book_id).await.unwrap();
        assert_eq!(book.current_page, 0);
    }

    #[tokio::test]
    async fn rejected_page_update_leaves_stored_record_unchanged() {
        let state = test_state(Arc::new(InMemoryDb::default()));
        let owner = Uuid::new_v4();

        let book_id = add_book(&state, owner, "Harry Potter").await;

        let err = update_book_handler(
            State(state.clone()),
            Extension(AuthedUser(owner)),
            Path(book_id),
            Json(page_patch(321)),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ApiError::Port(PortError::Validation(_))));

        let book = state.db.get_book(owner, book_id).await.unwrap();
        assert_eq!(book.current_page, 0);
    }

    #[tokio::test]
    async fn listing_breaks_timestamp_ties_by_id() {
        let db = Arc::new(InMemoryDb::default());
        let state = test_state(db);
        let owner = Uuid::new_v4();
        let added = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let book = |id: Uuid| Book {
            id,
            owner_id: owner,
            isbn: "9780439708180".to_string(),
            title: "Same Second".to_string(),
            author: "An Author".to_string(),
            cover_image: None,
            total_pages: 100,
            current_page: 0,
            status: BookStatus::WantToRead,
            date_added: added,
            date_finished: None,
            notes: None,
            rating: None,
        };

        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        // Inserted out of id order, sharing one timestamp.
        state.db.insert_book(&book(high)).await.unwrap();
        state.db.insert_book(&book(low)).await.unwrap();

        let listed = list_books_handler(State(state), Extension(AuthedUser(owner)))
            .await
            .unwrap()
            .into_response();
        let books = response_json(listed).await;
        let ids: Vec<&str> = books
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![low.to_string(), high.to_string()]);
    }
}
