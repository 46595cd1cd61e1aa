//! services/api/src/web/mod.rs
//!
//! The web layer: handlers, auth middleware, shared state, and the master
//! OpenAPI definition.

pub mod auth;
pub mod books;
pub mod middleware;
pub mod state;
pub mod stats;

pub use middleware::require_auth;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        books::search_book_handler,
        books::create_book_handler,
        books::list_books_handler,
        books::list_books_by_status_handler,
        books::get_book_handler,
        books::update_book_handler,
        books::delete_book_handler,
        stats::get_stats_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserResponse,
            books::BookSearchResponse,
            books::CreateBookRequest,
            books::UpdateBookRequest,
            books::BookResponse,
            stats::StatsResponse,
        )
    ),
    tags(
        (name = "booktrack API", description = "Personal book-reading tracker: catalog lookup, ledger, and statistics.")
    )
)]
pub struct ApiDoc;
