//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FinnaSource, GoogleBooksSource, OpenLibrarySource},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, me_handler, register_handler},
        books::{
            create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
            list_books_by_status_handler, search_book_handler, update_book_handler,
        },
        middleware::require_auth,
        state::AppState,
        stats::get_stats_handler,
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use booktrack_core::{ports::CatalogSource, resolver::CatalogResolver};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Catalog Sources ---
    // One shared client; its request timeout bounds every catalog call so a
    // slow source cannot stall the fallback chain.
    let http_client = reqwest::Client::builder()
        .timeout(config.catalog_timeout)
        .user_agent("booktrack/0.1")
        .build()?;

    // Priority order: national library first, then the commercial catalog,
    // then the community catalog.
    let sources: Vec<Arc<dyn CatalogSource>> = vec![
        Arc::new(FinnaSource::new(
            http_client.clone(),
            config.finna_base_url.clone(),
        )),
        Arc::new(GoogleBooksSource::new(
            http_client.clone(),
            config.google_books_base_url.clone(),
        )),
        Arc::new(OpenLibrarySource::new(
            http_client,
            config.open_library_base_url.clone(),
        )),
    ];
    let resolver = Arc::new(CatalogResolver::new(sources));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        resolver,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route("/api/books/search/{isbn}", get(search_book_handler))
        .route("/api/books", post(create_book_handler).get(list_books_handler))
        .route("/api/books/status/{status}", get(list_books_by_status_handler))
        .route(
            "/api/books/{id}",
            get(get_book_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .route("/api/stats", get(get_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
