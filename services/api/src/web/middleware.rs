//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::web::state::AppState;

/// The authenticated caller, injected into request extensions by `require_auth`.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub Uuid);

/// Name of the cookie carrying the bearer session token.
pub const SESSION_COOKIE: &str = "session";

/// Pulls the session token out of the Cookie header, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|c| {
        let c = c.trim();
        c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
    })
}

/// Middleware that validates the auth session cookie and extracts the user id.
///
/// If valid, inserts an [`AuthedUser`] into request extensions for handlers to
/// use. If invalid, missing, or expired, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state
        .db
        .validate_auth_session(token)
        .await
        .map_err(|e| {
            debug!("session validation failed: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(AuthedUser(user_id));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn finds_the_session_cookie_among_others() {
        let headers = headers("theme=dark; session=abc-123; locale=fi");
        assert_eq!(session_token(&headers), Some("abc-123"));
    }

    #[test]
    fn missing_cookie_header_is_none() {
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn other_cookies_do_not_match() {
        let headers = headers("sessionx=evil; mysession=other");
        assert_eq!(session_token(&headers), None);
    }
}
