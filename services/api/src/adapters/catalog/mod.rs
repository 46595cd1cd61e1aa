//! services/api/src/adapters/catalog/mod.rs
//!
//! Catalog source adapters. Each adapter owns transport details only: URL
//! building, timeout and HTTP error mapping, and decoding one source's
//! response shape into the common `NormalizedBook`. The fallback ordering
//! lives in the core resolver, not here.
//!
//! The per-source timeout bound comes from the shared `reqwest::Client`,
//! which is built with a request timeout at startup.

pub mod finna;
pub mod google_books;
pub mod open_library;

pub use finna::FinnaSource;
pub use google_books::GoogleBooksSource;
pub use open_library::OpenLibrarySource;

use booktrack_core::ports::PortError;

pub(crate) const UNKNOWN_AUTHOR: &str = "Unknown Author";

pub(crate) fn upstream(e: reqwest::Error) -> PortError {
    PortError::Upstream(e.to_string())
}

/// Cover URLs are served to browsers, so plain-http links are upgraded.
pub(crate) fn ensure_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Extracts the first run of digits from free text, e.g. a page count out of
/// a physical description like "320 pages ; 21 cm".
pub(crate) fn first_number(text: &str) -> Option<i32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
