//! crates/booktrack_core/src/resolver.rs
//!
//! The catalog fallback chain: an ordered list of `CatalogSource`s tried in
//! priority order until one yields a usable record. First success wins; no
//! field merging across sources.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::NormalizedBook;
use crate::ports::{CatalogSource, PortError, PortResult};

/// Resolves an identifier against external catalogs in a fixed priority order.
///
/// Source failures (network, HTTP, parse) and misses are both treated as
/// "continue to the next source"; an individual upstream error is never
/// surfaced to the caller. Only exhausting every source produces an error,
/// and that error is `NotFound`.
pub struct CatalogResolver {
    sources: Vec<Arc<dyn CatalogSource>>,
}

impl CatalogResolver {
    /// Builds a resolver from sources in descending priority order.
    pub fn new(sources: Vec<Arc<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    /// Looks up an identifier, returning the first usable normalized record.
    ///
    /// A record is usable when it carries a non-empty title; anything less is
    /// treated as a miss for that source.
    pub async fn resolve(&self, identifier: &str) -> PortResult<NormalizedBook> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(PortError::Validation(
                "identifier must not be empty".to_string(),
            ));
        }

        for source in &self.sources {
            match source.lookup(identifier).await {
                Ok(Some(record)) if !record.title.trim().is_empty() => {
                    debug!(source = source.name(), identifier, "catalog hit");
                    return Ok(record);
                }
                Ok(_) => {
                    debug!(source = source.name(), identifier, "catalog miss");
                }
                Err(e) => {
                    warn!(
                        source = source.name(),
                        identifier,
                        error = %e,
                        "catalog source failed, trying next"
                    );
                }
            }
        }

        Err(PortError::NotFound(format!(
            "no catalog source had a record for '{}'",
            identifier
        )))
    }
}
