//! services/api/src/adapters/catalog/open_library.rs
//!
//! Catalog source backed by the Open Library books API. The response is an
//! object keyed by `ISBN:<identifier>`, with author objects and a cover map
//! offering several sizes.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use booktrack_core::domain::NormalizedBook;
use booktrack_core::ports::{CatalogSource, PortError, PortResult};

use super::{ensure_https, upstream, UNKNOWN_AUTHOR};

pub struct OpenLibrarySource {
    client: Client,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CatalogSource for OpenLibrarySource {
    fn name(&self) -> &'static str {
        "open-library"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<NormalizedBook>> {
        let url = format!("{}/api/books", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("bibkeys", format!("ISBN:{}", isbn)),
                ("jscmd", "data".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "open library returned {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(upstream)?;
        Ok(normalize(isbn, &body))
    }
}

/// Maps an Open Library `data` response to the common shape. `None` when the
/// bibkey is absent or carries no title.
fn normalize(isbn: &str, body: &Value) -> Option<NormalizedBook> {
    let record = body.get(format!("ISBN:{}", isbn))?;

    let title = record.get("title")?.as_str()?.to_string();

    let author = record
        .get("authors")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    // Prefer the large cover, falling back to medium.
    let cover_image = record
        .get("cover")
        .and_then(|cover| cover.get("large").or_else(|| cover.get("medium")))
        .and_then(Value::as_str)
        .map(ensure_https);

    let total_pages = record
        .get("number_of_pages")
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0);

    Some(NormalizedBook {
        isbn: isbn.to_string(),
        title,
        author,
        cover_image,
        total_pages,
    })
}
