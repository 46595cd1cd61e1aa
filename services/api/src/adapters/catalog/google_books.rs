//! services/api/src/adapters/catalog/google_books.rs
//!
//! Catalog source backed by the Google Books volumes API. The response nests
//! everything under `items[].volumeInfo`; only the first item is considered.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use booktrack_core::domain::NormalizedBook;
use booktrack_core::ports::{CatalogSource, PortError, PortResult};

use super::{ensure_https, upstream, UNKNOWN_AUTHOR};

pub struct GoogleBooksSource {
    client: Client,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CatalogSource for GoogleBooksSource {
    fn name(&self) -> &'static str {
        "google-books"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<NormalizedBook>> {
        let url = format!("{}/books/v1/volumes", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Upstream(format!(
                "google books returned {}",
                status
            )));
        }

        let body: Value = response.json().await.map_err(upstream)?;
        Ok(normalize(isbn, &body))
    }
}

/// Maps a volumes response to the common shape. `None` when the response has
/// no items or the first item carries no title.
fn normalize(isbn: &str, body: &Value) -> Option<NormalizedBook> {
    let info = body.get("items")?.get(0)?.get("volumeInfo")?;

    let title = info.get("title")?.as_str()?.to_string();

    let author = info
        .get("authors")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let cover_image = info
        .get("imageLinks")
        .and_then(|links| links.get("thumbnail").or_else(|| links.get("smallThumbnail")))
        .and_then(Value::as_str)
        .map(ensure_https);

    let total_pages = info
        .get("pageCount")
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_a_full_volume() {
        let body = json!({
            "totalItems": 1,
            "items": [{
                "volumeInfo": {
                    "title": "Harry Potter and the Sorcerer's Stone",
                    "authors": ["J.K. Rowling"],
                    "pageCount": 320,
                    "imageLinks": {
                        "thumbnail": "http://books.google.com/thumb.jpg"
                    }
                }
            }]
        });
        let record = normalize("9780439708180", &body).unwrap();
        assert_eq!(record.title, "Harry Potter and the Sorcerer's Stone");
        assert_eq!(record.author, "J.K. Rowling");
        assert_eq!(record.total_pages, 320);
        assert_eq!(
            record.cover_image.as_deref(),
            Some("https://books.google.com/thumb.jpg")
        );
        assert_eq!(record.isbn, "9780439708180");
    }

    #[test]
    fn missing_pages_default_to_zero_sentinel() {
        let body = json!({
            "items": [{ "volumeInfo": { "title": "Untracked", "authors": ["A. Writer"] } }]
        });
        let record = normalize("123", &body).unwrap();
        assert_eq!(record.total_pages, 0);
        assert!(record.cover_image.is_none());
    }

    #[test]
    fn missing_authors_fall_back_to_unknown() {
        let body = json!({
            "items": [{ "volumeInfo": { "title": "Anonymous Work" } }]
        });
        let record = normalize("123", &body).unwrap();
        assert_eq!(record.author, "Unknown Author");
    }

    #[test]
    fn empty_result_set_is_a_miss() {
        assert!(normalize("123", &json!({ "totalItems": 0 })).is_none());
        assert!(normalize("123", &json!({ "items": [] })).is_none());
    }
}
