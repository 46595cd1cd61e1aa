//! services/api/src/adapters/catalog/finna.rs
//!
//! Catalog source backed by the Finna search API, the national library
//! aggregate for Finnish collections. Queried first so domestic-language
//! editions resolve against the domestic catalog. Page counts arrive as
//! free-text physical descriptions ("320 sivua") and cover links are
//! site-relative paths.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use booktrack_core::domain::NormalizedBook;
use booktrack_core::ports::{CatalogSource, PortError, PortResult};

use super::{first_number, upstream, UNKNOWN_AUTHOR};

pub struct FinnaSource {
    client: Client,
    base_url: String,
}

impl FinnaSource {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl CatalogSource for FinnaSource {
    fn name(&self) -> &'static str {
        "finna"
    }

    async fn lookup(&self, isbn: &str) -> PortResult<Option<NormalizedBook>> {
        let url = format!("{}/v1/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lookfor", isbn),
                ("type", "ISN"),
                ("field[]", "title"),
                ("field[]", "nonPresenterAuthors"),
                ("field[]", "images"),
                ("field[]", "physicalDescriptions"),
            ])
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Upstream(format!("finna returned {}", status)));
        }

        let body: Value = response.json().await.map_err(upstream)?;
        Ok(normalize(isbn, &body, &self.base_url))
    }
}

/// Maps a Finna search response to the common shape. `None` when there are
/// no records or the first record carries no title.
fn normalize(isbn: &str, body: &Value, base_url: &str) -> Option<NormalizedBook> {
    let record = body.get("records")?.get(0)?;

    let title = record.get("title")?.as_str()?.to_string();

    let author = record
        .get("nonPresenterAuthors")
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

    // Image links are relative to the Finna host.
    let cover_image = record
        .get("images")
        .and_then(Value::as_array)
        .and_then(|images| images.first())
        .and_then(Value::as_str)
        .map(|path| {
            if path.starts_with("http") {
                path.to_string()
            } else {
                format!("{}{}", base_url, path)
            }
        });

    let total_pages = record
        .get("physicalDescriptions")
        .and_then(Value::as_array)
        .and_then(|descriptions| descriptions.first())
        .and_then(Value::as_str)
        .and_then(first_number)
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
    fn normalizes_a_search_record() {
        let body = json!({
            "resultCount": 1,
            "records": [{
                "title": "Sinuhe egyptiläinen",
                "nonPresenterAuthors": [{ "name": "Waltari, Mika" }],
                "images": ["/Cover/Show?source=Solr&id=abc"],
                "physicalDescriptions": ["779 sivua ; 21 cm"]
            }]
        });
        let record = normalize("9789510448335", &body, "https://api.finna.fi").unwrap();
        assert_eq!(record.title, "Sinuhe egyptiläinen");
        assert_eq!(record.author, "Waltari, Mika");
        assert_eq!(record.total_pages, 779);
        assert_eq!(
            record.cover_image.as_deref(),
            Some("https://api.finna.fi/Cover/Show?source=Solr&id=abc")
        );
    }

    #[test]
    fn unpaged_descriptions_yield_the_zero_sentinel() {
        let body = json!({
            "records": [{
                "title": "Kuvakirja",
                "physicalDescriptions": ["unpaged"]
            }]
        });
        let record = normalize("1", &body, "https://api.finna.fi").unwrap();
        assert_eq!(record.total_pages, 0);
        assert_eq!(record.author, "Unknown Author");
        assert!(record.cover_image.is_none());
    }

    #[test]
    fn no_records_is_a_miss() {
        let body = json!({ "resultCount": 0, "records": [] });
        assert!(normalize("1", &body, "https://api.finna.fi").is_none());
    }
}
