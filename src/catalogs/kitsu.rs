//! Kitsu catalog adapter: unscored fallback search.

use log::{info, warn};
use serde_json::Value;

use crate::catalogs::{non_empty, CatalogAdapter, CatalogCandidate};
use crate::http_fetch::HttpFetcher;

const API_BASE: &str = "https://kitsu.io/api/edge";

/// Fallback catalog adapter backed by `ureq`.
pub struct KitsuAdapter {
    fetcher: HttpFetcher,
}

impl KitsuAdapter {
    pub fn new() -> Self {
        Self {
            fetcher: HttpFetcher::new(),
        }
    }

    fn poster_url(attributes: &Value) -> Option<String> {
        non_empty(attributes["posterImage"]["large"].as_str())
            .or_else(|| non_empty(attributes["posterImage"]["medium"].as_str()))
    }

    fn candidate_from_entry(entry: &Value) -> Option<CatalogCandidate> {
        let attributes = &entry["attributes"];
        let title = non_empty(attributes["canonicalTitle"].as_str())?;
        Some(CatalogCandidate {
            title,
            cover_url: Self::poster_url(attributes),
            synopsis: non_empty(attributes["synopsis"].as_str()),
            status: non_empty(attributes["status"].as_str()),
            rating: attributes["averageRating"]
                .as_str()
                .and_then(|value| value.trim().parse().ok()),
        })
    }
}

impl Default for KitsuAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogAdapter for KitsuAdapter {
    fn source_name(&self) -> &'static str {
        "Kitsu"
    }

    fn search_title(&self, query: &str) -> Option<CatalogCandidate> {
        let url = format!(
            "{API_BASE}/manga?filter[text]={}",
            urlencoding::encode(query)
        );
        let payload = match self.fetcher.get_json(&url) {
            Ok(payload) => payload,
            Err(reason) => {
                warn!("Kitsu[{query}]: search failed: {reason}");
                return None;
            }
        };
        // The first result is the provider's own best match; no rescoring.
        let Some(entry) = payload["data"].as_array().and_then(|entries| entries.first()) else {
            info!("Kitsu[{query}]: no results");
            return None;
        };
        Self::candidate_from_entry(entry)
    }

    /// Direct id lookup is a primary-catalog operation; Kitsu is only ever
    /// consulted as a search fallback.
    fn fetch_by_id(&self, _id: &str) -> Option<CatalogCandidate> {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::KitsuAdapter;

    #[test]
    fn test_candidate_prefers_large_poster() {
        let entry = json!({
            "id": "42",
            "attributes": {
                "canonicalTitle": "Vinland Saga",
                "synopsis": "A tale of the north sea.",
                "posterImage": { "large": "https://kitsu.example/l.jpg", "medium": "https://kitsu.example/m.jpg" },
                "averageRating": "82.47",
                "status": "finished"
            }
        });
        let candidate =
            KitsuAdapter::candidate_from_entry(&entry).expect("entry should parse");
        assert_eq!(candidate.title, "Vinland Saga");
        assert_eq!(candidate.cover_url.as_deref(), Some("https://kitsu.example/l.jpg"));
        assert_eq!(candidate.synopsis.as_deref(), Some("A tale of the north sea."));
        assert_eq!(candidate.status.as_deref(), Some("finished"));
        assert_eq!(candidate.rating, Some(82.47));
    }

    #[test]
    fn test_candidate_falls_back_to_medium_poster() {
        let entry = json!({
            "id": "42",
            "attributes": {
                "canonicalTitle": "Vinland Saga",
                "posterImage": { "medium": "https://kitsu.example/m.jpg" }
            }
        });
        let candidate =
            KitsuAdapter::candidate_from_entry(&entry).expect("entry should parse");
        assert_eq!(candidate.cover_url.as_deref(), Some("https://kitsu.example/m.jpg"));
        assert_eq!(candidate.rating, None);
    }

    #[test]
    fn test_candidate_requires_canonical_title() {
        let entry = json!({ "id": "42", "attributes": { "synopsis": "No title here." } });
        assert!(KitsuAdapter::candidate_from_entry(&entry).is_none());
    }

    #[test]
    fn test_unparseable_rating_is_dropped() {
        let entry = json!({
            "id": "42",
            "attributes": { "canonicalTitle": "Vinland Saga", "averageRating": "n/a" }
        });
        let candidate =
            KitsuAdapter::candidate_from_entry(&entry).expect("entry should parse");
        assert_eq!(candidate.rating, None);
    }
}
