//! MangaDex catalog adapter: scored title search and direct id lookup.

use log::{info, warn};
use serde_json::Value;

use crate::catalogs::{non_empty, CatalogAdapter, CatalogCandidate};
use crate::http_fetch::HttpFetcher;
use crate::similarity;

const API_BASE: &str = "https://api.mangadex.org";
const COVER_HOST: &str = "https://uploads.mangadex.org/covers";
const SEARCH_LIMIT: usize = 5;
/// Minimum similarity the best search candidate must reach to be accepted.
const MIN_ACCEPT_SCORE: f64 = 0.60;

/// Primary catalog adapter backed by `ureq`.
pub struct MangaDexAdapter {
    fetcher: HttpFetcher,
}

impl MangaDexAdapter {
    pub fn new() -> Self {
        Self {
            fetcher: HttpFetcher::new(),
        }
    }

    /// Display title for one record: English, then Japanese, then the first
    /// remaining title value.
    fn display_title(entry: &Value) -> Option<String> {
        let titles = &entry["attributes"]["title"];
        for language in ["en", "ja"] {
            if let Some(title) = non_empty(titles[language].as_str()) {
                return Some(title);
            }
        }
        titles
            .as_object()?
            .values()
            .find_map(|value| non_empty(value.as_str()))
    }

    /// Cover URL assembled from the record's `cover_art` relationship and the
    /// upload host's `<manga-id>/<file-name>` convention.
    fn cover_url(entry: &Value) -> Option<String> {
        let manga_id = entry["id"].as_str()?;
        let cover = entry["relationships"]
            .as_array()?
            .iter()
            .find(|relation| relation["type"].as_str() == Some("cover_art"))?;
        let file_name = non_empty(cover["attributes"]["fileName"].as_str())?;
        Some(format!("{COVER_HOST}/{manga_id}/{file_name}"))
    }

    fn candidate_from_entry(entry: &Value, title: String) -> CatalogCandidate {
        CatalogCandidate {
            title,
            cover_url: Self::cover_url(entry),
            synopsis: non_empty(entry["attributes"]["description"]["en"].as_str()),
            status: non_empty(entry["attributes"]["status"].as_str()),
            rating: None,
        }
    }

    /// Picks the highest-scoring entry for the query, or `None` when even the
    /// best one stays below the acceptance threshold.
    fn select_candidate(query: &str, entries: &[Value]) -> Option<CatalogCandidate> {
        let mut best: Option<(f64, &Value, String)> = None;
        for entry in entries {
            let title = Self::display_title(entry).unwrap_or_else(|| query.to_string());
            let score = similarity::score(query, &title);
            let improves = best
                .as_ref()
                .map_or(true, |(best_score, _, _)| score > *best_score);
            if improves {
                best = Some((score, entry, title));
            }
        }
        let (score, entry, title) = best?;
        if score < MIN_ACCEPT_SCORE {
            info!("MangaDex[{query}]: best candidate '{title}' scored {score:.2}, discarding");
            return None;
        }
        Some(Self::candidate_from_entry(entry, title))
    }
}

impl Default for MangaDexAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogAdapter for MangaDexAdapter {
    fn source_name(&self) -> &'static str {
        "MangaDex"
    }

    fn search_title(&self, query: &str) -> Option<CatalogCandidate> {
        let url = format!(
            "{API_BASE}/manga?title={}&limit={SEARCH_LIMIT}&includes[]=cover_art",
            urlencoding::encode(query)
        );
        let payload = match self.fetcher.get_json(&url) {
            Ok(payload) => payload,
            Err(reason) => {
                warn!("MangaDex[{query}]: search failed: {reason}");
                return None;
            }
        };
        let Some(entries) = payload["data"].as_array() else {
            warn!("MangaDex[{query}]: search response missing data array");
            return None;
        };
        if entries.is_empty() {
            info!("MangaDex[{query}]: no results");
            return None;
        }
        Self::select_candidate(query, entries)
    }

    fn fetch_by_id(&self, id: &str) -> Option<CatalogCandidate> {
        let url = format!(
            "{API_BASE}/manga/{}?includes[]=cover_art",
            urlencoding::encode(id)
        );
        let payload = match self.fetcher.get_json(&url) {
            Ok(payload) => payload,
            Err(reason) => {
                warn!("MangaDex[{id}]: lookup failed: {reason}");
                return None;
            }
        };
        let entry = &payload["data"];
        if !entry.is_object() {
            warn!("MangaDex[{id}]: lookup response missing record");
            return None;
        }
        let Some(title) = Self::display_title(entry) else {
            warn!("MangaDex[{id}]: record has no usable title");
            return None;
        };
        Some(Self::candidate_from_entry(entry, title))
    }
}
