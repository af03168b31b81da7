//! Catalog adapter abstractions and concrete provider implementations.

pub mod kitsu;
pub mod mangadex;

/// One provider's proposed match for a title query, prior to merging.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogCandidate {
    pub title: String,
    pub cover_url: Option<String>,
    pub synopsis: Option<String>,
    pub status: Option<String>,
    pub rating: Option<f64>,
}

/// Interface implemented by concrete catalog adapters.
///
/// Both operations are best-effort: transport failures, error statuses, and
/// malformed payloads collapse to `None` inside the adapter and are logged,
/// never raised to the caller.
pub trait CatalogAdapter: Send + Sync {
    fn source_name(&self) -> &'static str;
    /// Searches the catalog and returns its best candidate for the query.
    fn search_title(&self, query: &str) -> Option<CatalogCandidate>;
    /// Fetches one record by catalog id, for manual correction flows.
    fn fetch_by_id(&self, id: &str) -> Option<CatalogCandidate>;
}

/// Trimmed, non-empty copy of an optional JSON string field.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
