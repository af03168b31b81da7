//! Resolution orchestrator: provider fallback, merge policy, batch pacing,
//! and direct catalog-id lookup.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::info;

use crate::catalogs::{CatalogAdapter, CatalogCandidate};
use crate::config::EnrichmentConfig;
use crate::cover_cache::CoverMaterializer;

/// Final merged output for one title query. A resolved cover is always a
/// local cache path; remote URLs never survive past materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
    pub title: String,
    pub cover_path: Option<PathBuf>,
    pub synopsis: Option<String>,
    pub status: Option<String>,
    pub rating: Option<f64>,
}

/// Sleep capability behind batch pacing, injectable for tests.
pub trait Pacer: Send + Sync {
    fn pause(&self, delay: Duration);
}

/// Default pacer: plain blocking sleep on the calling thread.
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Resolves title queries against a primary catalog with a fallback catalog,
/// materializing covers through the injected cache.
///
/// All work is sequential on the calling thread; batches are paced with
/// fixed delays to stay under third-party rate limits. There is no mid-batch
/// cancellation; a caller that needs one must check its own abort flag
/// between titles.
pub struct MetadataResolver {
    primary: Box<dyn CatalogAdapter>,
    fallback: Box<dyn CatalogAdapter>,
    covers: Box<dyn CoverMaterializer>,
    pacer: Box<dyn Pacer>,
    config: EnrichmentConfig,
}

impl MetadataResolver {
    pub fn new(
        primary: Box<dyn CatalogAdapter>,
        fallback: Box<dyn CatalogAdapter>,
        covers: Box<dyn CoverMaterializer>,
        pacer: Box<dyn Pacer>,
        config: EnrichmentConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            covers,
            pacer,
            config,
        }
    }

    /// Resolves one title. Absence means neither provider produced an
    /// acceptable candidate; it is never an error.
    pub fn resolve(&self, query: &str) -> Option<ResolvedMetadata> {
        let candidate = self.merged_candidate(query)?;
        Some(self.finish(query, candidate, false))
    }

    /// Resolves a list of titles in fixed-size groups, pausing between
    /// consecutive titles and longer between groups. Input order is
    /// preserved in the returned pairs.
    pub fn resolve_batch(&self, titles: &[String]) -> Vec<(String, Option<ResolvedMetadata>)> {
        let group_size = self.config.batch_group_size.max(1);
        let group_count = titles.len().div_ceil(group_size);
        let mut results = Vec::with_capacity(titles.len());
        for (index, title) in titles.iter().enumerate() {
            if index > 0 {
                if index % group_size == 0 {
                    info!(
                        "Metadata: waiting {}ms before next group",
                        self.config.inter_group_delay_ms
                    );
                    self.pacer
                        .pause(Duration::from_millis(self.config.inter_group_delay_ms));
                } else {
                    self.pacer
                        .pause(Duration::from_millis(self.config.intra_group_delay_ms));
                }
            }
            if index % group_size == 0 {
                info!(
                    "Metadata: processing group {}/{}",
                    index / group_size + 1,
                    group_count
                );
            }
            results.push((title.clone(), self.resolve(title)));
        }
        results
    }

    /// Resolves one record by caller-supplied catalog id or catalog URL.
    /// This is the manual correction path, so a resolved cover always
    /// bypasses the cache short-circuit and overwrites the stored copy.
    ///
    /// A missing or unrecognizable id is rejected synchronously; provider
    /// absence stays a best-effort `None`.
    pub fn resolve_by_external_id(
        &self,
        reference: &str,
    ) -> Result<Option<ResolvedMetadata>, String> {
        let id = extract_catalog_id(reference)?;
        info!(
            "Metadata[{id}]: direct lookup on {}",
            self.primary.source_name()
        );
        let Some(candidate) = self.primary.fetch_by_id(&id) else {
            return Ok(None);
        };
        Ok(Some(self.finish(&id, candidate, true)))
    }

    fn merged_candidate(&self, query: &str) -> Option<CatalogCandidate> {
        info!(
            "Metadata[{query}]: searching {}",
            self.primary.source_name()
        );
        let primary = self.primary.search_title(query);
        let complete = primary
            .as_ref()
            .is_some_and(|candidate| candidate.cover_url.is_some());
        if complete {
            return primary;
        }
        info!(
            "Metadata[{query}]: consulting {}",
            self.fallback.source_name()
        );
        let fallback = self.fallback.search_title(query);
        merge_candidates(primary, fallback)
    }

    fn finish(&self, label: &str, candidate: CatalogCandidate, force_cover: bool) -> ResolvedMetadata {
        let cover_path = candidate
            .cover_url
            .as_deref()
            .and_then(|url| self.covers.materialize(url, label, force_cover));
        ResolvedMetadata {
            title: candidate.title,
            cover_path,
            synopsis: candidate.synopsis,
            status: candidate.status,
            rating: candidate.rating,
        }
    }
}

/// Merges the two providers' candidates. The primary's fields always win;
/// the fallback only fills a missing cover and a missing synopsis.
fn merge_candidates(
    primary: Option<CatalogCandidate>,
    fallback: Option<CatalogCandidate>,
) -> Option<CatalogCandidate> {
    match (primary, fallback) {
        (Some(mut primary), Some(fallback)) => {
            if primary.cover_url.is_none() {
                primary.cover_url = fallback.cover_url;
            }
            if primary.synopsis.is_none() {
                primary.synopsis = fallback.synopsis;
            }
            Some(primary)
        }
        (Some(primary), None) => Some(primary),
        (None, fallback) => fallback,
    }
}

/// Accepts a bare catalog id or a catalog URL containing a `/title/<id>`
/// segment and returns the id.
fn extract_catalog_id(reference: &str) -> Result<String, String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err("catalog id is required".to_string());
    }
    if let Some((_, rest)) = trimmed.split_once("/title/") {
        let id = rest.split(['/', '?', '#']).next().unwrap_or("");
        if id.is_empty() {
            return Err(format!("no catalog id in '{trimmed}'"));
        }
        return Ok(id.to_string());
    }
    if trimmed.contains("://") {
        return Err(format!("unrecognized catalog link '{trimmed}'"));
    }
    Ok(trimmed.to_string())
}
