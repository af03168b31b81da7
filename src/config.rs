//! Persistent application configuration model and defaults.

/// Root configuration persisted to `paneldex.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Metadata enrichment pacing and cache locations.
    pub enrichment: EnrichmentConfig,
}

/// Batch pacing and cover-cache preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EnrichmentConfig {
    /// Titles resolved per group before the longer inter-group pause.
    #[serde(default = "default_batch_group_size")]
    pub batch_group_size: usize,
    /// Pause between consecutive titles inside one group, in milliseconds.
    #[serde(default = "default_intra_group_delay_ms")]
    pub intra_group_delay_ms: u64,
    /// Pause between groups, in milliseconds. Must stay longer than the
    /// intra-group pause; the sanitize pass enforces it.
    #[serde(default = "default_inter_group_delay_ms")]
    pub inter_group_delay_ms: u64,
    /// Override for the cover cache directory; the user cache dir when unset.
    #[serde(default)]
    pub cover_cache_dir: Option<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_group_size: default_batch_group_size(),
            intra_group_delay_ms: default_intra_group_delay_ms(),
            inter_group_delay_ms: default_inter_group_delay_ms(),
            cover_cache_dir: None,
        }
    }
}

fn default_batch_group_size() -> usize {
    3
}

fn default_intra_group_delay_ms() -> u64 {
    500
}

fn default_inter_group_delay_ms() -> u64 {
    2000
}

/// Clamps loaded values into a usable range without failing startup.
pub fn sanitize_config(mut config: Config) -> Config {
    let enrichment = &mut config.enrichment;
    enrichment.batch_group_size = enrichment.batch_group_size.max(1);
    if enrichment.inter_group_delay_ms <= enrichment.intra_group_delay_ms {
        enrichment.inter_group_delay_ms = enrichment.intra_group_delay_ms.saturating_add(1);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::{sanitize_config, Config, EnrichmentConfig};

    #[test]
    fn test_default_config_roundtrips_through_toml() {
        let serialized = toml::to_string(&Config::default()).expect("defaults serialize");
        let parsed: Config = toml::from_str(&serialized).expect("defaults parse back");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[enrichment]\nbatch_group_size = 5\n")
            .expect("partial config parses");
        assert_eq!(parsed.enrichment.batch_group_size, 5);
        assert_eq!(parsed.enrichment.intra_group_delay_ms, 500);
        assert_eq!(parsed.enrichment.inter_group_delay_ms, 2000);
    }

    #[test]
    fn test_sanitize_clamps_group_size() {
        let config = Config {
            enrichment: EnrichmentConfig {
                batch_group_size: 0,
                ..EnrichmentConfig::default()
            },
        };
        assert_eq!(sanitize_config(config).enrichment.batch_group_size, 1);
    }

    #[test]
    fn test_sanitize_keeps_inter_group_delay_longer() {
        let config = Config {
            enrichment: EnrichmentConfig {
                intra_group_delay_ms: 800,
                inter_group_delay_ms: 400,
                ..EnrichmentConfig::default()
            },
        };
        let sanitized = sanitize_config(config);
        assert!(
            sanitized.enrichment.inter_group_delay_ms > sanitized.enrichment.intra_group_delay_ms
        );
    }
}
