//! Runtime knobs for the indexing core.

use corpus_types::IndexingSettings;

#[derive(Debug, Clone)]
pub struct IndexingConfig {
    /// Records younger than this many seconds are left for a later run
    pub indexing_delay_secs: i64,
    /// Seconds between "Done to" progress lines
    pub progress_interval_secs: i64,
    /// Record queries slower than this are reported
    pub long_query_secs: f64,
    /// Lifetime of run leases
    pub lease_ttl_secs: i64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self::from(&IndexingSettings::default())
    }
}

impl From<&IndexingSettings> for IndexingConfig {
    fn from(settings: &IndexingSettings) -> Self {
        Self {
            indexing_delay_secs: settings.indexing_delay_secs as i64,
            progress_interval_secs: settings.progress_interval_secs as i64,
            long_query_secs: settings.long_query_secs as f64,
            lease_ttl_secs: settings.lease_ttl_secs as i64,
        }
    }
}

impl IndexingConfig {
    pub fn with_indexing_delay(mut self, secs: i64) -> Self {
        self.indexing_delay_secs = secs;
        self
    }

    pub fn with_progress_interval(mut self, secs: i64) -> Self {
        self.progress_interval_secs = secs;
        self
    }

    pub fn with_lease_ttl(mut self, secs: i64) -> Self {
        self.lease_ttl_secs = secs;
        self
    }
}
