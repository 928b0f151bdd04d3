//! Persisted per-area indexing cursor.

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::Timestamp;

/// Indexing state of one search area.
///
/// `last_index_run` is the cursor: every record modified at or before it
/// has been sent to the backend. Incremental runs resume strictly after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaState {
    pub enabled: bool,

    /// Wall-clock start of the most recent run (0 = never)
    #[serde(default)]
    pub indexing_start: Timestamp,

    /// Wall-clock end of the most recent run (0 = never)
    #[serde(default)]
    pub indexing_end: Timestamp,

    #[serde(default)]
    pub last_index_run: Timestamp,

    /// Most recent run stopped on its time limit before reaching the end
    #[serde(default)]
    pub partial: bool,

    #[serde(default)]
    pub records_processed: u64,

    #[serde(default)]
    pub documents_processed: u64,

    #[serde(default)]
    pub documents_skipped: u64,
}

impl AreaState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Whether the area has ever been indexed.
    pub fn has_run(&self) -> bool {
        self.last_index_run > 0 || self.indexing_end > 0
    }

    /// Duration of the most recent run in seconds.
    pub fn last_indexing_duration(&self) -> Option<i64> {
        if self.indexing_end == 0 {
            return None;
        }
        Some((self.indexing_end - self.indexing_start).max(0))
    }

    /// Clear cursor and run statistics, keeping `enabled`.
    pub fn reset(&mut self) {
        *self = Self::new(self.enabled);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CorpusError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CorpusError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_indexing_duration() {
        let mut state = AreaState::new(true);
        assert_eq!(state.last_indexing_duration(), None);
        assert!(!state.has_run());

        state.indexing_start = 100;
        state.indexing_end = 112;
        assert_eq!(state.last_indexing_duration(), Some(12));
    }

    #[test]
    fn test_reset_keeps_enabled() {
        let mut state = AreaState {
            enabled: false,
            indexing_start: 10,
            indexing_end: 20,
            last_index_run: 15,
            partial: true,
            records_processed: 3,
            documents_processed: 3,
            documents_skipped: 0,
        };
        state.reset();
        assert_eq!(state, AreaState::new(false));
    }

    #[test]
    fn test_state_bytes() {
        let state = AreaState {
            last_index_run: 1234,
            partial: true,
            ..AreaState::new(true)
        };
        let decoded = AreaState::from_bytes(&state.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, state);
    }
}
