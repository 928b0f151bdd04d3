//! The search area capability set.

use corpus_types::{AreaId, AreaRecord, ContextInfo, ContextLevel, Document, Timestamp};

use crate::error::AreaError;

/// Lazy record sequence, ascending by `modified`.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<AreaRecord, AreaError>> + 'a>;

/// A pluggable source of indexable content.
///
/// Implementations are registered once at startup in an
/// [`AreaRegistry`](crate::AreaRegistry); the indexer only talks to them
/// through this trait.
pub trait SearchArea: Send + Sync {
    fn id(&self) -> &AreaId;

    /// Human-readable name used in progress output.
    fn visible_name(&self) -> &str;

    /// Context levels this area produces documents at.
    fn context_levels(&self) -> &[ContextLevel];

    /// Enabled state for an area seen for the first time.
    fn default_enabled(&self) -> bool {
        true
    }

    /// Whether documents of this area can live in the subtree of `context`.
    fn applies_to(&self, context: &ContextInfo) -> bool {
        self.context_levels()
            .iter()
            .any(|level| context.level.may_contain(*level))
    }

    /// Records modified at or after `since`, ascending by modification time.
    ///
    /// With a `restriction`, only records inside that context's subtree are
    /// returned, and `Ok(None)` means the area is not relevant there at all.
    fn document_recordset(
        &self,
        since: Timestamp,
        restriction: Option<&ContextInfo>,
    ) -> Result<Option<RecordStream<'_>>, AreaError>;

    /// Build the document for a record; `Ok(None)` means the record
    /// intentionally produces no document.
    fn build_document(&self, record: &AreaRecord) -> Result<Option<Document>, AreaError>;
}
