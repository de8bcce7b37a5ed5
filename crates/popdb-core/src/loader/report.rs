// crates/popdb-core/src/loader/report.rs
use crate::error::RowErrorKind;
use crate::traits::LoadOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Non-blank lines seen in the dump.
    pub rows_read: u64,
    /// Records committed to the catalog.
    pub loaded: u64,
    /// Rows rejected by decoding or validation.
    pub skipped: u64,
    /// Valid rows whose name was already taken.
    pub duplicates: u64,
    /// Valid rows the storage engine refused for other reasons.
    pub failed: u64,
    pub skipped_by_reason: BTreeMap<String, u64>,
}

impl IngestReport {
    pub(crate) fn record_skip(&mut self, kind: &RowErrorKind) {
        self.skipped += 1;
        *self
            .skipped_by_reason
            .entry(kind.label().to_owned())
            .or_default() += 1;
    }

    pub(crate) fn apply(&mut self, outcome: LoadOutcome) {
        self.loaded = outcome.loaded;
        self.duplicates = outcome.duplicates;
        self.failed = outcome.failed;
    }
}

impl RowErrorKind {
    /// Short, stable tag used to group skipped rows.
    pub fn label(&self) -> &'static str {
        match self {
            RowErrorKind::ColumnCount { .. } => "column_count",
            RowErrorKind::EmptyName => "empty_name",
            RowErrorKind::Unparseable { .. } => "unparseable",
            RowErrorKind::OutOfRange { .. } => "out_of_range",
            RowErrorKind::Unreadable(_) => "unreadable",
        }
    }
}
