// crates/popdb-core/src/loader/mod.rs

//! # Data Loader
//!
//! Streams a gazetteer dump into a [`Catalog`]. The pipeline is lazy end to
//! end:
//!
//! 1. [`DumpReader`] produces one decoded row per line (the physical layer,
//!    with optional gzip via [`open_stream`]).
//! 2. [`valid_records`] is the skip stage: rejected rows are logged, tallied
//!    and dropped; fatal read errors pass through.
//! 3. [`Catalog::bulk_load`] writes what is left inside one transaction.

mod common_io;
mod report;

pub use common_io::open_stream;
pub use report::IngestReport;

use crate::error::{PopDbError, Result, RowError, RowErrorKind};
use crate::model::PlaceRecord;
use crate::raw;
use crate::traits::Catalog;
use std::io::{BufRead, ErrorKind};
use std::path::Path;
use tracing::{info, warn};

/// A dump line after decoding: a record, or the reason it was rejected.
pub type DecodedRow = std::result::Result<PlaceRecord, RowError>;

/// Lazily decodes a dump, one line at a time.
///
/// Yields `Err` only for failures of the underlying reader, after which it
/// stops. Blank lines are ignored.
pub struct DumpReader<R> {
    reader: R,
    line: u64,
    buf: Vec<u8>,
    failed: bool,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: Vec::new(),
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<DecodedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let bytes = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
                    if bytes.is_empty() {
                        continue;
                    }
                    let decoded = match std::str::from_utf8(bytes) {
                        Ok(text) => raw::decode_line(text),
                        Err(e) => Err(RowErrorKind::Unreadable(e.to_string())),
                    };
                    let line = self.line;
                    return Some(Ok(decoded.map_err(|kind| RowError { line, kind })));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(PopDbError::SourceUnavailable(format!(
                        "read failed after line {}: {e}",
                        self.line
                    ))));
                }
            }
        }
    }
}

/// The skip stage: keeps valid records, logs and tallies rejected rows.
pub fn valid_records<'a, I>(
    rows: I,
    report: &'a mut IngestReport,
) -> impl Iterator<Item = Result<PlaceRecord>> + 'a
where
    I: Iterator<Item = Result<DecodedRow>> + 'a,
{
    rows.filter_map(move |row| match row {
        Ok(Ok(record)) => {
            report.rows_read += 1;
            Some(Ok(record))
        }
        Ok(Err(rejected)) => {
            report.rows_read += 1;
            warn!(line = rejected.line, reason = %rejected.kind, "skipping dump row");
            report.record_skip(&rejected.kind);
            None
        }
        Err(fatal) => Some(Err(fatal)),
    })
}

/// Loads a dump from any buffered reader into `catalog`.
///
/// The schema must already exist. Returns only after the load transaction
/// has committed.
pub fn ingest_reader<R: BufRead>(catalog: &dyn Catalog, reader: R) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let outcome = {
        let mut records = valid_records(DumpReader::new(reader), &mut report);
        catalog.bulk_load(&mut records)?
    };
    report.apply(outcome);
    info!(
        rows = report.rows_read,
        loaded = report.loaded,
        skipped = report.skipped,
        duplicates = report.duplicates,
        failed = report.failed,
        "gazetteer load committed"
    );
    Ok(report)
}

/// Opens `path` (gzip-aware) and loads it into `catalog`.
pub fn ingest_path(catalog: &dyn Catalog, path: impl AsRef<Path>) -> Result<IngestReport> {
    let path = path.as_ref();
    info!(source = %path.display(), "loading gazetteer dump");
    let reader = open_stream(path)?;
    ingest_reader(catalog, reader)
}
