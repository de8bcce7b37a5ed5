// crates/popdb-core/src/loader/common_io.rs
use crate::error::{PopDbError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::read::MultiGzDecoder;

/// Opens a dump for streaming. `.gz` files are decompressed on the fly.
pub fn open_stream(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| {
        PopDbError::SourceUnavailable(format!(
            "cannot open gazetteer dump {}: {}",
            path.display(),
            e
        ))
    })?;

    let reader = BufReader::new(file);

    if !is_gzip(path) {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "compact")]
    {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(PopDbError::SourceUnavailable(format!(
            "{} is gzip-compressed but the 'compact' feature is disabled",
            path.display()
        )))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
