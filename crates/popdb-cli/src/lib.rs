//! popdb-cli
//! =========
//!
//! Command-line interface and HTTP endpoint for the `popdb-core` population
//! catalog.
//!
//! This crate primarily provides a binary (`popdb`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! popdb ingest allCountries.txt.gz
//! popdb population Berlin 25
//! popdb serve --listen 127.0.0.1:8080
//! curl 'http://127.0.0.1:8080/population?place=Berlin&radius=25'
//! ```
//!
//! For programmatic access use the [`popdb-core`] crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

// This library target intentionally exposes no API; the binary is the primary
// deliverable. The presence of this file enables a rendered page on docs.rs.
