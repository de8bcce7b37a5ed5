//! popdb — Command-line interface for popdb-core
//!
//! This binary loads a GeoNames-style gazetteer dump into a SQLite catalog
//! and answers "how many people live within R km of P?" from the terminal
//! or over HTTP.
//!
//! Usage examples
//! --------------
//!
//! - Load a dump (plain or gzip-compressed)
//!   $ popdb ingest allCountries.txt.gz
//!   $ popdb --database cities.sqlite ingest cities500.txt --rebuild
//!
//! - Estimate the population around a place
//!   $ popdb population Berlin 25
//!   $ popdb population Berlin 25 --json
//!
//! - Show what is in the catalog
//!   $ popdb stats
//!
//! - Serve `GET /population?place=..&radius=..`
//!   $ popdb serve --listen 0.0.0.0:8080
//!
//! Configuration
//! -------------
//!
//! `--database`, `--listen` and `--query-timeout-ms` fall back to
//! `POPDB_DATABASE`, `POPDB_LISTEN` and `POPDB_QUERY_TIMEOUT_MS`. Log
//! verbosity follows `RUST_LOG` (default `info`); logs go to stderr.
mod args;
mod server;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use popdb_core::loader::ingest_path;
use popdb_core::{Catalog, PopDbError, PopulationSearch, RadiusQuery, SqliteCatalog};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let catalog = SqliteCatalog::open(&args.database)
        .with_context(|| format!("cannot open catalog {}", args.database.display()))?;

    match args.command {
        Commands::Ingest {
            dump,
            rebuild,
            json,
        } => {
            let report = load(&catalog, &dump, rebuild)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Loaded {} places from {}", report.loaded, dump.display());
                println!("  Rows read: {}", report.rows_read);
                println!("  Skipped: {}", report.skipped);
                for (reason, count) in &report.skipped_by_reason {
                    println!("    {reason}: {count}");
                }
                println!("  Duplicate names: {}", report.duplicates);
                println!("  Rejected by storage: {}", report.failed);
            }
        }

        Commands::Population {
            place,
            radius,
            json,
        } => {
            let query = RadiusQuery::parse(Some(place.as_str()), Some(radius.as_str()))?;
            let estimate = catalog.estimate(&query)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                println!(
                    "Population within {} km of {}: {}",
                    estimate.radius_km, estimate.place, estimate.population
                );
                println!(
                    "  Center: {}, {}",
                    estimate.center.latitude, estimate.center.longitude
                );
                println!("  Places counted: {}", estimate.matched);
            }
        }

        Commands::Stats => {
            let stats = catalog.stats()?;
            println!("Catalog statistics:");
            println!("  Places: {}", stats.places);
            println!("  Total population: {}", stats.total_population);
        }

        Commands::Serve {
            listen,
            query_timeout_ms,
            load: dump,
        } => {
            if let Some(dump) = dump {
                load(&catalog, &dump, true)?;
            }
            let catalog: Arc<dyn Catalog> = Arc::new(catalog);
            tokio::runtime::Runtime::new()?.block_on(server::serve(
                catalog,
                listen,
                Duration::from_millis(query_timeout_ms),
            ))?;
        }
    }

    Ok(())
}

/// Creates the schema (dropping it first on `rebuild`) and loads `dump`.
///
/// An existing schema is not fatal here: the load appends, and names already
/// in the catalog count as duplicates.
fn load(
    catalog: &SqliteCatalog,
    dump: &Path,
    rebuild: bool,
) -> anyhow::Result<popdb_core::loader::IngestReport> {
    if rebuild {
        catalog.drop_schema()?;
    }
    match catalog.create_schema() {
        Ok(()) => {}
        Err(PopDbError::Schema(reason)) => {
            warn!(%reason, "catalog schema already present, appending");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(ingest_path(catalog, dump)?)
}
