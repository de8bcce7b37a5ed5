//! Basic usage example for popdb-rs
//!
//! This example demonstrates how to:
//! - Create a catalog and its schema
//! - Stream a tab-separated gazetteer dump into it
//! - Estimate the population around a place

use popdb_rs::prelude::*;
use popdb_rs::raw::{DUMP_COLUMNS, LATITUDE_COLUMN, LONGITUDE_COLUMN, NAME_COLUMN, POPULATION_COLUMN};
use std::io::Cursor;

fn line(name: &str, lat: f64, lon: f64, population: u64) -> String {
    let mut fields = vec![String::new(); DUMP_COLUMNS];
    fields[NAME_COLUMN] = name.to_owned();
    fields[LATITUDE_COLUMN] = lat.to_string();
    fields[LONGITUDE_COLUMN] = lon.to_string();
    fields[POPULATION_COLUMN] = population.to_string();
    fields.join("\t")
}

fn main() -> Result<()> {
    println!("=== popdb-rs Basic Usage Example ===\n");

    // Create the catalog
    println!("Creating in-memory catalog...");
    let catalog = SqliteCatalog::open_in_memory()?;
    catalog.create_schema()?;
    println!("✓ Schema created\n");

    // Example 1: Load a dump
    println!("--- Example 1: Load a gazetteer dump ---");
    let dump = [
        line("Berlin", 52.52437, 13.41053, 3_426_354),
        line("Potsdam", 52.39886, 13.06566, 183_154),
        line("Spandau", 52.55110, 13.19921, 245_197),
        line("Hamburg", 53.57532, 10.01534, 1_739_117),
        "this row is broken".to_owned(),
    ]
    .join("\n");
    let report = ingest_reader(&catalog, Cursor::new(dump))?;
    println!(
        "Loaded {} places, skipped {} rows\n",
        report.loaded, report.skipped
    );

    // Example 2: Population around a place
    println!("--- Example 2: Population within a radius ---");
    for radius in [0.0, 20.0, 50.0, 300.0] {
        let estimate = catalog.estimate(&RadiusQuery::new("Berlin", radius)?)?;
        println!(
            "  {:>5} km around Berlin: {:>9} people in {} places",
            radius, estimate.population, estimate.matched
        );
    }
    println!();

    // Example 3: Catalog statistics
    println!("--- Example 3: Catalog statistics ---");
    let stats = catalog.stats()?;
    println!("Places: {}", stats.places);
    println!("Total population: {}", stats.total_population);

    Ok(())
}
