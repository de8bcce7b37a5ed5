//! Error handling example for popdb-rs
//!
//! This example demonstrates proper error handling and edge cases

use popdb_rs::prelude::*;

fn main() -> Result<()> {
    println!("=== popdb-rs Error Handling Example ===\n");

    // Example 1: Handling a missing dump
    println!("--- Example 1: Loading a dump that does not exist ---");
    let catalog = MemoryCatalog::new();
    catalog.create_schema()?;
    match ingest_path(&catalog, "does-not-exist.txt") {
        Ok(report) => println!("✓ Loaded {} places", report.loaded),
        Err(e) => eprintln!("✗ Failed to load dump: {e}"),
    }
    println!();

    // Example 2: Creating the schema twice
    println!("--- Example 2: Schema already present ---");
    if let Err(e) = catalog.create_schema() {
        println!("  {e} (safe to ignore when appending)");
    }
    println!();

    let catalog = MemoryCatalog::with_records([
        PlaceRecord::new("Longyearbyen", 2_060, 78.2232, 15.6267),
        PlaceRecord::new("Alert", 62, 82.5018, -62.3481),
    ])?;

    // Example 3: Bad request parameters
    println!("--- Example 3: Invalid query parameters ---");
    let requests = [
        (None, Some("10")),
        (Some("Alert"), None),
        (Some("Alert"), Some("ten")),
        (Some("Alert"), Some("-1")),
    ];
    for (place, radius) in requests {
        match RadiusQuery::parse(place, radius) {
            Ok(q) => println!("  accepted: {q:?}"),
            Err(e) => println!("  {} {e}", e.http_status()),
        }
    }
    println!();

    // Example 4: Unknown places are errors, not zero
    println!("--- Example 4: Unknown place ---");
    match catalog.population_within("Atlantis", 10.0) {
        Ok(population) => println!("  population: {population}"),
        Err(e) => println!("  {} {e}", e.http_status()),
    }
    println!();

    // Example 5: High latitudes stay bounded
    println!("--- Example 5: Near the pole ---");
    let estimate = catalog.estimate(&RadiusQuery::new("Alert", 500.0)?)?;
    println!("  box: {:?}", estimate.bbox);
    println!("  population: {}", estimate.population);

    Ok(())
}
