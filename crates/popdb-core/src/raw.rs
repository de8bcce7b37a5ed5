// crates/popdb-core/src/raw.rs
//! Raw gazetteer rows as they appear in the dump.
//!
//! The column layout is the GeoNames `geoname` table export: 19 tab-separated
//! fields per line. Only four of them matter here and their offsets are an
//! external contract, so they live in this module and nowhere else.

use crate::error::RowErrorKind;
use crate::model::PlaceRecord;

/// Fields per row in a GeoNames dump.
pub const DUMP_COLUMNS: usize = 19;
/// 0-based offset of the place name.
pub const NAME_COLUMN: usize = 1;
/// 0-based offset of the latitude in decimal degrees.
pub const LATITUDE_COLUMN: usize = 4;
/// 0-based offset of the longitude in decimal degrees.
pub const LONGITUDE_COLUMN: usize = 5;
/// 0-based offset of the population.
pub const POPULATION_COLUMN: usize = 14;

/// One dump line split into the named fields we care about.
///
/// Nothing is parsed yet; the slices borrow from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRow<'a> {
    pub name: &'a str,
    pub latitude: &'a str,
    pub longitude: &'a str,
    pub population: &'a str,
}

impl<'a> DumpRow<'a> {
    /// Splits a line on tabs and picks the contract columns.
    ///
    /// Rows with more or fewer than [`DUMP_COLUMNS`] fields are rejected.
    pub fn split(line: &'a str) -> Result<Self, RowErrorKind> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != DUMP_COLUMNS {
            return Err(RowErrorKind::ColumnCount {
                expected: DUMP_COLUMNS,
                found: fields.len(),
            });
        }
        Ok(Self {
            name: fields[NAME_COLUMN],
            latitude: fields[LATITUDE_COLUMN],
            longitude: fields[LONGITUDE_COLUMN],
            population: fields[POPULATION_COLUMN],
        })
    }

    /// Parses the numeric fields. Range checks are left to [`validate`].
    pub fn parse(&self) -> Result<PlaceRecord, RowErrorKind> {
        if self.name.trim().is_empty() {
            return Err(RowErrorKind::EmptyName);
        }
        let population = self
            .population
            .trim()
            .parse::<u64>()
            .map_err(|_| unparseable("population", "non-negative integer", self.population))?;
        let latitude = parse_f64("latitude", self.latitude)?;
        let longitude = parse_f64("longitude", self.longitude)?;

        Ok(PlaceRecord {
            name: self.name.to_owned(),
            population,
            latitude,
            longitude,
        })
    }
}

/// Range checks on an already-parsed record.
pub fn validate(record: PlaceRecord) -> Result<PlaceRecord, RowErrorKind> {
    check_range("latitude", record.latitude, 90.0)?;
    check_range("longitude", record.longitude, 180.0)?;
    Ok(record)
}

/// Split, parse and validate one line.
pub fn decode_line(line: &str) -> Result<PlaceRecord, RowErrorKind> {
    DumpRow::split(line)?.parse().and_then(validate)
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, RowErrorKind> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| unparseable(field, "float", value))
}

fn check_range(field: &'static str, value: f64, limit: f64) -> Result<(), RowErrorKind> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(RowErrorKind::OutOfRange { field, value })
    }
}

fn unparseable(field: &'static str, expected: &'static str, value: &str) -> RowErrorKind {
    RowErrorKind::Unparseable {
        field,
        expected,
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, lat: &str, lon: &str, population: &str) -> String {
        let mut fields = vec![""; DUMP_COLUMNS];
        fields[0] = "2950159";
        fields[NAME_COLUMN] = name;
        fields[LATITUDE_COLUMN] = lat;
        fields[LONGITUDE_COLUMN] = lon;
        fields[POPULATION_COLUMN] = population;
        fields.join("\t")
    }

    #[test]
    fn decodes_contract_columns() {
        let record = decode_line(&row("Berlin", "52.52437", "13.41053", "3426354")).unwrap();
        assert_eq!(record, PlaceRecord::new("Berlin", 3_426_354, 52.52437, 13.41053));
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let line = format!("{}\r", row("Bern", "46.94809", "7.44744", "121631"));
        assert_eq!(decode_line(&line).unwrap().name(), "Bern");
    }

    #[test]
    fn rejects_wrong_column_count() {
        let err = decode_line("1\tBerlin\t52.5\t13.4").unwrap_err();
        assert_eq!(
            err,
            RowErrorKind::ColumnCount {
                expected: DUMP_COLUMNS,
                found: 4
            }
        );

        let extra = format!("{}\textra", row("Berlin", "52.5", "13.4", "1"));
        assert!(matches!(
            decode_line(&extra),
            Err(RowErrorKind::ColumnCount { found: 20, .. })
        ));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        assert!(matches!(
            decode_line(&row("X", "52.5", "13.4", "many")),
            Err(RowErrorKind::Unparseable { field: "population", .. })
        ));
        assert!(matches!(
            decode_line(&row("X", "north", "13.4", "1")),
            Err(RowErrorKind::Unparseable { field: "latitude", .. })
        ));
        assert!(matches!(
            decode_line(&row("X", "52.5", "", "1")),
            Err(RowErrorKind::Unparseable { field: "longitude", .. })
        ));
    }

    #[test]
    fn rejects_negative_population() {
        assert!(matches!(
            decode_line(&row("X", "0", "0", "-5")),
            Err(RowErrorKind::Unparseable { field: "population", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_and_nan_coordinates() {
        assert!(matches!(
            decode_line(&row("X", "91.0", "0", "1")),
            Err(RowErrorKind::OutOfRange { field: "latitude", .. })
        ));
        assert!(matches!(
            decode_line(&row("X", "0", "-180.5", "1")),
            Err(RowErrorKind::OutOfRange { field: "longitude", .. })
        ));
        assert!(matches!(
            decode_line(&row("X", "NaN", "0", "1")),
            Err(RowErrorKind::OutOfRange { field: "latitude", .. })
        ));
    }

    #[test]
    fn rejects_blank_name() {
        assert_eq!(
            decode_line(&row("  ", "0", "0", "1")),
            Err(RowErrorKind::EmptyName)
        );
    }
}
