//! Bar loaders.
//!
//! Reads OHLC bars (with an optional spread column) from CSV exports and
//! hands them to the engine sorted and free of duplicate timestamps.

mod csv_source;

pub use csv_source::{parse_timestamp, BarFormat, CsvBarSource, LoadOptions};

use std::path::Path;

use breakout_core::{Bar, DataError};

/// Load bars from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<Bar>, DataError> {
    CsvBarSource::new(path)?.load(options)
}
