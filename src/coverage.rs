//src/coverage.rs

use ahash::AHashMap;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::{ReportError, Result, Table};
use crate::table::{open_table, parse_int_list, read_rows};
use crate::types::Coverage;

/// Coverage keyed by representative sequence id.
pub type CoverageMap = AHashMap<String, Coverage>;

/// One row of `coverage.csv`.
#[derive(Debug, Deserialize)]
struct CoverageRow {
    sequence_id: String,
    lengths: String,
    values: String,
}

/// Loads the RLE coverage table written by the classifier.
pub fn load_coverage<P: AsRef<Path>>(path: P) -> Result<CoverageMap> {
    let file = open_table(path.as_ref())?;
    read_coverage(file)
}

/// Parses rows of `sequence_id, lengths, values` where both lists are
/// comma-separated integers of equal length.
pub fn read_coverage<R: Read>(reader: R) -> Result<CoverageMap> {
    let rows: Vec<(u64, CoverageRow)> = read_rows(reader, Table::Coverage)?;
    let mut coverage = CoverageMap::with_capacity(rows.len());

    for (line, row) in rows {
        let format_error = |reason: String| ReportError::Format {
            table: Table::Coverage,
            line,
            reason,
        };

        let lengths = parse_int_list(&row.lengths).map_err(&format_error)?;
        let values = parse_int_list(&row.values).map_err(&format_error)?;

        if lengths.len() != values.len() {
            return Err(format_error(format!(
                "{} run lengths but {} run values for '{}'",
                lengths.len(),
                values.len(),
                row.sequence_id
            )));
        }

        coverage.insert(row.sequence_id, Coverage { lengths, values });
    }

    log::info!("Loaded coverage for {} sequences", coverage.len());
    Ok(coverage)
}
