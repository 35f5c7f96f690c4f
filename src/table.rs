//src/table.rs

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ReportError, Result, Table};

/// Opens one of the classifier's CSV tables.
pub(crate) fn open_table(path: &Path) -> Result<File> {
    File::open(path).map_err(ReportError::io(path))
}

/// Reads every row after the header into `T`, paired with its line number.
///
/// Fields are matched to `T` by position since the header names are not
/// stable between classifier versions.
pub(crate) fn read_rows<R: Read, T: DeserializeOwned>(reader: R, table: Table) -> Result<Vec<(u64, T)>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(ReportError::csv(table))?;
        let line = record.position().map_or(0, |p| p.line());
        let row = record
            .deserialize::<T>(None)
            .map_err(ReportError::csv(table))?;
        rows.push((line, row));
    }

    log::debug!("Read {} rows from the {} table", rows.len(), table);
    Ok(rows)
}

/// Parses a comma-separated list of integers such as `"100,20,5"`.
pub(crate) fn parse_int_list(field: &str) -> std::result::Result<Vec<u64>, String> {
    field
        .split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<u64>()
                .map_err(|e| format!("'{token}' is not a non-negative integer ({e})"))
        })
        .collect()
}
