//src/untrustworthy.rs

use ahash::AHashMap;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::{ReportError, Result, Table};
use crate::table::{open_table, read_rows};
use crate::types::{UntrustworthyRange, UntrustworthyRanges};

/// Untrustworthy ranges keyed by sequence id. Sequences without ranges are absent.
pub type UntrustworthyMap = AHashMap<String, UntrustworthyRanges>;

#[derive(Debug, Deserialize)]
struct UntrustworthyRow {
    sequence_id: String,
    ranges: String,
}

/// Loads the untrustworthy ranges derived from the model's mappability profile.
pub fn load_untrustworthy_ranges<P: AsRef<Path>>(path: P) -> Result<UntrustworthyMap> {
    let file = open_table(path.as_ref())?;
    read_untrustworthy_ranges(file)
}

/// Parses rows of `sequence_id, ranges` where `ranges` holds `start-end` tokens
/// separated by `,` or `|`. Rows with an empty range field are skipped.
pub fn read_untrustworthy_ranges<R: Read>(reader: R) -> Result<UntrustworthyMap> {
    let rows: Vec<(u64, UntrustworthyRow)> = read_rows(reader, Table::Untrustworthy)?;
    let mut untrustworthy = UntrustworthyMap::new();

    for (line, row) in rows {
        if row.ranges.trim().is_empty() {
            continue;
        }

        let ranges = row
            .ranges
            .split([',', '|'])
            .map(parse_range)
            .collect::<std::result::Result<UntrustworthyRanges, String>>()
            .map_err(|reason| ReportError::Format {
                table: Table::Untrustworthy,
                line,
                reason: format!("{reason} for '{}'", row.sequence_id),
            })?;

        untrustworthy.insert(row.sequence_id, ranges);
    }

    log::info!("Loaded untrustworthy ranges for {} sequences", untrustworthy.len());
    Ok(untrustworthy)
}

/// Parses a single `start-end` token.
fn parse_range(token: &str) -> std::result::Result<UntrustworthyRange, String> {
    let token = token.trim();
    let mut parts = token.split('-');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(start), Some(end), None) => {
            let bound = |s: &str| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| format!("bad range token '{token}'"))
            };
            Ok((bound(start)?, bound(end)?))
        }
        _ => Err(format!("range token '{token}' is not of the form start-end")),
    }
}
