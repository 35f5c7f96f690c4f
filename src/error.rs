//src/error.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// The input tables produced by the classification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Coverage,
    Untrustworthy,
    Membership,
    Prediction,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Coverage => "coverage",
            Table::Untrustworthy => "untrustworthy ranges",
            Table::Membership => "representative membership",
            Table::Prediction => "prediction",
        };
        f.write_str(name)
    }
}

/// Any failure while building a report. All of them abort the whole run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("could not access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {table} table: {source}")]
    Csv {
        table: Table,
        #[source]
        source: csv::Error,
    },

    #[error("malformed {table} table at line {line}: {reason}")]
    Format {
        table: Table,
        line: u64,
        reason: String,
    },

    /// The prediction table names a representative the coverage table lacks.
    #[error("no coverage for representative sequence '{sequence_id}' referenced by the prediction table")]
    MissingCoverage { sequence_id: String },

    #[error("malformed reference '{}': {source}", path.display())]
    Reference {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write report: {0}")]
    Output(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn csv(table: Table) -> impl Fn(csv::Error) -> Self {
        move |source| ReportError::Csv { table, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ReportError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_names_table_and_line() {
        let error = ReportError::Format {
            table: Table::Coverage,
            line: 7,
            reason: "2 lengths but 3 values for 'SEQ1'".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("coverage table"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("SEQ1"));
    }

    #[test]
    fn test_missing_coverage_names_sequence() {
        let error = ReportError::MissingCoverage {
            sequence_id: "REP9".to_string(),
        };
        assert!(format!("{error}").contains("'REP9'"));
    }
}
