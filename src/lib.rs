// src/lib.rs
pub mod aggregate;
pub mod coverage;
pub mod error;
pub mod membership;
pub mod predictions;
pub mod reference;
pub mod types;
pub mod untrustworthy;

mod table;

use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregate::aggregate;
use crate::coverage::load_coverage;
use crate::error::{ReportError, Result};
use crate::membership::load_membership;
use crate::predictions::{expand_predictions, load_prediction_rows};
use crate::reference::load_reference;
use crate::types::{PredictionMap, PredictionOtu};
use crate::untrustworthy::load_untrustworthy_ranges;

pub use crate::error::Table;

/// File names the classifier writes into its output directory.
pub const COVERAGE_FILE: &str = "coverage.csv";
pub const UNTRUSTWORTHY_FILE: &str = "untrustworthy.csv";
pub const PREDICTION_FILE: &str = "prediction_sequence.csv";

/// Locations of every input needed to build one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInputs {
    /// `reference.json.gz` from the model release
    pub reference: PathBuf,
    /// `reps_by_sequence.csv` from the model release
    pub reps_by_sequence: PathBuf,
    pub coverage: PathBuf,
    pub untrustworthy: PathBuf,
    pub predictions: PathBuf,
}

impl ReportInputs {
    /// Inputs for a classifier run that wrote its tables to `output_dir`.
    pub fn from_output_dir<P, Q, R>(reference: P, reps_by_sequence: Q, output_dir: R) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
        R: AsRef<Path>,
    {
        let output_dir = output_dir.as_ref();
        Self {
            reference: reference.into(),
            reps_by_sequence: reps_by_sequence.into(),
            coverage: output_dir.join(COVERAGE_FILE),
            untrustworthy: output_dir.join(UNTRUSTWORTHY_FILE),
            predictions: output_dir.join(PREDICTION_FILE),
        }
    }
}

/// The finished report: predicted OTUs sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    pub hits: Vec<PredictionOtu>,
}

impl PredictionReport {
    /// Number of OTUs called positive.
    pub fn positive_count(&self) -> usize {
        self.hits.iter().filter(|otu| otu.result).count()
    }

    /// Render the report as the JSON document uploaded for the analysis.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(ReportError::io(path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(ReportError::io(path))?;
        Ok(())
    }
}

/// Loads the four classifier tables and expands predictions onto every
/// member sequence of each representative.
pub fn load_predictions(inputs: &ReportInputs) -> Result<PredictionMap> {
    let coverage = load_coverage(&inputs.coverage)?;
    let mut untrustworthy = load_untrustworthy_ranges(&inputs.untrustworthy)?;
    let membership = load_membership(&inputs.reps_by_sequence)?;
    let rows = load_prediction_rows(&inputs.predictions)?;

    expand_predictions(rows, &coverage, &mut untrustworthy, &membership)
}

/// Builds the hierarchical report for one classifier run.
///
/// The prediction tables and the reference are loaded concurrently; all
/// working maps are owned by this call and dropped when it returns.
pub fn build_report(inputs: &ReportInputs) -> Result<PredictionReport> {
    let (predictions, reference) = rayon::join(
        || load_predictions(inputs),
        || load_reference(&inputs.reference),
    );

    let hits = aggregate(&predictions?, &reference?);

    Ok(PredictionReport { hits })
}

/// Builds reports for independent runs in parallel. Results keep input order.
pub fn build_reports(runs: &[ReportInputs]) -> Vec<Result<PredictionReport>> {
    runs.par_iter().map(build_report).collect()
}
