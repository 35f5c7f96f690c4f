//src/types.rs

use ahash::AHashMap;
use serde::Serialize;
use std::sync::Arc;

/// A `(start, end)` coordinate pair flagged as unreliable for a sequence.
pub type UntrustworthyRange = (u64, u64);

/// All untrustworthy ranges for one sequence, in file order.
pub type UntrustworthyRanges = Vec<UntrustworthyRange>;

/// Expanded predictions keyed by member sequence id.
/// Every member of a representative shares the same `Arc`.
pub type PredictionMap = AHashMap<String, Arc<RawPrediction>>;

/// Run-length encoded read depth across one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub lengths: Vec<u64>,
    pub values: Vec<u64>,
}

impl Coverage {
    /// A single zero-depth run spanning `length` positions.
    pub fn empty(length: u64) -> Self {
        Self {
            lengths: vec![length],
            values: vec![0],
        }
    }
}

/// A classifier call for one representative sequence.
///
/// One `RawPrediction` is shared by every sequence collapsed onto the
/// representative, so all of them report the representative's values.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub representative_id: String,
    pub coverage: Coverage,
    pub result: bool,
    pub probability: f64,
    pub untrustworthy_ranges: UntrustworthyRanges,
}

/// A sequence in the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSequence {
    pub id: String,
    pub length: u64,             // from the reference, not the coverage
    pub coverage: Coverage,
    pub probability: f64,
    pub result: bool,
    pub untrustworthy_ranges: UntrustworthyRanges,
}

impl PredictionSequence {
    /// Report entry for a sequence carrying a real classifier call.
    pub fn from_prediction(id: &str, length: u64, prediction: &RawPrediction) -> Self {
        Self {
            id: id.to_string(),
            length,
            coverage: prediction.coverage.clone(),
            probability: prediction.probability,
            result: prediction.result,
            untrustworthy_ranges: prediction.untrustworthy_ranges.clone(),
        }
    }

    /// Report entry for a sequence the classifier never saw.
    pub fn unclassified(id: &str, length: u64) -> Self {
        Self {
            id: id.to_string(),
            length,
            coverage: Coverage::empty(length),
            probability: 0.0,
            result: false,
            untrustworthy_ranges: Vec::new(),
        }
    }
}

/// An isolate with at least one predicted sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionIsolate {
    pub id: String,
    pub source_name: String,
    pub source_type: String,
    pub sequences: Vec<PredictionSequence>,
}

/// An OTU with at least one retained isolate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOtu {
    pub id: String,
    pub abbreviation: String,
    pub name: String,
    pub result: bool,
    pub isolates: Vec<PredictionIsolate>,
}
