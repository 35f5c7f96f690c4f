//src/predictions.rs

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::coverage::CoverageMap;
use crate::error::{ReportError, Result, Table};
use crate::membership::Membership;
use crate::table::{open_table, read_rows};
use crate::types::{PredictionMap, RawPrediction};
use crate::untrustworthy::UntrustworthyMap;

/// The call token the classifier writes for a positive prediction.
pub const POSITIVE_CALL: &str = "TRUE";

/// One row of `prediction_sequence.csv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionRow {
    pub index: String,
    pub otu_id: String,
    pub isolate_id: String,
    pub representative_id: String,
    pub call: String,
    pub probability: f64,
}

impl PredictionRow {
    pub fn is_positive(&self) -> bool {
        self.call == POSITIVE_CALL
    }
}

/// Loads the per-representative prediction table.
pub fn load_prediction_rows<P: AsRef<Path>>(path: P) -> Result<Vec<PredictionRow>> {
    let file = open_table(path.as_ref())?;
    read_prediction_rows(file)
}

/// Parses prediction rows, rejecting probabilities outside `[0, 1]`.
pub fn read_prediction_rows<R: Read>(reader: R) -> Result<Vec<PredictionRow>> {
    let rows: Vec<(u64, PredictionRow)> = read_rows(reader, Table::Prediction)?;

    rows.into_iter()
        .map(|(line, row)| {
            if !(0.0..=1.0).contains(&row.probability) {
                return Err(ReportError::Format {
                    table: Table::Prediction,
                    line,
                    reason: format!(
                        "probability {} for '{}' is outside [0, 1]",
                        row.probability, row.representative_id
                    ),
                });
            }
            Ok(row)
        })
        .collect()
}

/// Expands per-representative predictions onto every member sequence.
///
/// Untrustworthy ranges are removed from `untrustworthy` as they are claimed,
/// so the map must not be shared with another expansion. When two
/// representatives claim the same member the later row wins.
pub fn expand_predictions(
    rows: Vec<PredictionRow>,
    coverage: &CoverageMap,
    untrustworthy: &mut UntrustworthyMap,
    membership: &Membership,
) -> Result<PredictionMap> {
    let mut predictions = PredictionMap::with_capacity(rows.len());

    for row in rows {
        let result = row.is_positive();

        let representative_coverage = coverage
            .get(&row.representative_id)
            .cloned()
            .ok_or_else(|| ReportError::MissingCoverage {
                sequence_id: row.representative_id.clone(),
            })?;

        let untrustworthy_ranges = untrustworthy
            .remove(&row.representative_id)
            .unwrap_or_default();

        let prediction = Arc::new(RawPrediction {
            coverage: representative_coverage,
            result,
            probability: row.probability,
            untrustworthy_ranges,
            representative_id: row.representative_id,
        });

        for sequence_id in membership.members_of(&prediction.representative_id).iter() {
            predictions.insert(sequence_id.clone(), Arc::clone(&prediction));
        }
    }

    log::info!("Expanded predictions onto {} sequences", predictions.len());
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::read_membership;
    use crate::types::Coverage;

    fn row(rep: &str, call: &str, probability: f64) -> PredictionRow {
        PredictionRow {
            index: "1".to_string(),
            otu_id: "OTU1".to_string(),
            isolate_id: "ISO1".to_string(),
            representative_id: rep.to_string(),
            call: call.to_string(),
            probability,
        }
    }

    fn coverage_for(ids: &[&str]) -> CoverageMap {
        ids.iter()
            .map(|id| (id.to_string(), Coverage { lengths: vec![10], values: vec![2] }))
            .collect()
    }

    #[test]
    fn test_read_prediction_rows() {
        let data = "\"\",otu_id,isolate_id,sequence_id,prediction,probability\n\
                    \"1\",OTU1,ISO1,SEQ1,TRUE,0.9\n\
                    \"2\",OTU1,ISO1,SEQ2,FALSE,0.1\n";
        let rows = read_prediction_rows(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].representative_id, "SEQ1");
        assert!(rows[0].is_positive());
        assert!(!rows[1].is_positive());
        assert_eq!(rows[1].probability, 0.1);
    }

    #[test]
    fn test_bad_probability_is_fatal() {
        let data = "i,o,s,r,p,prob\n1,OTU1,ISO1,SEQ1,TRUE,high\n";
        assert!(matches!(
            read_prediction_rows(data.as_bytes()),
            Err(ReportError::Csv { table: Table::Prediction, .. })
        ));

        let data = "i,o,s,r,p,prob\n1,OTU1,ISO1,SEQ1,TRUE,1.5\n";
        assert!(matches!(
            read_prediction_rows(data.as_bytes()),
            Err(ReportError::Format { line: 2, .. })
        ));
    }

    #[test]
    fn test_call_token_is_exact() {
        assert!(!row("R", "true", 0.5).is_positive());
        assert!(!row("R", "T", 0.5).is_positive());
        assert!(row("R", "TRUE", 0.5).is_positive());
    }

    #[test]
    fn test_expand_shares_prediction_across_members() {
        let membership = read_membership("s,r\nA,R1\nB,R1\nR1,R1\n".as_bytes()).unwrap();
        let mut untrustworthy = UntrustworthyMap::new();
        untrustworthy.insert("R1".to_string(), vec![(1, 4)]);

        let predictions = expand_predictions(
            vec![row("R1", "TRUE", 0.8)],
            &coverage_for(&["R1"]),
            &mut untrustworthy,
            &membership,
        )
        .unwrap();

        assert_eq!(predictions.len(), 3);
        assert!(Arc::ptr_eq(&predictions["A"], &predictions["B"]));
        assert!(Arc::ptr_eq(&predictions["A"], &predictions["R1"]));
        assert_eq!(predictions["A"].untrustworthy_ranges, vec![(1, 4)]);
        assert_eq!(predictions["B"].representative_id, "R1");
        assert!(untrustworthy.is_empty(), "ranges should be consumed");
    }

    #[test]
    fn test_expand_without_membership_entry_uses_representative() {
        let predictions = expand_predictions(
            vec![row("R1", "FALSE", 0.2)],
            &coverage_for(&["R1"]),
            &mut UntrustworthyMap::new(),
            &Membership::default(),
        )
        .unwrap();

        assert_eq!(predictions.len(), 1);
        assert!(!predictions["R1"].result);
        assert!(predictions["R1"].untrustworthy_ranges.is_empty());
    }

    #[test]
    fn test_missing_coverage_is_fatal() {
        let err = expand_predictions(
            vec![row("R1", "TRUE", 0.8), row("R2", "TRUE", 0.8)],
            &coverage_for(&["R1"]),
            &mut UntrustworthyMap::new(),
            &Membership::default(),
        )
        .unwrap_err();

        match err {
            ReportError::MissingCoverage { sequence_id } => assert_eq!(sequence_id, "R2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_later_representative_overwrites_shared_member() {
        let membership = read_membership("s,r\nX,R1\nX,R2\n".as_bytes()).unwrap();
        let predictions = expand_predictions(
            vec![row("R1", "TRUE", 0.9), row("R2", "FALSE", 0.3)],
            &coverage_for(&["R1", "R2"]),
            &mut UntrustworthyMap::new(),
            &membership,
        )
        .unwrap();

        assert_eq!(predictions["X"].representative_id, "R2");
        assert!(!predictions["X"].result);
    }
}
