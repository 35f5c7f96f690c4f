//src/aggregate.rs

use crate::reference::{Reference, ReferenceIsolate, ReferenceOtu, ReferenceSequence};
use crate::types::{PredictionIsolate, PredictionMap, PredictionOtu, PredictionSequence};

/// Annotates the reference with predictions and prunes everything the
/// classifier did not call.
///
/// * an isolate is kept only if at least one of its sequences has a prediction;
///   the rest of its sequences get zero-coverage defaults
/// * an OTU is kept only if at least one of its isolates is kept
/// * an OTU's result is true if any kept sequence's result is true
///
/// The returned OTUs are sorted by name.
pub fn aggregate(predictions: &PredictionMap, reference: &Reference) -> Vec<PredictionOtu> {
    let mut otus: Vec<PredictionOtu> = reference
        .otus
        .iter()
        .filter_map(|otu| aggregate_otu(predictions, otu))
        .collect();

    otus.sort_by(|a, b| a.name.cmp(&b.name));

    log::info!(
        "Retained {} of {} OTUs with predictions",
        otus.len(),
        reference.otus.len()
    );
    otus
}

fn aggregate_otu(predictions: &PredictionMap, otu: &ReferenceOtu) -> Option<PredictionOtu> {
    let isolates: Vec<PredictionIsolate> = otu
        .isolates
        .iter()
        .filter_map(|isolate| aggregate_isolate(predictions, isolate))
        .collect();

    if isolates.is_empty() {
        return None;
    }

    let result = isolates
        .iter()
        .flat_map(|isolate| &isolate.sequences)
        .any(|sequence| sequence.result);

    Some(PredictionOtu {
        id: otu.id.clone(),
        abbreviation: otu.abbreviation.clone(),
        name: otu.name.clone(),
        result,
        isolates,
    })
}

fn aggregate_isolate(predictions: &PredictionMap, isolate: &ReferenceIsolate) -> Option<PredictionIsolate> {
    let mut had_prediction = false;

    let sequences: Vec<PredictionSequence> = isolate
        .sequences
        .iter()
        .map(|sequence| {
            let (resolved, predicted) = resolve_sequence(predictions, sequence);
            had_prediction |= predicted;
            resolved
        })
        .collect();

    if !had_prediction {
        log::debug!("Discarding isolate {} with no predicted sequences", isolate.id);
        return None;
    }

    Some(PredictionIsolate {
        id: isolate.id.clone(),
        source_name: isolate.source_name.clone(),
        source_type: isolate.source_type.clone(),
        sequences,
    })
}

/// Returns the report entry for `sequence` and whether it came from a real prediction.
fn resolve_sequence(predictions: &PredictionMap, sequence: &ReferenceSequence) -> (PredictionSequence, bool) {
    match predictions.get(&sequence.id) {
        Some(prediction) => (
            PredictionSequence::from_prediction(&sequence.id, sequence.length(), prediction),
            true,
        ),
        None => (
            PredictionSequence::unclassified(&sequence.id, sequence.length()),
            false,
        ),
    }
}
