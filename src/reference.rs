//src/reference.rs

use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{ReportError, Result};

/// The reference taxonomy shipped with a model release (`reference.json.gz`).
///
/// OTUs, isolates and sequences keep the order of the source document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reference {
    pub otus: Vec<ReferenceOtu>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceOtu {
    #[serde(rename = "_id")]
    pub id: String,
    pub abbreviation: String,
    pub name: String,
    pub isolates: Vec<ReferenceIsolate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceIsolate {
    pub id: String,
    pub source_name: String,
    pub source_type: String,
    pub sequences: Vec<ReferenceSequence>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceSequence {
    #[serde(rename = "_id")]
    pub id: String,
    pub sequence: String,
}

impl ReferenceSequence {
    /// Number of nucleotides, counted as characters.
    pub fn length(&self) -> u64 {
        self.sequence.chars().count() as u64
    }
}

impl Reference {
    /// Total number of sequences across all OTUs.
    pub fn sequence_count(&self) -> usize {
        self.otus
            .iter()
            .flat_map(|otu| &otu.isolates)
            .map(|isolate| isolate.sequences.len())
            .sum()
    }

    /// Writes every sequence as a FASTA record in reference order.
    pub fn write_fasta<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let sequences = self
            .otus
            .iter()
            .flat_map(|otu| &otu.isolates)
            .flat_map(|isolate| &isolate.sequences);

        for sequence in sequences {
            writeln!(writer, ">{}\n{}", sequence.id, sequence.sequence)?;
        }
        writer.flush()
    }
}

/// Loads the reference document. Files ending in `.gz` are decompressed.
pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<Reference> {
    let path = path.as_ref();
    let f = File::open(path).map_err(ReportError::io(path))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    read_reference(reader).map_err(|source| ReportError::Reference {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes all reference sequences to `output_path` as FASTA, used to build
/// the all-OTU mapping index.
pub fn write_all_otu_fasta<P: AsRef<Path>, Q: AsRef<Path>>(reference_path: P, output_path: Q) -> Result<()> {
    let reference = load_reference(reference_path)?;

    let output_path = output_path.as_ref();
    let file = File::create(output_path).map_err(ReportError::io(output_path))?;
    reference
        .write_fasta(BufWriter::new(file))
        .map_err(ReportError::io(output_path))?;

    log::info!(
        "Wrote {} reference sequences to {}",
        reference.sequence_count(),
        output_path.display()
    );
    Ok(())
}

/// Parses an uncompressed reference document.
pub fn read_reference<R: Read>(reader: R) -> serde_json::Result<Reference> {
    let reference: Reference = serde_json::from_reader(reader)?;

    log::info!(
        "Loaded reference with {} OTUs and {} sequences",
        reference.otus.len(),
        reference.sequence_count()
    );
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    const REFERENCE: &str = r#"{
        "data_type": "genome",
        "otus": [
            {
                "_id": "otu_b",
                "abbreviation": "B",
                "name": "Beta virus",
                "isolates": [
                    {
                        "id": "iso_1",
                        "source_name": "A1",
                        "source_type": "isolate",
                        "default": true,
                        "sequences": [
                            {"_id": "s2", "sequence": "ACGTACGTAC", "accession": "X1"},
                            {"_id": "s1", "sequence": "ACG"}
                        ]
                    }
                ]
            },
            {
                "_id": "otu_a",
                "abbreviation": "",
                "name": "Alpha virus",
                "isolates": []
            }
        ]
    }"#;

    #[test]
    fn test_read_reference_keeps_order_and_lengths() {
        let reference = read_reference(REFERENCE.as_bytes()).unwrap();

        assert_eq!(reference.otus.len(), 2);
        assert_eq!(reference.otus[0].name, "Beta virus");
        assert_eq!(reference.otus[1].id, "otu_a");

        let sequences = &reference.otus[0].isolates[0].sequences;
        assert_eq!(sequences[0].id, "s2");
        assert_eq!(sequences[0].length(), 10);
        assert_eq!(sequences[1].id, "s1");
        assert_eq!(sequences[1].length(), 3);
        assert_eq!(reference.sequence_count(), 2);
    }

    #[test]
    fn test_load_gzipped_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json.gz");

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(REFERENCE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let reference = load_reference(&path).unwrap();
        assert_eq!(reference, read_reference(REFERENCE.as_bytes()).unwrap());
    }

    #[test]
    fn test_corrupt_reference_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.json.gz");
        std::fs::write(&path, b"not gzip at all").unwrap();

        assert!(matches!(
            load_reference(&path),
            Err(ReportError::Reference { .. })
        ));
    }

    #[test]
    fn test_missing_otus_key_is_fatal() {
        assert!(read_reference(r#"{"data_type": "genome"}"#.as_bytes()).is_err());

        let no_abbreviation = r#"{"otus": [{"_id": "a", "name": "A", "isolates": []}]}"#;
        let err = read_reference(no_abbreviation.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("abbreviation"));
    }

    #[test]
    fn test_length_counts_characters() {
        let sequence = ReferenceSequence {
            id: "s".to_string(),
            sequence: "ACGNé".to_string(),
        };
        assert_eq!(sequence.length(), 5);
    }

    #[test]
    fn test_write_all_otu_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let reference_path = dir.path().join("reference.json.gz");
        let fasta_path = dir.path().join("all_otus.fa");

        let mut encoder = GzEncoder::new(File::create(&reference_path).unwrap(), Compression::default());
        encoder.write_all(REFERENCE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        write_all_otu_fasta(&reference_path, &fasta_path).unwrap();

        let fasta = std::fs::read_to_string(&fasta_path).unwrap();
        assert_eq!(fasta, ">s2\nACGTACGTAC\n>s1\nACG\n");
    }

    #[test]
    fn test_write_all_otu_fasta_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let reference_path = dir.path().join("reference.json");
        std::fs::write(&reference_path, REFERENCE).unwrap();

        let err = write_all_otu_fasta(&reference_path, "/dev/full").unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
