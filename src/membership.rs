//src/membership.rs

use ahash::{AHashMap, AHashSet};
use serde::Deserialize;
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, Table};
use crate::table::{open_table, read_rows};

#[derive(Debug, Deserialize)]
struct MembershipRow {
    sequence_id: String,
    representative_id: String,
}

/// Maps each representative sequence to the sequences collapsed onto it
/// during deduplication.
#[derive(Debug, Default, Clone)]
pub struct Membership {
    members: AHashMap<String, AHashSet<String>>,
}

impl Membership {
    /// Records that `sequence_id` was deduplicated to `representative_id`.
    pub fn insert(&mut self, sequence_id: String, representative_id: String) {
        self.members
            .entry(representative_id)
            .or_default()
            .insert(sequence_id);
    }

    /// Members of `representative_id`. A representative the table does not
    /// mention stands for itself alone.
    pub fn members_of(&self, representative_id: &str) -> Cow<'_, AHashSet<String>> {
        match self.members.get(representative_id) {
            Some(members) => Cow::Borrowed(members),
            None => Cow::Owned(AHashSet::from_iter([representative_id.to_string()])),
        }
    }

    /// Number of representatives.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Loads `reps_by_sequence.csv` shipped with the model release.
pub fn load_membership<P: AsRef<Path>>(path: P) -> Result<Membership> {
    let file = open_table(path.as_ref())?;
    read_membership(file)
}

/// Parses rows of `sequence_id, representative_id` and groups them by representative.
pub fn read_membership<R: Read>(reader: R) -> Result<Membership> {
    let rows: Vec<(u64, MembershipRow)> = read_rows(reader, Table::Membership)?;
    let mut membership = Membership::default();

    for (_, row) in rows {
        membership.insert(row.sequence_id, row.representative_id);
    }

    log::info!("Loaded membership for {} representative sequences", membership.len());
    Ok(membership)
}
