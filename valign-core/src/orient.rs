//! Resolution of allele orientation against the chromosome dictionary.
//!
//! The dictionary itself lives behind [`OrientationLookup`] so the
//! validate-then-atomic-rename store in `valign-dict` (or any future
//! transactional store) can be swapped in without touching this algorithm.

use std::collections::BTreeMap;

use log::info;

use crate::models::VariantRecord;

/// The two queries orientation resolution needs from a chromosome
/// dictionary snapshot.
pub trait OrientationLookup {
    /// Is this exact `chr:pos:ref:alt` key established?
    fn contains_key(&self, key: &str) -> bool;
    /// Is any allele pair established at this position?
    fn contains_position(&self, pos: u64) -> bool;
}

/// Partition of the biallelic candidates after dictionary comparison.
///
/// `conflicting` rows are discarded entirely: their alleles disagree with
/// the record already established at that position. `addendum` holds the
/// novel variants pending commit, keyed by their as-submitted orientation
/// (first cohort processed wins); the ordered map keeps staging and
/// validation deterministic.
#[derive(Debug, Default)]
pub struct OrientationOutcome {
    pub matched: Vec<usize>,
    pub flipped: Vec<usize>,
    pub novel: Vec<usize>,
    pub conflicting: Vec<usize>,
    pub addendum: BTreeMap<String, VariantRecord>,
}

impl OrientationOutcome {
    /// All candidate rows that survived dictionary comparison, ascending.
    pub fn biallelic_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .matched
            .iter()
            .chain(self.flipped.iter())
            .chain(self.novel.iter())
            .copied()
            .collect();
        indices.sort_unstable();
        indices
    }
}

/// Look up each candidate in both orientations and partition into
/// matched / flip-needed / novel / conflicting.
pub fn orient<L: OrientationLookup>(
    records: &[VariantRecord],
    candidates: &[usize],
    dictionary: &L,
) -> OrientationOutcome {
    let mut outcome = OrientationOutcome::default();

    for &index in candidates {
        let record = &records[index];

        if dictionary.contains_key(&record.canonical_key()) {
            outcome.matched.push(index);
        } else if dictionary.contains_key(&record.reverse_key()) {
            outcome.flipped.push(index);
        } else if dictionary.contains_position(record.pos) {
            // the position is established with a different allele pair:
            // the candidate cannot be trusted and is discarded
            outcome.conflicting.push(index);
        } else {
            outcome.novel.push(index);
            outcome
                .addendum
                .insert(record.canonical_key(), record.clone());
        }
    }

    let total = candidates.len();
    info!(
        "{}/{} candidates found in dictionary in their given orientation",
        outcome.matched.len(),
        total
    );
    info!(
        "{}/{} candidates found in the opposite orientation and marked for flipping",
        outcome.flipped.len(),
        total
    );
    info!(
        "{}/{} candidates are novel and staged for dictionary addition",
        outcome.novel.len(),
        total
    );
    if !outcome.conflicting.is_empty() {
        info!(
            "{} candidates disagree with the established alleles at their position and were removed",
            outcome.conflicting.len()
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashSet;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct FakeDictionary {
        keys: FxHashSet<String>,
        positions: FxHashSet<u64>,
    }

    impl FakeDictionary {
        fn new(keys: &[&str]) -> Self {
            let positions = keys
                .iter()
                .map(|key| key.split(':').nth(1).unwrap().parse().unwrap())
                .collect();
            FakeDictionary {
                keys: keys.iter().map(|key| key.to_string()).collect(),
                positions,
            }
        }
    }

    impl OrientationLookup for FakeDictionary {
        fn contains_key(&self, key: &str) -> bool {
            self.keys.contains(key)
        }
        fn contains_position(&self, pos: u64) -> bool {
            self.positions.contains(&pos)
        }
    }

    fn record(pos: u64, id: &str, ref_allele: &str, alt_allele: &str) -> VariantRecord {
        VariantRecord {
            chrom: "1".to_string(),
            pos,
            id: id.to_string(),
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            beta: None,
        }
    }

    #[fixture]
    fn records() -> Vec<VariantRecord> {
        vec![
            record(100, "rs1", "A", "C"),  // forward match
            record(200, "rs2", "T", "G"),  // reverse match -> flip
            record(300, "rs3", "C", "T"),  // position known, alleles differ -> conflict
            record(400, "rs4", "G", "A"),  // novel
        ]
    }

    #[fixture]
    fn dictionary() -> FakeDictionary {
        FakeDictionary::new(&["1:100:A:C", "1:200:G:T", "1:300:A:C"])
    }

    #[rstest]
    fn test_partitions(records: Vec<VariantRecord>, dictionary: FakeDictionary) {
        let outcome = orient(&records, &[0, 1, 2, 3], &dictionary);

        assert_eq!(outcome.matched, vec![0]);
        assert_eq!(outcome.flipped, vec![1]);
        assert_eq!(outcome.conflicting, vec![2]);
        assert_eq!(outcome.novel, vec![3]);
        assert_eq!(outcome.biallelic_indices(), vec![0, 1, 3]);

        let keys: Vec<&String> = outcome.addendum.keys().collect();
        assert_eq!(keys, vec!["1:400:G:A"]);
    }

    #[rstest]
    fn test_conflict_never_reaches_addendum(dictionary: FakeDictionary) {
        let records = vec![record(300, "rs3", "C", "T")];
        let outcome = orient(&records, &[0], &dictionary);
        assert_eq!(outcome.conflicting, vec![0]);
        assert!(outcome.addendum.is_empty());
    }

    #[rstest]
    fn test_resolution_is_idempotent(records: Vec<VariantRecord>, dictionary: FakeDictionary) {
        let first = orient(&records, &[0, 1, 2, 3], &dictionary);
        let second = orient(&records, &[0, 1, 2, 3], &dictionary);
        assert_eq!(first.matched, second.matched);
        assert_eq!(first.flipped, second.flipped);
        assert_eq!(first.novel, second.novel);
        assert_eq!(first.conflicting, second.conflicting);
        assert_eq!(
            first.addendum.keys().collect::<Vec<_>>(),
            second.addendum.keys().collect::<Vec<_>>()
        );
    }
}
