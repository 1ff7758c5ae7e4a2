//! Application of the resolved orientation: allele swaps, effect-size sign
//! flips, canonical re-keying, and post-flip duplicate detection.

use fxhash::{FxHashMap, FxHashSet};
use log::warn;

use crate::models::VariantRecord;

/// The corrected file view after alignment.
///
/// `row_keys` holds the post-flip canonical key of every record, in file
/// order; the duplicate lists flag canonical keys that more than one
/// original row collapsed onto (duplicate submissions in the source file).
#[derive(Debug, Default)]
pub struct AlignmentOutcome {
    pub row_keys: Vec<String>,
    pub biallelic_keys: Vec<String>,
    pub flipped_keys: Vec<String>,
    pub duplicate_keys: Vec<String>,
    pub duplicate_biallelic_keys: Vec<String>,
}

/// Swap REF/ALT (negating BETA where carried) for every flip-needed row,
/// then re-key the whole file by its now-canonical orientation.
///
/// `flipped` and `biallelic` are row index sets from orientation
/// resolution; the record slice covers the entire file, not only the
/// biallelic subset, because downstream instruction files need every row
/// expressed in the corrected orientation.
pub fn apply_alignment(
    records: &mut [VariantRecord],
    flipped: &[usize],
    biallelic: &[usize],
) -> AlignmentOutcome {
    for &index in flipped {
        records[index].flip_alleles();
    }

    let row_keys: Vec<String> = records.iter().map(|record| record.canonical_key()).collect();
    let biallelic_keys: Vec<String> = biallelic.iter().map(|&index| row_keys[index].clone()).collect();
    let flipped_keys: Vec<String> = flipped.iter().map(|&index| row_keys[index].clone()).collect();

    // two originally distinct rows landing on one canonical key means the
    // source file carried duplicate submissions
    let mut key_counts: FxHashMap<&str, usize> = FxHashMap::default();
    for key in &row_keys {
        *key_counts.entry(key.as_str()).or_default() += 1;
    }
    let mut duplicate_keys: Vec<String> = key_counts
        .iter()
        .filter(|&(_, &count)| count > 1)
        .map(|(&key, _)| key.to_string())
        .collect();
    duplicate_keys.sort_unstable();

    let mut duplicate_biallelic_keys = Vec::new();
    if !duplicate_keys.is_empty() {
        let duplicated_rows: usize = duplicate_keys
            .iter()
            .map(|key| key_counts[key.as_str()])
            .sum();
        warn!(
            "{} duplication events exist in the original file after alignment",
            duplicated_rows
        );

        let biallelic_set: FxHashSet<&str> = biallelic_keys.iter().map(|key| key.as_str()).collect();
        duplicate_biallelic_keys = duplicate_keys
            .iter()
            .filter(|key| biallelic_set.contains(key.as_str()))
            .cloned()
            .collect();
        warn!(
            "Of the duplicated canonical keys, {} belong to accepted biallelic sites",
            duplicate_biallelic_keys.len()
        );
    }

    AlignmentOutcome {
        row_keys,
        biallelic_keys,
        flipped_keys,
        duplicate_keys,
        duplicate_biallelic_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn record(pos: u64, id: &str, ref_allele: &str, alt_allele: &str, beta: Option<f64>) -> VariantRecord {
        VariantRecord {
            chrom: "2".to_string(),
            pos,
            id: id.to_string(),
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            beta,
        }
    }

    #[rstest]
    fn test_flip_rewrites_alleles_and_beta() {
        let mut records = vec![
            record(500, "rs1", "T", "G", Some(1.5)),
            record(600, "rs2", "A", "C", Some(-0.5)),
        ];
        let outcome = apply_alignment(&mut records, &[0], &[0, 1]);

        assert_eq!(records[0].ref_allele, "G");
        assert_eq!(records[0].alt_allele, "T");
        assert_eq!(records[0].beta, Some(-1.5));
        // untouched row keeps its orientation and sign
        assert_eq!(records[1].ref_allele, "A");
        assert_eq!(records[1].beta, Some(-0.5));

        assert_eq!(outcome.row_keys, vec!["2:500:G:T", "2:600:A:C"]);
        assert_eq!(outcome.flipped_keys, vec!["2:500:G:T"]);
        assert_eq!(outcome.biallelic_keys, vec!["2:500:G:T", "2:600:A:C"]);
        assert!(outcome.duplicate_keys.is_empty());
    }

    #[rstest]
    fn test_post_flip_collision_is_reported() {
        // rows 0 and 1 are the same variant in opposite orientations; only
        // row 0 was accepted as biallelic, row 1 flips onto the same key
        let mut records = vec![
            record(500, "rs1", "G", "T", None),
            record(500, "rs1", "T", "G", None),
            record(600, "rs2", "A", "C", None),
        ];
        let outcome = apply_alignment(&mut records, &[1], &[0]);

        assert_eq!(outcome.row_keys[0], outcome.row_keys[1]);
        assert_eq!(outcome.duplicate_keys, vec!["2:500:G:T"]);
        assert_eq!(outcome.duplicate_biallelic_keys, vec!["2:500:G:T"]);
    }
}
