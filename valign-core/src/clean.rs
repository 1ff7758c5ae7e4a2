//! Data-quality filtering: narrows a chromosome file down to the set of
//! unambiguous biallelic SNV candidates that are worth resolving against
//! the chromosome dictionary.
//!
//! Every stage is a pure function over the record slice: it takes the
//! indices still in play and returns which of them it accepts and which it
//! rejects, with a reason per rejection. Nothing here mutates the table.

use fxhash::{FxHashMap, FxHashSet};
use log::info;

use crate::consts::HETEROZYGOUS_PAIRS;
use crate::models::VariantRecord;

/// Why a row was excluded from the biallelic candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// REF or ALT is not a single character from {A,C,G,T}.
    NotSnv,
    /// The row's identifier also appears at another location (or its
    /// location carries such an identifier), so ids cannot disambiguate.
    AmbiguousId,
    /// The location carries more than one distinct allele pair.
    Multiallelic,
    /// A surviving copy of a row already accepted for the same site.
    RedundantDuplicate,
    /// REF equals ALT, e.g. A/A.
    HomozygousPair,
}

/// Accepted and rejected indices of one filtering stage. Index vectors are
/// ascending; every input index lands in exactly one of the two.
#[derive(Debug, Default)]
pub struct StageOutcome {
    pub accepted: Vec<usize>,
    pub rejected: Vec<(usize, RejectReason)>,
}

/// The composite outcome of the full cleaning pass.
#[derive(Debug, Default)]
pub struct CleanOutcome {
    /// Candidate biallelic row indices, ascending.
    pub candidates: Vec<usize>,
    pub rejected: Vec<(usize, RejectReason)>,
}

/// Keep only single-nucleotide rows with alleles in {A,C,G,T}. Rows with
/// REF == ALT are let through here; they are culled after extraction so
/// the count of homozygous-looking sites can be reported.
pub fn filter_snvs(records: &[VariantRecord]) -> StageOutcome {
    let mut outcome = StageOutcome::default();
    for (index, record) in records.iter().enumerate() {
        if record.is_snv() {
            outcome.accepted.push(index);
        } else {
            outcome.rejected.push((index, RejectReason::NotSnv));
        }
    }
    outcome
}

/// Drop every location whose identifiers cannot disambiguate it.
///
/// Locations are nodes and identifiers edges of a bipartite relation: a
/// location is valid only if every identifier attached to it maps back to
/// exactly that one location. An identifier with fan-out > 1 invalidates
/// all the locations it touches.
pub fn filter_ambiguous_ids(records: &[VariantRecord], candidates: &[usize]) -> StageOutcome {
    let mut location_to_ids: FxHashMap<String, FxHashSet<&str>> = FxHashMap::default();
    let mut id_to_locations: FxHashMap<&str, FxHashSet<String>> = FxHashMap::default();

    for &index in candidates {
        let record = &records[index];
        let location = record.location_key();
        location_to_ids
            .entry(location.clone())
            .or_default()
            .insert(record.id.as_str());
        id_to_locations
            .entry(record.id.as_str())
            .or_default()
            .insert(location);
    }

    let mut valid_locations: FxHashSet<&str> = FxHashSet::default();
    for (location, ids) in &location_to_ids {
        let valid = ids.iter().all(|id| {
            let reachable = &id_to_locations[id];
            reachable.len() == 1 && reachable.contains(location)
        });
        if valid {
            valid_locations.insert(location.as_str());
        }
    }

    let mut outcome = StageOutcome::default();
    for &index in candidates {
        if valid_locations.contains(records[index].location_key().as_str()) {
            outcome.accepted.push(index);
        } else {
            outcome.rejected.push((index, RejectReason::AmbiguousId));
        }
    }

    info!(
        "{}/{} rows survived identifier ambiguity filtering",
        outcome.accepted.len(),
        candidates.len()
    );

    outcome
}

/// The multi-stage deduplication that narrows a location-level record set
/// down to true biallelic sites.
///
/// 1. partition by full duplication on (pos, ref, alt), keeping the first
///    occurrence of each fully duplicated group as its representative;
/// 2. recombine representatives with the rows unique by full key and
///    partition again by position alone; rows unique at a position are
///    accepted outright;
/// 3. a position still carrying several rows is accepted only when every
///    row shares one sorted allele pair and that pair is one of the six
///    heterozygous pairs; the site then keeps its first row, everything
///    else at a surviving site is a redundant duplicate. Any other
///    multi-row position is rejected as multiallelic.
pub fn extract_biallelic_candidates(records: &[VariantRecord], candidates: &[usize]) -> StageOutcome {
    info!(
        "Beginning biallelic candidate extraction: {} rows under investigation",
        candidates.len()
    );

    // group by the full (pos, ref, alt) key; candidate order keeps each
    // group's indices ascending so group[0] is the numerically first row
    let mut full_key_groups: FxHashMap<(u64, &str, &str), Vec<usize>> = FxHashMap::default();
    for &index in candidates {
        let record = &records[index];
        full_key_groups
            .entry((
                record.pos,
                record.ref_allele.as_str(),
                record.alt_allele.as_str(),
            ))
            .or_default()
            .push(index);
    }

    let mut outcome = StageOutcome::default();
    let mut pool: Vec<usize> = Vec::with_capacity(full_key_groups.len());
    let mut fully_duplicated = 0usize;
    for group in full_key_groups.values() {
        pool.push(group[0]);
        if group.len() > 1 {
            fully_duplicated += group.len();
            for &shadowed in &group[1..] {
                outcome
                    .rejected
                    .push((shadowed, RejectReason::RedundantDuplicate));
            }
        }
    }
    info!(
        "{} rows were duplicated by (chr, pos, ref, alt); one representative kept per allele pair",
        fully_duplicated
    );

    let mut position_groups: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    pool.sort_unstable();
    for &index in &pool {
        position_groups
            .entry(records[index].pos)
            .or_default()
            .push(index);
    }

    let mut accepted_unique = 0usize;
    let mut accepted_transposed = 0usize;
    let mut rejected_multiallelic = 0usize;
    for group in position_groups.values() {
        if group.len() == 1 {
            outcome.accepted.push(group[0]);
            accepted_unique += 1;
            continue;
        }

        // same SNP submitted with ref/alt transposed across rows?
        let sorted_keys: FxHashSet<String> = group
            .iter()
            .map(|&index| records[index].sorted_allele_key())
            .collect();
        let single_pair = sorted_keys.len() == 1
            && HETEROZYGOUS_PAIRS.contains(&sorted_keys.iter().next().unwrap().as_str());

        if single_pair {
            outcome.accepted.push(group[0]);
            accepted_transposed += 1;
            for &shadowed in &group[1..] {
                outcome
                    .rejected
                    .push((shadowed, RejectReason::RedundantDuplicate));
            }
        } else {
            rejected_multiallelic += group.len();
            for &index in group {
                outcome.rejected.push((index, RejectReason::Multiallelic));
            }
        }
    }

    info!(
        "Extracted {} biallelic sites unduplicated by position and {} sites duplicated only through ref/alt transposition; {} rows rejected as multiallelic",
        accepted_unique, accepted_transposed, rejected_multiallelic
    );

    outcome.accepted.sort_unstable();
    outcome.rejected.sort_unstable_by_key(|(index, _)| *index);
    outcome
}

/// The full cleaning pass: SNV filter, ambiguity filter, biallelic
/// extraction, then a final cull of homozygous-looking survivors.
pub fn clean(records: &[VariantRecord]) -> CleanOutcome {
    info!("Total rows in this chromosome file: {}", records.len());

    let snvs = filter_snvs(records);
    let unambiguous = filter_ambiguous_ids(records, &snvs.accepted);
    let extracted = extract_biallelic_candidates(records, &unambiguous.accepted);

    let mut outcome = CleanOutcome {
        candidates: Vec::with_capacity(extracted.accepted.len()),
        rejected: Vec::new(),
    };
    outcome.rejected.extend(snvs.rejected);
    outcome.rejected.extend(unambiguous.rejected);
    outcome.rejected.extend(extracted.rejected);

    let mut homozygous = 0usize;
    for index in extracted.accepted {
        if records[index].ref_allele == records[index].alt_allele {
            homozygous += 1;
            outcome.rejected.push((index, RejectReason::HomozygousPair));
        } else {
            outcome.candidates.push(index);
        }
    }
    if homozygous > 0 {
        info!("{} homozygous-looking sites (AA/CC/GG/TT) removed", homozygous);
    }

    outcome.rejected.sort_unstable_by_key(|(index, _)| *index);
    info!(
        "Cleaning complete: {} biallelic candidates, {} rows rejected",
        outcome.candidates.len(),
        outcome.rejected.len()
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

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

    fn reasons(outcome: &CleanOutcome) -> Vec<(usize, RejectReason)> {
        outcome.rejected.clone()
    }

    #[rstest]
    fn test_snv_filter_drops_indels() {
        let records = vec![record(100, "rs1", "A", "C"), record(200, "rs2", "AT", "A")];
        let outcome = filter_snvs(&records);
        assert_eq!(outcome.accepted, vec![0]);
        assert_eq!(outcome.rejected, vec![(1, RejectReason::NotSnv)]);
    }

    #[rstest]
    fn test_shared_id_drops_both_locations() {
        // rs1 appears at positions 100 and 300: both locations must go,
        // including the innocent rs2 row sitting at position 100
        let records = vec![
            record(100, "rs1", "A", "C"),
            record(100, "rs2", "A", "G"),
            record(300, "rs1", "G", "T"),
            record(500, "rs3", "C", "T"),
        ];
        let outcome = filter_ambiguous_ids(&records, &[0, 1, 2, 3]);
        assert_eq!(outcome.accepted, vec![3]);
        assert_eq!(
            outcome.rejected,
            vec![
                (0, RejectReason::AmbiguousId),
                (1, RejectReason::AmbiguousId),
                (2, RejectReason::AmbiguousId),
            ]
        );
    }

    #[rstest]
    fn test_transposed_pair_is_one_biallelic_site() {
        // the same SNP submitted twice with ref/alt swapped
        let records = vec![record(100, "rs1", "A", "C"), record(100, "rs1", "C", "A")];
        let outcome = clean(&records);
        assert_eq!(outcome.candidates, vec![0]);
        assert_eq!(reasons(&outcome), vec![(1, RejectReason::RedundantDuplicate)]);
    }

    #[rstest]
    fn test_duplicated_homozygous_pair_is_rejected() {
        let records = vec![record(100, "rs1", "A", "A"), record(100, "rs1", "A", "A")];
        let outcome = clean(&records);
        assert_eq!(outcome.candidates, Vec::<usize>::new());
        // the representative survives extraction and is then culled as
        // homozygous; its duplicate is shadowed earlier
        assert!(
            outcome
                .rejected
                .contains(&(0, RejectReason::HomozygousPair))
        );
        assert!(
            outcome
                .rejected
                .contains(&(1, RejectReason::RedundantDuplicate))
        );
    }

    #[rstest]
    fn test_multiallelic_location_is_rejected() {
        let records = vec![
            record(100, "rs1", "A", "C"),
            record(100, "rs2", "A", "G"),
            record(200, "rs3", "G", "T"),
        ];
        let outcome = clean(&records);
        assert_eq!(outcome.candidates, vec![2]);
        assert_eq!(
            reasons(&outcome),
            vec![
                (0, RejectReason::Multiallelic),
                (1, RejectReason::Multiallelic),
            ]
        );
    }

    #[rstest]
    fn test_full_duplicates_collapse_to_one_row() {
        // same allele pair submitted under two identifiers; ambiguity
        // filtering keeps the location (both ids map only there) and the
        // extractor absorbs the duplicate
        let records = vec![record(100, "rs1", "A", "C"), record(100, "rs1b", "A", "C")];
        let outcome = clean(&records);
        assert_eq!(outcome.candidates, vec![0]);
        assert_eq!(reasons(&outcome), vec![(1, RejectReason::RedundantDuplicate)]);
    }

    #[rstest]
    fn test_every_row_is_accounted_for() {
        let records = vec![
            record(100, "rs1", "A", "C"),
            record(100, "rs1", "C", "A"),
            record(200, "rs2", "ATG", "A"),
            record(300, "rs3", "G", "G"),
            record(400, "rs4", "C", "T"),
        ];
        let outcome = clean(&records);
        let mut seen: Vec<usize> = outcome
            .candidates
            .iter()
            .copied()
            .chain(outcome.rejected.iter().map(|(index, _)| *index))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
