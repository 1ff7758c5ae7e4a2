//! Duplicate-identifier reconciliation.
//!
//! Downstream reorientation instruction files must carry unique original
//! identifiers. When a cohort repeats an identifier, the repeats may be
//! exact (same canonical key) or may span distinct keys, of which at most
//! one is the accepted biallelic orientation. Each row gets an explicit
//! decision so the rule set stays auditable.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use fxhash::{FxHashMap, FxHashSet};
use log::info;

/// Per-row verdict of the reconciliation pass, in rule order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdDecision {
    /// The identifier is not duplicated; the row passes through.
    KeepUnique,
    /// First occurrence of an exactly repeated (id, key) pair.
    KeepFirstOfExactDuplicates,
    /// The identifier maps to several distinct keys and this row carries
    /// the accepted biallelic one.
    KeepBiallelic,
    /// No biallelic key resolved this identifier; its first remaining
    /// occurrence is kept to avoid silent data loss.
    KeepFirstFallback,
    /// Later occurrence of an exactly repeated (id, key) pair.
    DropExactDuplicate,
    /// A non-biallelic duplicate whose identifier was already kept.
    DropShadowed,
}

impl IdDecision {
    pub fn is_keep(&self) -> bool {
        matches!(
            self,
            IdDecision::KeepUnique
                | IdDecision::KeepFirstOfExactDuplicates
                | IdDecision::KeepBiallelic
                | IdDecision::KeepFirstFallback
        )
    }
}

/// Human-readable summary of identifier duplication in one file.
#[derive(Debug, Default)]
pub struct DuplicationReport {
    /// Times each duplicated identifier occurred in the original file.
    pub id_counts: BTreeMap<String, usize>,
    /// Duplicated identifier -> canonical keys, for keys that are
    /// accepted biallelic sites.
    pub biallelic_mappings: BTreeMap<String, BTreeSet<String>>,
    /// Duplicated identifier -> canonical keys, for keys that are not.
    pub other_mappings: BTreeMap<String, BTreeSet<String>>,
}

impl DuplicationReport {
    pub fn is_empty(&self) -> bool {
        self.id_counts.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "Original file duplication ID incidences:\n")?;
        for (id, count) in &self.id_counts {
            writeln!(writer, "{}\t{}", id, count)?;
        }

        writeln!(writer, "\nOriginal ID to canonical key unique incidence mappings:")?;
        for (section, mappings) in [
            ("Biallelic_Duplicate", &self.biallelic_mappings),
            ("NOT_Biallelic_Duplicate", &self.other_mappings),
        ] {
            if mappings.is_empty() {
                continue;
            }
            writeln!(writer, "\n{}\n", section)?;
            for (id, keys) in mappings {
                let keys: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
                writeln!(writer, "{}\t{}", id, keys.join(","))?;
            }
        }
        Ok(())
    }
}

/// Outcome of reconciliation: one decision per input row plus the indices
/// of the kept rows (ascending).
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub kept: Vec<usize>,
    pub decisions: Vec<IdDecision>,
    pub report: DuplicationReport,
}

/// Reduce `(original id, canonical key)` rows to a subset with unique
/// identifiers, preferring accepted biallelic orientations.
pub fn reconcile_ids(rows: &[(String, String)], biallelic: &FxHashSet<String>) -> ReconcileOutcome {
    let mut id_counts: FxHashMap<&str, usize> = FxHashMap::default();
    for (id, _) in rows {
        *id_counts.entry(id.as_str()).or_default() += 1;
    }

    let mut decisions = vec![IdDecision::KeepUnique; rows.len()];
    let mut report = DuplicationReport::default();

    // rule 1: undisputed identifiers pass through; everything else is
    // reported and queued for the duplicate rules
    let mut disputed: Vec<usize> = Vec::new();
    for (index, (id, key)) in rows.iter().enumerate() {
        if id_counts[id.as_str()] == 1 {
            continue;
        }
        disputed.push(index);
        report.id_counts.insert(id.clone(), id_counts[id.as_str()]);
        let mappings = if biallelic.contains(key) {
            &mut report.biallelic_mappings
        } else {
            &mut report.other_mappings
        };
        mappings.entry(id.clone()).or_default().insert(key.clone());
    }

    // rule 2: drop exact (id, key) repeats, keeping the first occurrence
    let mut seen_pairs: FxHashSet<(&str, &str)> = FxHashSet::default();
    let mut pool: Vec<usize> = Vec::new();
    for &index in &disputed {
        let (id, key) = &rows[index];
        if seen_pairs.insert((id.as_str(), key.as_str())) {
            pool.push(index);
        } else {
            decisions[index] = IdDecision::DropExactDuplicate;
        }
    }

    // identifiers now unique within the pool are settled
    let mut pool_id_counts: FxHashMap<&str, usize> = FxHashMap::default();
    for &index in &pool {
        *pool_id_counts.entry(rows[index].0.as_str()).or_default() += 1;
    }
    let contested: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&index| {
            if pool_id_counts[rows[index].0.as_str()] == 1 {
                decisions[index] = IdDecision::KeepFirstOfExactDuplicates;
                false
            } else {
                true
            }
        })
        .collect();

    if !contested.is_empty() {
        info!(
            "Duplicated original identifiers mapping to distinct canonical keys: {} rows",
            contested.len()
        );
    }

    // rule 3: among identifiers spanning distinct keys, the biallelic
    // orientation wins; resolve first so later non-biallelic repeats of a
    // resolved identifier are dropped rather than kept as fallback
    let mut resolved: FxHashSet<&str> = FxHashSet::default();
    for &index in &contested {
        let (id, key) = &rows[index];
        if biallelic.contains(key) {
            decisions[index] = IdDecision::KeepBiallelic;
            resolved.insert(id.as_str());
        }
    }

    let mut fallback_kept: FxHashSet<&str> = FxHashSet::default();
    for &index in &contested {
        let (id, key) = &rows[index];
        if biallelic.contains(key) {
            continue;
        }
        if resolved.contains(id.as_str()) || !fallback_kept.insert(id.as_str()) {
            decisions[index] = IdDecision::DropShadowed;
        } else {
            decisions[index] = IdDecision::KeepFirstFallback;
        }
    }

    let kept: Vec<usize> = (0..rows.len())
        .filter(|&index| decisions[index].is_keep())
        .collect();

    ReconcileOutcome {
        kept,
        decisions,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(id, key)| (id.to_string(), key.to_string()))
            .collect()
    }

    fn biallelic(keys: &[&str]) -> FxHashSet<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[rstest]
    fn test_unique_ids_pass_through() {
        let rows = rows(&[("rs1", "1:100:A:C"), ("rs2", "1:200:G:T")]);
        let outcome = reconcile_ids(&rows, &biallelic(&["1:100:A:C"]));
        assert_eq!(outcome.kept, vec![0, 1]);
        assert!(outcome.report.is_empty());
    }

    #[rstest]
    fn test_exact_duplicates_keep_first() {
        let rows = rows(&[("rs1", "1:100:A:C"), ("rs1", "1:100:A:C")]);
        let outcome = reconcile_ids(&rows, &biallelic(&["1:100:A:C"]));
        assert_eq!(outcome.kept, vec![0]);
        assert_eq!(outcome.decisions[0], IdDecision::KeepFirstOfExactDuplicates);
        assert_eq!(outcome.decisions[1], IdDecision::DropExactDuplicate);
        assert_eq!(outcome.report.id_counts["rs1"], 2);
    }

    #[rstest]
    fn test_biallelic_orientation_wins() {
        // rs1 maps to two distinct keys; only the second is biallelic
        let rows = rows(&[
            ("rs1", "1:100:C:A"),
            ("rs1", "1:100:A:C"),
            ("rs2", "1:300:G:T"),
        ]);
        let outcome = reconcile_ids(&rows, &biallelic(&["1:100:A:C", "1:300:G:T"]));
        assert_eq!(outcome.kept, vec![1, 2]);
        assert_eq!(outcome.decisions[0], IdDecision::DropShadowed);
        assert_eq!(outcome.decisions[1], IdDecision::KeepBiallelic);
    }

    #[rstest]
    fn test_fallback_keeps_first_occurrence_once() {
        // neither key is biallelic: keep the first to avoid data loss
        let rows = rows(&[
            ("rs1", "1:100:C:A"),
            ("rs1", "1:100:C:G"),
        ]);
        let outcome = reconcile_ids(&rows, &biallelic(&[]));
        assert_eq!(outcome.kept, vec![0]);
        assert_eq!(outcome.decisions[0], IdDecision::KeepFirstFallback);
        assert_eq!(outcome.decisions[1], IdDecision::DropShadowed);
    }

    #[rstest]
    fn test_report_sections_split_by_biallelic_membership() {
        let rows = rows(&[
            ("rs1", "1:100:A:C"),
            ("rs1", "1:100:C:A"),
            ("rs2", "1:200:G:T"),
            ("rs2", "1:200:G:T"),
        ]);
        let outcome = reconcile_ids(&rows, &biallelic(&["1:100:A:C"]));

        assert_eq!(
            outcome.report.biallelic_mappings["rs1"],
            BTreeSet::from(["1:100:A:C".to_string()])
        );
        assert_eq!(
            outcome.report.other_mappings["rs1"],
            BTreeSet::from(["1:100:C:A".to_string()])
        );
        assert_eq!(
            outcome.report.other_mappings["rs2"],
            BTreeSet::from(["1:200:G:T".to_string()])
        );

        let mut rendered = Vec::new();
        outcome.report.write_to(&mut rendered).unwrap();
        let rendered = String::from_utf8(rendered).unwrap();
        assert!(rendered.contains("rs1\t2"));
        assert!(rendered.contains("Biallelic_Duplicate"));
    }
}
