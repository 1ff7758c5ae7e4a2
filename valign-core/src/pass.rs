//! One realignment pass over one chromosome-level file.
//!
//! The pass holds the table plus each stage's outcome and enforces the
//! stage contract: clean before orient, orient before align. Stages are
//! pure; only `align` mutates the table (the allele swaps).

use crate::align::{AlignmentOutcome, apply_alignment};
use crate::clean::{CleanOutcome, clean};
use crate::errors::{CoreError, Result};
use crate::models::VariantTable;
use crate::orient::{OrientationLookup, OrientationOutcome, orient};

#[derive(Debug)]
pub struct RealignPass {
    table: VariantTable,
    cleaned: Option<CleanOutcome>,
    orientation: Option<OrientationOutcome>,
    alignment: Option<AlignmentOutcome>,
}

impl RealignPass {
    pub fn new(table: VariantTable) -> Self {
        RealignPass {
            table,
            cleaned: None,
            orientation: None,
            alignment: None,
        }
    }

    pub fn table(&self) -> &VariantTable {
        &self.table
    }

    pub fn chrom(&self) -> &str {
        &self.table.chrom
    }

    /// Data-quality filtering down to biallelic candidates.
    pub fn clean(&mut self) -> &CleanOutcome {
        self.cleaned = Some(clean(&self.table.records));
        self.cleaned.as_ref().unwrap()
    }

    /// Resolve candidate orientation against the chromosome dictionary.
    pub fn orient<L: OrientationLookup>(&mut self, dictionary: &L) -> Result<&OrientationOutcome> {
        let cleaned = self
            .cleaned
            .as_ref()
            .ok_or(CoreError::StageOrder("orient() requires clean() first"))?;
        self.orientation = Some(orient(&self.table.records, &cleaned.candidates, dictionary));
        Ok(self.orientation.as_ref().unwrap())
    }

    /// Apply the allele swaps and re-key the file canonically.
    pub fn align(&mut self) -> Result<&AlignmentOutcome> {
        let orientation = self
            .orientation
            .as_ref()
            .ok_or(CoreError::StageOrder("align() requires orient() first"))?;
        let biallelic = orientation.biallelic_indices();
        self.alignment = Some(apply_alignment(
            &mut self.table.records,
            &orientation.flipped,
            &biallelic,
        ));
        Ok(self.alignment.as_ref().unwrap())
    }

    pub fn clean_outcome(&self) -> Option<&CleanOutcome> {
        self.cleaned.as_ref()
    }

    pub fn orientation(&self) -> Option<&OrientationOutcome> {
        self.orientation.as_ref()
    }

    pub fn alignment(&self) -> Option<&AlignmentOutcome> {
        self.alignment.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileKind, VariantRecord};
    use crate::orient::OrientationLookup;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct EmptyDictionary;

    impl OrientationLookup for EmptyDictionary {
        fn contains_key(&self, _key: &str) -> bool {
            false
        }
        fn contains_position(&self, _pos: u64) -> bool {
            false
        }
    }

    #[fixture]
    fn table() -> VariantTable {
        VariantTable {
            kind: FileKind::Pvar,
            chrom: "1".to_string(),
            records: vec![VariantRecord {
                chrom: "1".to_string(),
                pos: 100,
                id: "rs1".to_string(),
                ref_allele: "A".to_string(),
                alt_allele: "C".to_string(),
                beta: None,
            }],
        }
    }

    #[rstest]
    fn test_orient_before_clean_is_a_contract_violation(table: VariantTable) {
        let mut pass = RealignPass::new(table);
        let err = pass.orient(&EmptyDictionary);
        assert!(matches!(err, Err(CoreError::StageOrder(_))));
    }

    #[rstest]
    fn test_align_before_orient_is_a_contract_violation(table: VariantTable) {
        let mut pass = RealignPass::new(table);
        pass.clean();
        let err = pass.align();
        assert!(matches!(err, Err(CoreError::StageOrder(_))));
    }

    #[rstest]
    fn test_staged_pass_reaches_alignment(table: VariantTable) {
        let mut pass = RealignPass::new(table);
        pass.clean();
        pass.orient(&EmptyDictionary).unwrap();
        let alignment = pass.align().unwrap();
        assert_eq!(alignment.biallelic_keys, vec!["1:100:A:C"]);
    }
}
