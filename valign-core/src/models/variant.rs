use crate::consts::is_valid_allele;
use crate::errors::{CoreError, Result};

///
/// One variant row from a cohort file. `beta` is present only for
/// summary-statistic files; its sign is tied to which allele is REF.
///
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt_allele: String,
    pub beta: Option<f64>,
}

impl VariantRecord {
    /// `chr:pos` key, shared by every allele pair at one physical location.
    pub fn location_key(&self) -> String {
        format!("{}:{}", self.chrom, self.pos)
    }

    /// Order-sensitive `chr:pos:ref:alt` key in the record's current
    /// orientation.
    pub fn canonical_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.chrom, self.pos, self.ref_allele, self.alt_allele
        )
    }

    /// `chr:pos:alt:ref` key, the opposite orientation.
    pub fn reverse_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.chrom, self.pos, self.alt_allele, self.ref_allele
        )
    }

    /// The two alleles in fixed alphabetical order (e.g. `"AC"` for both
    /// A/C and C/A). Orientation-independent, used for ambiguity checks.
    pub fn sorted_allele_key(&self) -> String {
        let mut pair = [self.ref_allele.as_str(), self.alt_allele.as_str()];
        pair.sort();
        pair.concat()
    }

    /// True when both alleles are single characters from {A,C,G,T}.
    /// Indels and multi-character alleles are rejected upstream on this.
    pub fn is_snv(&self) -> bool {
        is_valid_allele(&self.ref_allele) && is_valid_allele(&self.alt_allele)
    }

    /// Swap which allele is REF vs ALT, negating the effect size when one
    /// is carried (its sign is measured against the reference allele).
    pub fn flip_alleles(&mut self) {
        std::mem::swap(&mut self.ref_allele, &mut self.alt_allele);
        if let Some(beta) = self.beta.as_mut() {
            *beta = -*beta;
        }
    }
}

/// Reverse the ref/alt fields of a `chr:pos:ref:alt` key.
pub fn reverse_canonical_key(key: &str) -> Result<String> {
    let parts: Vec<&str> = key.split(':').collect();
    if parts.len() != 4 {
        return Err(CoreError::MalformedKey(key.to_string()));
    }
    Ok(format!("{}:{}:{}:{}", parts[0], parts[1], parts[3], parts[2]))
}

/// A canonical key is palindromic when its allele pair is A/T or C/G,
/// for which orientation cannot be inferred from sequence alone.
pub fn is_palindromic_key(key: &str) -> bool {
    let parts: Vec<&str> = key.split(':').collect();
    if parts.len() != 4 {
        return false;
    }
    let mut pair = [parts[2], parts[3]];
    pair.sort();
    matches!(pair.concat().as_str(), "AT" | "CG")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn record() -> VariantRecord {
        VariantRecord {
            chrom: "1".to_string(),
            pos: 100,
            id: "rs1".to_string(),
            ref_allele: "C".to_string(),
            alt_allele: "A".to_string(),
            beta: Some(0.25),
        }
    }

    #[rstest]
    fn test_keys(record: VariantRecord) {
        assert_eq!(record.location_key(), "1:100");
        assert_eq!(record.canonical_key(), "1:100:C:A");
        assert_eq!(record.reverse_key(), "1:100:A:C");
        assert_eq!(record.sorted_allele_key(), "AC");
    }

    #[rstest]
    fn test_flip_swaps_alleles_and_negates_beta(mut record: VariantRecord) {
        record.flip_alleles();
        assert_eq!(record.ref_allele, "A");
        assert_eq!(record.alt_allele, "C");
        assert_eq!(record.beta, Some(-0.25));
    }

    #[rstest]
    fn test_reverse_canonical_key() {
        assert_eq!(reverse_canonical_key("2:500:G:T").unwrap(), "2:500:T:G");
        assert!(reverse_canonical_key("2:500:G").is_err());
    }

    #[rstest]
    #[case("1:100:A:T", true)]
    #[case("1:100:G:C", true)]
    #[case("1:100:A:C", false)]
    fn test_palindromic(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(is_palindromic_key(key), expected);
    }
}
