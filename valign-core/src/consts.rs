/// Chromosome labels recognized by valign. Files carrying any other label
/// are rejected at parse time.
pub const CHROMOSOMES: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT",
];

/// Columns every input file must carry after remapping.
pub const MANDATORY_COLUMNS: [&str; 5] = ["CHR", "POS", "ID", "REF", "ALT"];

/// Effect-size column, mandatory for summary-statistic files only.
pub const BETA_COLUMN: &str = "BETA";

/// The six valid heterozygous sorted allele pairs. Homozygous-looking
/// pairs (AA, CC, GG, TT) are never valid biallelic sites.
pub const HETEROZYGOUS_PAIRS: [&str; 6] = ["AC", "AG", "AT", "CG", "CT", "GT"];

/// Leading comment prefixes skipped by default when parsing.
pub const DEFAULT_COMMENT_PREFIXES: [&str; 1] = ["##"];

pub fn is_recognized_chromosome(label: &str) -> bool {
    CHROMOSOMES.contains(&label)
}

pub fn is_valid_allele(allele: &str) -> bool {
    matches!(allele, "A" | "C" | "G" | "T")
}
