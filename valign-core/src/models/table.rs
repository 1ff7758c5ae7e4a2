use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::consts::{BETA_COLUMN, DEFAULT_COMMENT_PREFIXES, MANDATORY_COLUMNS, is_recognized_chromosome};
use crate::errors::{CoreError, Result};
use crate::models::variant::VariantRecord;
use crate::utils::{effective_extension, get_dynamic_reader};

/// Supported cohort file kinds. Summary-statistic files additionally
/// carry a BETA column whose sign depends on allele orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pvar,
    Ssf,
}

impl FileKind {
    /// Resolve the kind from the file extension (`.gz` is ignored).
    pub fn detect(path: &Path) -> Result<Self> {
        match effective_extension(path).as_deref() {
            Some("pvar") => Ok(FileKind::Pvar),
            Some("ssf") => Ok(FileKind::Ssf),
            _ => Err(CoreError::UnknownFileKind(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pvar => "pvar",
            FileKind::Ssf => "ssf",
        }
    }
}

/// Parsing options: leading comment prefixes to skip and an optional
/// column-name mapping table for files deviating from the standard header.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub comment_prefixes: Vec<String>,
    pub mapping: Option<HashMap<String, String>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            comment_prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mapping: None,
        }
    }
}

impl ReadOptions {
    /// Load a whitespace-separated two-column mapping file registering
    /// non-standard column names to the valign standard.
    pub fn with_mapping_file(mut self, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut mapping = HashMap::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(from), Some(to)) => {
                    mapping.insert(from.to_string(), to.to_string());
                }
                _ => {
                    return Err(CoreError::MalformedRow {
                        line: index + 1,
                        reason: format!("mapping line needs two columns, found: {:?}", line),
                    });
                }
            }
        }
        self.mapping = Some(mapping);
        Ok(self)
    }
}

///
/// All variant rows of one chromosome-level cohort file, in file order.
/// A table never holds more than one chromosome; this is enforced at load.
///
#[derive(Debug, Clone)]
pub struct VariantTable {
    pub kind: FileKind,
    pub chrom: String,
    pub records: Vec<VariantRecord>,
}

impl VariantTable {
    pub fn from_file(path: &Path, kind: FileKind, options: &ReadOptions) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut lines = reader.lines().enumerate();

        // skip contiguous leading comment lines, then take the header
        let (header_line_no, header) = loop {
            match lines.next() {
                Some((index, line)) => {
                    let line = line?;
                    let is_comment = options
                        .comment_prefixes
                        .iter()
                        .any(|prefix| line.starts_with(prefix.as_str()));
                    if !is_comment {
                        break (index, line);
                    }
                }
                None => return Err(CoreError::EmptyTable(path.display().to_string())),
            }
        };

        let columns = Self::resolve_columns(&header, kind, options)?;

        let mut chrom: Option<String> = None;
        let mut records = Vec::new();

        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let record = Self::parse_row(&fields, &columns, index + 1)?;

            match chrom.as_deref() {
                None => chrom = Some(record.chrom.clone()),
                Some(seen) if seen != record.chrom => {
                    return Err(CoreError::MultipleChromosomes(
                        seen.to_string(),
                        record.chrom.clone(),
                    ));
                }
                _ => {}
            }

            records.push(record);
        }

        let chrom = chrom.ok_or_else(|| CoreError::EmptyTable(path.display().to_string()))?;
        if !is_recognized_chromosome(&chrom) {
            return Err(CoreError::UnknownChromosome(chrom));
        }

        info!(
            "Loaded {} variant rows for chromosome {} from {} ({} header at line {})",
            records.len(),
            chrom,
            path.display(),
            kind.as_str(),
            header_line_no + 1
        );

        Ok(VariantTable {
            kind,
            chrom,
            records,
        })
    }

    fn resolve_columns(header: &str, kind: FileKind, options: &ReadOptions) -> Result<ColumnIndex> {
        let names: Vec<String> = header
            .split('\t')
            .map(|name| {
                let name = name.trim();
                match &options.mapping {
                    Some(mapping) => mapping.get(name).cloned().unwrap_or(name.to_string()),
                    None => name.to_string(),
                }
            })
            .collect();

        let find = |wanted: &str| names.iter().position(|name| name == wanted);

        let missing: Vec<&str> = MANDATORY_COLUMNS
            .iter()
            .copied()
            .filter(|column| find(column).is_none())
            .chain(
                (kind == FileKind::Ssf && find(BETA_COLUMN).is_none())
                    .then_some(BETA_COLUMN),
            )
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::MissingColumns(missing.join(", ")));
        }

        Ok(ColumnIndex {
            chrom: find("CHR").unwrap(),
            pos: find("POS").unwrap(),
            id: find("ID").unwrap(),
            ref_allele: find("REF").unwrap(),
            alt_allele: find("ALT").unwrap(),
            beta: match kind {
                FileKind::Ssf => find(BETA_COLUMN),
                FileKind::Pvar => None,
            },
        })
    }

    fn parse_row(fields: &[&str], columns: &ColumnIndex, line: usize) -> Result<VariantRecord> {
        let get = |index: usize| -> Result<&str> {
            fields.get(index).copied().ok_or(CoreError::MalformedRow {
                line,
                reason: format!("expected at least {} tab-separated fields", index + 1),
            })
        };

        let pos_field = get(columns.pos)?;
        let pos: u64 = pos_field.parse().map_err(|_| CoreError::MalformedRow {
            line,
            reason: format!("POS value {:?} is not a non-negative integer", pos_field),
        })?;

        let beta = match columns.beta {
            Some(index) => {
                let raw = get(index)?;
                let beta: f64 = raw.parse().map_err(|_| CoreError::MalformedRow {
                    line,
                    reason: format!("BETA value {:?} is not a number", raw),
                })?;
                Some(beta)
            }
            None => None,
        };

        Ok(VariantRecord {
            chrom: get(columns.chrom)?.to_string(),
            pos,
            id: get(columns.id)?.to_string(),
            ref_allele: get(columns.ref_allele)?.to_string(),
            alt_allele: get(columns.alt_allele)?.to_string(),
            beta,
        })
    }
}

struct ColumnIndex {
    chrom: usize,
    pos: usize,
    id: usize,
    ref_allele: usize,
    alt_allele: usize,
    beta: Option<usize>,
}
