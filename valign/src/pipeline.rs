//! End-to-end orchestration of one realignment pass over one cohort file.
//!
//! Ordering matters: every artifact is written before the dictionary commit,
//! which is the final effectful step. A pass that fails or is abandoned
//! part-way never persists anything into the shared database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use valign_core::models::{FileKind, ReadOptions, VariantTable};
use valign_core::pass::RealignPass;
use valign_dict::{DictEntry, DictFormat, DictStore};

use crate::output::write_artifacts;

/// Everything one realignment run needs.
#[derive(Debug)]
pub struct RealignOptions {
    /// Chromosome-level cohort file, plain or gzip-compressed.
    pub file: PathBuf,
    /// Dictionary database directory.
    pub db_root: PathBuf,
    /// Directory the artifact tree is written under.
    pub write_dir: PathBuf,
    /// File kind; detected from the extension when `None`.
    pub kind: Option<FileKind>,
    /// Optional column-name mapping file for non-standard headers.
    pub mapping: Option<PathBuf>,
    /// Leading comment prefixes to skip while parsing.
    pub comment_prefixes: Vec<String>,
    /// Storage format used if the database has to be created.
    pub db_format: DictFormat,
    /// Realign without extending the dictionary.
    pub skip_db_update: bool,
}

impl RealignOptions {
    pub fn new<P: AsRef<Path>>(file: P, db_root: P, write_dir: P) -> Self {
        RealignOptions {
            file: file.as_ref().to_path_buf(),
            db_root: db_root.as_ref().to_path_buf(),
            write_dir: write_dir.as_ref().to_path_buf(),
            kind: None,
            mapping: None,
            comment_prefixes: ReadOptions::default().comment_prefixes,
            db_format: DictFormat::Binary,
            skip_db_update: false,
        }
    }
}

/// Counts describing how one pass went.
#[derive(Debug)]
pub struct RealignSummary {
    pub chrom: String,
    pub kind: FileKind,
    pub total_rows: usize,
    pub candidates: usize,
    pub matched: usize,
    pub flipped: usize,
    pub novel: usize,
    pub conflicting: usize,
    pub duplicate_biallelic: usize,
    pub dictionary_grew: bool,
    pub write_dir: PathBuf,
}

/// Run one full pass: load, clean, orient, align, write artifacts, and
/// finally commit the dictionary addendum.
pub fn realign(options: &RealignOptions) -> Result<RealignSummary> {
    let kind = match options.kind {
        Some(kind) => kind,
        None => FileKind::detect(&options.file)?,
    };

    let mut read_options = ReadOptions::default();
    if !options.comment_prefixes.is_empty() {
        read_options.comment_prefixes = options.comment_prefixes.clone();
    }
    if let Some(mapping) = &options.mapping {
        read_options = read_options
            .with_mapping_file(mapping)
            .with_context(|| format!("reading column mapping {}", mapping.display()))?;
    }

    let table = VariantTable::from_file(&options.file, kind, &read_options)
        .with_context(|| format!("loading cohort file {}", options.file.display()))?;
    let total_rows = table.records.len();

    let store = DictStore::create(&options.db_root, options.db_format)
        .with_context(|| format!("opening dictionary database {}", options.db_root.display()))?;
    let dictionary = store.load(&table.chrom)?;

    let mut pass = RealignPass::new(table);
    pass.clean();
    pass.orient(&dictionary)?;
    pass.align()?;

    write_artifacts(&pass, &options.write_dir)
        .with_context(|| format!("writing artifacts under {}", options.write_dir.display()))?;

    let orientation = pass
        .orientation()
        .context("orientation outcome missing after a completed pass")?;

    let mut dictionary_grew = false;
    if options.skip_db_update {
        info!("Dictionary update skipped on request");
    } else if orientation.addendum.is_empty() {
        info!("No novel variants; the dictionary is unchanged");
    } else {
        let addendum: BTreeMap<String, DictEntry> = orientation
            .addendum
            .iter()
            .map(|(key, record)| (key.clone(), DictEntry::from(record)))
            .collect();
        store.stage(&dictionary, &addendum)?.commit()?;
        dictionary_grew = true;
    }

    Ok(RealignSummary {
        chrom: pass.chrom().to_string(),
        kind,
        total_rows,
        candidates: pass
            .clean_outcome()
            .map(|outcome| outcome.candidates.len())
            .unwrap_or(0),
        matched: orientation.matched.len(),
        flipped: orientation.flipped.len(),
        novel: orientation.novel.len(),
        conflicting: orientation.conflicting.len(),
        duplicate_biallelic: pass
            .alignment()
            .map(|outcome| outcome.duplicate_biallelic_keys.len())
            .unwrap_or(0),
        dictionary_grew,
        write_dir: options.write_dir.clone(),
    })
}
