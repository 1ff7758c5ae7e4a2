//! The artifact tree one pass leaves behind.
//!
//! Three subdirectories under the write dir: `aligned/` holds the corrected
//! record table, `reports/` the key lists and duplication warnings, and
//! `reorientation/` the original-ID instruction files downstream genotype
//! tooling consumes. Instruction files come in two forms, as-is and with
//! duplicated identifiers reconciled away.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fxhash::FxHashSet;
use log::{info, warn};

use valign_core::models::{FileKind, VariantRecord};
use valign_core::pass::RealignPass;
use valign_core::reconcile::reconcile_ids;

/// Write every artifact for a completed pass. The pass must have been
/// aligned; nothing here touches the dictionary.
pub fn write_artifacts(pass: &RealignPass, dir: &Path) -> Result<()> {
    let alignment = pass
        .alignment()
        .context("artifacts require a completed alignment")?;
    let chrom = pass.chrom();
    let table = pass.table();

    let aligned_dir = dir.join("aligned");
    let reports_dir = dir.join("reports");
    fs::create_dir_all(&aligned_dir)?;
    fs::create_dir_all(&reports_dir)?;

    write_aligned_table(
        &aligned_dir.join(format!("aligned_chr{}.{}.tsv", chrom, table.kind.as_str())),
        table.kind,
        &table.records,
        &alignment.row_keys,
    )?;

    write_key_list(
        &reports_dir.join(format!("chr{}_biallelic.tsv", chrom)),
        &alignment.biallelic_keys,
    )?;
    if !alignment.flipped_keys.is_empty() {
        write_key_list(
            &reports_dir.join(format!("chr{}_flipped.tsv", chrom)),
            &alignment.flipped_keys,
        )?;
    }
    if !alignment.duplicate_biallelic_keys.is_empty() {
        warn!(
            "Chromosome {} has {} duplicated biallelic keys after alignment; see the WARNING report",
            chrom,
            alignment.duplicate_biallelic_keys.len()
        );
        write_key_list(
            &reports_dir.join(format!("WARNING_chr{}_biallelic_duplicates.tsv", chrom)),
            &alignment.duplicate_biallelic_keys,
        )?;
    }

    let rows: Vec<(String, String)> = table
        .records
        .iter()
        .zip(&alignment.row_keys)
        .map(|(record, key)| (record.id.clone(), key.clone()))
        .collect();
    let biallelic: FxHashSet<String> = alignment.biallelic_keys.iter().cloned().collect();
    let outcome = reconcile_ids(&rows, &biallelic);

    // instruction files are keyed by original identifier and only make
    // sense for genotype variant files; the duplication report is written
    // for every kind
    if table.kind == FileKind::Pvar {
        write_reorientation_files(dir, chrom, &table.records, &rows, &outcome.kept)?;
    }

    if !outcome.report.is_empty() {
        let path = reports_dir.join(format!("chr{}_duplication_report.txt", chrom));
        let mut writer = BufWriter::new(File::create(path)?);
        outcome.report.write_to(&mut writer)?;
        writer.flush()?;
    }

    info!("Artifacts for chromosome {} written under {}", chrom, dir.display());
    Ok(())
}

fn write_aligned_table(
    path: &Path,
    kind: FileKind,
    records: &[VariantRecord],
    row_keys: &[String],
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    match kind {
        FileKind::Pvar => writeln!(writer, "KEY\tCHR\tPOS\tID\tREF\tALT")?,
        FileKind::Ssf => writeln!(writer, "KEY\tCHR\tPOS\tID\tREF\tALT\tBETA")?,
    }

    for (record, key) in records.iter().zip(row_keys) {
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            key, record.chrom, record.pos, record.id, record.ref_allele, record.alt_allele
        )?;
        if kind == FileKind::Ssf {
            write!(writer, "\t{}", record.beta.unwrap_or(0.0))?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_key_list(path: &Path, keys: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for key in keys {
        writeln!(writer, "{}", key)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_reorientation_files(
    dir: &Path,
    chrom: &str,
    records: &[VariantRecord],
    rows: &[(String, String)],
    kept: &[usize],
) -> Result<()> {
    let reorientation_dir = dir.join("reorientation");
    fs::create_dir_all(&reorientation_dir)?;

    let all: Vec<usize> = (0..rows.len()).collect();
    write_instruction_pair(&reorientation_dir, chrom, "", records, rows, &all)?;
    write_instruction_pair(&reorientation_dir, chrom, "no_duplicates_", records, rows, kept)?;

    Ok(())
}

fn write_instruction_pair(
    dir: &Path,
    chrom: &str,
    prefix: &str,
    records: &[VariantRecord],
    rows: &[(String, String)],
    indices: &[usize],
) -> Result<()> {
    let ref_path = dir.join(format!("{}ref_allele_chr{}.tsv", prefix, chrom));
    let index_path = dir.join(format!("{}index_chr{}.tsv", prefix, chrom));

    let mut ref_writer = BufWriter::new(File::create(ref_path)?);
    let mut index_writer = BufWriter::new(File::create(index_path)?);
    writeln!(ref_writer, "ID\tREF")?;
    writeln!(index_writer, "ID\tKEY")?;

    for &index in indices {
        let (id, key) = &rows[index];
        writeln!(ref_writer, "{}\t{}", id, records[index].ref_allele)?;
        writeln!(index_writer, "{}\t{}", id, key)?;
    }
    ref_writer.flush()?;
    index_writer.flush()?;
    Ok(())
}
