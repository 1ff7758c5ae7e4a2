use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fxhash::FxHashSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use valign_core::consts::CHROMOSOMES;
use valign_core::models::VariantRecord;
use valign_core::orient::OrientationLookup;

use crate::error::{DictError, Result};

const TSV_HEADER: [&str; 5] = ["CHR", "POS", "REF", "ALT", "ID"];
const COMPLETE_MARKER: &str = ".complete";

/// One canonical dictionary row. The key of an entry is its
/// `chr:pos:ref:alt` string in the orientation the dictionary first
/// recorded; entries are never rewritten once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub id: String,
}

impl DictEntry {
    pub fn canonical_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.chrom, self.pos, self.ref_allele, self.alt_allele
        )
    }
}

impl From<&VariantRecord> for DictEntry {
    fn from(record: &VariantRecord) -> Self {
        DictEntry {
            chrom: record.chrom.clone(),
            pos: record.pos,
            ref_allele: record.ref_allele.clone(),
            alt_allele: record.alt_allele.clone(),
            id: record.id.clone(),
        }
    }
}

/// On-disk representation of a chromosome dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictFormat {
    /// bincode-serialized entry vector (`.dict`).
    Binary,
    /// Tab-separated table with a `CHR POS REF ALT ID` header (`.tsv`).
    Tsv,
}

impl DictFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DictFormat::Binary => "dict",
            DictFormat::Tsv => "tsv",
        }
    }

    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            "dict" => Ok(DictFormat::Binary),
            "tsv" => Ok(DictFormat::Tsv),
            other => Err(DictError::UnknownFormat(other.to_string())),
        }
    }
}

/// An in-memory snapshot of one chromosome's dictionary, with key and
/// position indexes for the two lookups orientation resolution performs.
#[derive(Debug)]
pub struct ChromDictionary {
    chrom: String,
    entries: Vec<DictEntry>,
    columns: usize,
    keys: FxHashSet<String>,
    positions: FxHashSet<u64>,
}

impl ChromDictionary {
    fn new(chrom: &str, entries: Vec<DictEntry>, columns: usize) -> Self {
        let keys = entries.iter().map(|entry| entry.canonical_key()).collect();
        let positions = entries.iter().map(|entry| entry.pos).collect();
        ChromDictionary {
            chrom: chrom.to_string(),
            entries,
            columns,
            keys,
            positions,
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OrientationLookup for ChromDictionary {
    fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn contains_position(&self, pos: u64) -> bool {
        self.positions.contains(&pos)
    }
}

///
/// A dictionary database: one directory holding one dictionary file per
/// chromosome. Creation is idempotent and finished by a marker file so
/// concurrent per-chromosome realignments racing the creator wait on the
/// barrier instead of observing a half-initialized directory.
///
/// Within one chromosome the store expects a single writer at a time;
/// serialization across processes is the caller's responsibility.
///
#[derive(Debug)]
pub struct DictStore {
    root: PathBuf,
    format: DictFormat,
}

impl DictStore {
    /// Initialize a database directory with an empty dictionary per
    /// chromosome. Safe to call on an existing database; present files
    /// are never overwritten.
    pub fn create<P: AsRef<Path>>(root: P, format: DictFormat) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.join(COMPLETE_MARKER).exists() {
            return Self::open(root);
        }

        info!("Creating dictionary database under {}", root.display());
        fs::create_dir_all(&root)?;

        let store = DictStore { root, format };
        for chrom in CHROMOSOMES {
            let path = store.chrom_path(chrom);
            if !path.exists() {
                store.write_entries(&path, &[])?;
            }
        }

        // the barrier: readers must not trust the directory before this
        File::create(store.root.join(COMPLETE_MARKER))?;
        Ok(store)
    }

    /// Open an existing database, waiting with bounded backoff for a
    /// concurrent creator to finish initialization.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let marker = root.join(COMPLETE_MARKER);

        let mut backoff = Duration::from_millis(100);
        for attempt in 0..9 {
            if marker.exists() {
                let format = Self::detect_format(&root)?;
                return Ok(DictStore { root, format });
            }
            if attempt == 0 {
                warn!(
                    "Dictionary database {} is not complete yet; waiting for creation to finish",
                    root.display()
                );
            }
            thread::sleep(backoff);
            backoff = (backoff * 2).min(Duration::from_millis(3200));
        }

        Err(DictError::CreationTimeout(root))
    }

    fn detect_format(root: &Path) -> Result<DictFormat> {
        for format in [DictFormat::Binary, DictFormat::Tsv] {
            if root
                .join(format!("chr_1.{}", format.extension()))
                .exists()
            {
                return Ok(format);
            }
        }
        Err(DictError::MissingDictionary {
            chrom: "1".to_string(),
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> DictFormat {
        self.format
    }

    pub fn chrom_path(&self, chrom: &str) -> PathBuf {
        self.root
            .join(format!("chr_{}.{}", chrom, self.format.extension()))
    }

    fn staged_path(&self, chrom: &str) -> PathBuf {
        self.root
            .join(format!("chr_{}_updated.{}", chrom, self.format.extension()))
    }

    /// Load the dictionary snapshot for one chromosome.
    pub fn load(&self, chrom: &str) -> Result<ChromDictionary> {
        let path = self.chrom_path(chrom);
        if !path.exists() {
            return Err(DictError::MissingDictionary {
                chrom: chrom.to_string(),
                root: self.root.clone(),
            });
        }
        let (entries, columns) = self.read_entries(&path)?;
        Ok(ChromDictionary::new(chrom, entries, columns))
    }

    /// Write the current entries plus the addendum to a temporary
    /// candidate file. Nothing observable changes until
    /// [`StagedUpdate::commit`] validates and swaps the candidate in.
    pub fn stage(
        &self,
        dictionary: &ChromDictionary,
        addendum: &BTreeMap<String, DictEntry>,
    ) -> Result<StagedUpdate> {
        let chrom = dictionary.chrom().to_string();
        let staged_path = self.staged_path(&chrom);

        info!(
            "Staging {} new entries for the chromosome {} dictionary",
            addendum.len(),
            chrom
        );

        let mut candidate: Vec<DictEntry> = dictionary.entries().to_vec();
        candidate.extend(addendum.values().cloned());
        self.write_entries(&staged_path, &candidate)?;

        Ok(StagedUpdate {
            store: self,
            chrom,
            staged_path,
            previous_rows: dictionary.len(),
            previous_columns: dictionary.columns,
            addendum_keys: addendum.keys().cloned().collect(),
        })
    }

    fn read_entries(&self, path: &Path) -> Result<(Vec<DictEntry>, usize)> {
        match self.format {
            DictFormat::Binary => {
                let bytes = fs::read(path)?;
                let entries: Vec<DictEntry> =
                    bincode::deserialize(&bytes).map_err(|err| DictError::Corrupt {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    })?;
                Ok((entries, TSV_HEADER.len()))
            }
            DictFormat::Tsv => {
                let file = File::open(path)?;
                let mut lines = BufReader::new(file).lines();

                let header = lines.next().transpose()?.ok_or_else(|| DictError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "missing header".to_string(),
                })?;
                let columns = header.split('\t').count();

                let mut entries = Vec::new();
                for (index, line) in lines.enumerate() {
                    let line = line?;
                    if line.is_empty() {
                        continue;
                    }
                    let fields: Vec<&str> = line.split('\t').collect();
                    if fields.len() != TSV_HEADER.len() {
                        return Err(DictError::Corrupt {
                            path: path.to_path_buf(),
                            reason: format!("row {} has {} fields", index + 2, fields.len()),
                        });
                    }
                    entries.push(DictEntry {
                        chrom: fields[0].to_string(),
                        pos: fields[1].parse().map_err(|_| DictError::Corrupt {
                            path: path.to_path_buf(),
                            reason: format!("row {} has non-numeric POS {:?}", index + 2, fields[1]),
                        })?,
                        ref_allele: fields[2].to_string(),
                        alt_allele: fields[3].to_string(),
                        id: fields[4].to_string(),
                    });
                }
                Ok((entries, columns))
            }
        }
    }

    fn write_entries(&self, path: &Path, entries: &[DictEntry]) -> Result<()> {
        match self.format {
            DictFormat::Binary => {
                let bytes = bincode::serialize(&entries.to_vec()).map_err(|err| {
                    DictError::Corrupt {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    }
                })?;
                fs::write(path, bytes)?;
            }
            DictFormat::Tsv => {
                let mut writer = BufWriter::new(File::create(path)?);
                writeln!(writer, "{}", TSV_HEADER.join("\t"))?;
                for entry in entries {
                    writeln!(
                        writer,
                        "{}\t{}\t{}\t{}\t{}",
                        entry.chrom, entry.pos, entry.ref_allele, entry.alt_allele, entry.id
                    )?;
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

/// A written-but-uncommitted candidate dictionary.
///
/// `commit` re-reads the candidate from disk and validates it against the
/// snapshot the update was staged from before swapping it onto the live
/// path; any validation failure deletes the candidate and reports a
/// [`DictError::CommitValidation`] with the live file untouched.
#[derive(Debug)]
#[must_use = "a staged update does nothing until committed or aborted"]
pub struct StagedUpdate<'s> {
    store: &'s DictStore,
    chrom: String,
    staged_path: PathBuf,
    previous_rows: usize,
    previous_columns: usize,
    addendum_keys: Vec<String>,
}

impl StagedUpdate<'_> {
    pub fn staged_path(&self) -> &Path {
        &self.staged_path
    }

    pub fn commit(self) -> Result<()> {
        let (candidate, columns) = self.store.read_entries(&self.staged_path)?;

        if let Err(reason) = self.validate(&candidate, columns) {
            fs::remove_file(&self.staged_path)?;
            return Err(DictError::CommitValidation {
                chrom: self.chrom,
                reason,
            });
        }

        // removal and rename must stay adjacent: nothing may observe the
        // final path between the two
        let live_path = self.store.chrom_path(&self.chrom);
        fs::remove_file(&live_path)?;
        fs::rename(&self.staged_path, &live_path)?;

        info!(
            "Committed {} new entries to the chromosome {} dictionary ({} total)",
            self.addendum_keys.len(),
            self.chrom,
            self.previous_rows + self.addendum_keys.len()
        );
        Ok(())
    }

    fn validate(&self, candidate: &[DictEntry], columns: usize) -> std::result::Result<(), String> {
        let candidate_keys: FxHashSet<String> = candidate
            .iter()
            .map(|entry| entry.canonical_key())
            .collect();

        if candidate_keys.len() != candidate.len() {
            warn!("Candidate chromosome {} dictionary contains duplicated keys", self.chrom);
        }

        for key in &self.addendum_keys {
            if !candidate_keys.contains(key) {
                return Err(format!("staged entry {} missing from candidate", key));
            }
        }

        let expected_rows = self.previous_rows + self.addendum_keys.len();
        if candidate.len() != expected_rows {
            return Err(format!(
                "candidate has {} rows, expected {} ({} previous + {} staged)",
                candidate.len(),
                expected_rows,
                self.previous_rows,
                self.addendum_keys.len()
            ));
        }

        if columns != self.previous_columns {
            return Err(format!(
                "candidate has {} columns, expected {}",
                columns, self.previous_columns
            ));
        }

        Ok(())
    }

    /// Discard the candidate without touching the live dictionary.
    pub fn abort(self) -> Result<()> {
        fs::remove_file(&self.staged_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    fn entry(chrom: &str, pos: u64, ref_allele: &str, alt_allele: &str, id: &str) -> DictEntry {
        DictEntry {
            chrom: chrom.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            id: id.to_string(),
        }
    }

    fn addendum(entries: &[DictEntry]) -> BTreeMap<String, DictEntry> {
        entries
            .iter()
            .map(|entry| (entry.canonical_key(), entry.clone()))
            .collect()
    }

    #[rstest]
    #[case(DictFormat::Binary)]
    #[case(DictFormat::Tsv)]
    fn test_create_load_roundtrip(#[case] format: DictFormat) {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), format).unwrap();

        for chrom in ["1", "22", "X", "MT"] {
            let dictionary = store.load(chrom).unwrap();
            assert!(dictionary.is_empty());
        }
        assert!(dir.path().join(COMPLETE_MARKER).exists());
    }

    #[rstest]
    fn test_create_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), DictFormat::Tsv).unwrap();

        let dictionary = store.load("5").unwrap();
        let update = store.stage(&dictionary, &addendum(&[entry("5", 42, "A", "G", "rs5")])).unwrap();
        update.commit().unwrap();

        // re-creating must neither truncate nor overwrite existing files
        let store = DictStore::create(dir.path(), DictFormat::Tsv).unwrap();
        assert_eq!(store.load("5").unwrap().len(), 1);
    }

    #[rstest]
    #[case(DictFormat::Binary)]
    #[case(DictFormat::Tsv)]
    fn test_stage_and_commit_grows_dictionary(#[case] format: DictFormat) {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), format).unwrap();

        let dictionary = store.load("2").unwrap();
        let update = store
            .stage(&dictionary, &addendum(&[entry("2", 500, "G", "T", "rs2")]))
            .unwrap();
        update.commit().unwrap();

        let reloaded = store.load("2").unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains_key("2:500:G:T"));
        assert!(reloaded.contains_position(500));
        assert!(!reloaded.contains_key("2:500:T:G"));
        assert!(!dir.path().join("chr_2_updated.tsv").exists());
        assert!(!dir.path().join("chr_2_updated.dict").exists());
    }

    #[rstest]
    fn test_commit_validation_rolls_back_corrupted_candidate() {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), DictFormat::Tsv).unwrap();

        let dictionary = store.load("3").unwrap();
        let update = store
            .stage(
                &dictionary,
                &addendum(&[
                    entry("3", 10, "A", "C", "rs10"),
                    entry("3", 20, "G", "T", "rs20"),
                ]),
            )
            .unwrap();

        // simulate a partial write: truncate the candidate to one row
        fs::write(update.staged_path(), "CHR\tPOS\tREF\tALT\tID\n3\t10\tA\tC\trs10\n").unwrap();

        let live_before = fs::read_to_string(store.chrom_path("3")).unwrap();
        let err = update.commit();
        assert!(matches!(err, Err(DictError::CommitValidation { .. })));

        // the live dictionary is untouched and the candidate is gone
        let live_after = fs::read_to_string(store.chrom_path("3")).unwrap();
        assert_eq!(live_before, live_after);
        assert!(!dir.path().join("chr_3_updated.tsv").exists());
    }

    #[rstest]
    fn test_commit_validation_rejects_schema_drift() {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), DictFormat::Tsv).unwrap();

        let dictionary = store.load("4").unwrap();
        let update = store
            .stage(&dictionary, &addendum(&[entry("4", 7, "C", "G", "rs7")]))
            .unwrap();

        fs::write(
            update.staged_path(),
            "CHR\tPOS\tREF\tALT\tID\tEXTRA\n4\t7\tC\tG\trs7\n",
        )
        .unwrap();

        let err = update.commit();
        assert!(matches!(err, Err(DictError::CommitValidation { .. })));
    }

    #[rstest]
    fn test_abort_leaves_live_dictionary_alone() {
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), DictFormat::Binary).unwrap();

        let dictionary = store.load("6").unwrap();
        let update = store
            .stage(&dictionary, &addendum(&[entry("6", 11, "T", "A", "rs11")]))
            .unwrap();
        update.abort().unwrap();

        assert_eq!(store.load("6").unwrap().len(), 0);
        assert!(!dir.path().join("chr_6_updated.dict").exists());
    }

    #[rstest]
    fn test_open_without_marker_times_out() {
        let dir = tempdir().unwrap();
        // directory exists but creation never finished
        fs::create_dir_all(dir.path().join("partial")).unwrap();
        let err = DictStore::open(dir.path().join("partial"));
        assert!(matches!(err, Err(DictError::CreationTimeout(_))));
    }

    #[rstest]
    fn test_addendum_orientation_is_preserved() {
        // the first cohort's as-submitted orientation wins; a later load
        // must expose exactly that key
        let dir = tempdir().unwrap();
        let store = DictStore::create(dir.path(), DictFormat::Tsv).unwrap();

        let dictionary = store.load("7").unwrap();
        store
            .stage(&dictionary, &addendum(&[entry("7", 123, "T", "C", "rs77")]))
            .unwrap()
            .commit()
            .unwrap();

        let reloaded = store.load("7").unwrap();
        assert_eq!(reloaded.entries()[0].canonical_key(), "7:123:T:C");
    }
}
