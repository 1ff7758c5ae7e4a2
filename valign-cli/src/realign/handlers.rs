use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::ArgMatches;
use log::warn;

use valign::core::models::FileKind;
use valign::dict::DictFormat;
use valign::{RealignOptions, realign};

use crate::dbs::handlers::resolve_db_root;

pub fn run_realign(matches: &ArgMatches) -> Result<()> {
    let file = matches
        .get_one::<String>("file")
        .expect("A cohort file is required.");
    let db = matches
        .get_one::<String>("db")
        .expect("A database alias or path is required.");
    let write_path = matches
        .get_one::<String>("write-path")
        .expect("A write path is required.");

    let kind = match matches.get_one::<String>("file-type") {
        Some(value) => Some(match value.as_str() {
            "pvar" => FileKind::Pvar,
            "ssf" => FileKind::Ssf,
            other => bail!("unrecognized file type {:?}; expected pvar or ssf", other),
        }),
        None => None,
    };

    let db_format = match matches.get_one::<String>("db-format") {
        Some(value) => DictFormat::from_extension(value)?,
        None => DictFormat::Binary,
    };

    let comment_prefixes: Vec<String> = matches
        .get_many::<String>("comment-chars")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if matches.get_flag("return-all") {
        warn!("--return-all has no effect; the corrected table always carries the standard columns");
    }

    let options = RealignOptions {
        file: PathBuf::from(file),
        db_root: resolve_db_root(db)?,
        write_dir: PathBuf::from(write_path),
        kind,
        mapping: matches.get_one::<String>("mapping").map(PathBuf::from),
        comment_prefixes,
        db_format,
        skip_db_update: matches.get_flag("skip-db-update"),
    };

    let summary = realign(&options)?;

    println!(
        "chr{}: {} rows in, {} biallelic candidates ({} matched, {} flipped, {} novel, {} conflicting)",
        summary.chrom,
        summary.total_rows,
        summary.candidates,
        summary.matched,
        summary.flipped,
        summary.novel,
        summary.conflicting
    );
    if summary.duplicate_biallelic > 0 {
        println!(
            "WARNING: {} duplicated biallelic keys after alignment; see the reports directory",
            summary.duplicate_biallelic
        );
    }
    if summary.dictionary_grew {
        println!("Dictionary extended with {} novel variants", summary.novel);
    }
    println!("Artifacts written under {}", summary.write_dir.display());

    Ok(())
}
