use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ArgMatches;

const LIBRARY_DIR: &str = ".valign";

/// The default database library, `~/.valign`.
pub fn library_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not resolve a home directory for the database library")?;
    Ok(home.join(LIBRARY_DIR))
}

/// Treat `db` as a filesystem path when it looks like one, otherwise as an
/// alias inside the library.
pub fn resolve_db_root(db: &str) -> Result<PathBuf> {
    let given = Path::new(db);
    if given.is_absolute() || db.contains(std::path::MAIN_SEPARATOR) || given.exists() {
        return Ok(given.to_path_buf());
    }
    Ok(library_root()?.join(db))
}

pub fn run_list_dbs(_matches: &ArgMatches) -> Result<()> {
    let root = library_root()?;
    if !root.exists() {
        println!("No database library at {}", root.display());
        return Ok(());
    }

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort_unstable();

    if names.is_empty() {
        println!("No databases in {}", root.display());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

pub fn run_delete_db(matches: &ArgMatches) -> Result<()> {
    let db = matches
        .get_one::<String>("db")
        .expect("A database alias or path is required.");

    let root = resolve_db_root(db)?;
    if !root.exists() {
        bail!("no database at {}", root.display());
    }
    fs::remove_dir_all(&root).with_context(|| format!("deleting {}", root.display()))?;
    println!("Deleted {}", root.display());
    Ok(())
}
