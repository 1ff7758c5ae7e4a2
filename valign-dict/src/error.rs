use std::path::PathBuf;

use thiserror::Error;

/// Error type for dictionary store operations.
#[derive(Error, Debug)]
pub enum DictError {
    #[error("Unrecognized dictionary storage extension: {0}; valid extensions are dict (binary) and tsv")]
    UnknownFormat(String),

    #[error("No dictionary file for chromosome {chrom} under {root}")]
    MissingDictionary { chrom: String, root: PathBuf },

    #[error("Timed out waiting for dictionary creation to finish under {0}")]
    CreationTimeout(PathBuf),

    #[error("Dictionary commit validation failed for chromosome {chrom}: {reason}; the live dictionary was left untouched")]
    CommitValidation { chrom: String, reason: String },

    #[error("Corrupt dictionary file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for dictionary store operations.
pub type Result<T> = std::result::Result<T, DictError>;
