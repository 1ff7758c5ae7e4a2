//! # Persistent canonical variant dictionaries.
//!
//! One dictionary file per chromosome, grown append-only by a
//! validate-before-commit protocol: a candidate dictionary is written to a
//! temporary sibling, re-read and validated, and only then swapped onto
//! the live path with an adjacent remove-and-rename. A failed validation
//! deletes the candidate and leaves the live dictionary untouched.
pub mod error;
pub mod store;

pub use error::{DictError, Result};
pub use store::{ChromDictionary, DictEntry, DictFormat, DictStore, StagedUpdate};
