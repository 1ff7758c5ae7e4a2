//! Cross-cohort variant realignment.
//!
//! Chromosome-level cohort files are cleaned down to unambiguous biallelic
//! SNVs, resolved against a persistent per-chromosome canonical dictionary,
//! flipped into the established orientation where needed, and written back
//! out together with reorientation instruction files. Novel variants extend
//! the dictionary through a validate-before-commit update, so every cohort
//! processed against the same database ends up keyed identically.

#[doc(inline)]
pub use valign_core as core;

#[doc(inline)]
pub use valign_dict as dict;

pub mod output;
pub mod pipeline;

pub use pipeline::{RealignOptions, RealignSummary, realign};
