//! # Core library for valign.
//!
//! Everything needed to take a chromosome-level cohort variant file and
//! harmonize it against a canonical per-chromosome dictionary: the data
//! model, the file parser, and the realignment stages (cleaning,
//! orientation resolution, alignment application, and duplicate-id
//! reconciliation). Persistence of the dictionary itself lives in the
//! `valign-dict` crate; this crate only consumes a lookup interface.
pub mod align;
pub mod clean;
pub mod consts;
pub mod errors;
pub mod models;
pub mod orient;
pub mod pass;
pub mod reconcile;
pub mod utils;

// re-expose the main entry points
pub use align::{AlignmentOutcome, apply_alignment};
pub use clean::{CleanOutcome, RejectReason, clean};
pub use errors::{CoreError, Result};
pub use models::{FileKind, ReadOptions, VariantRecord, VariantTable};
pub use orient::{OrientationLookup, OrientationOutcome, orient};
pub use pass::RealignPass;
pub use reconcile::{DuplicationReport, IdDecision, ReconcileOutcome, reconcile_ids};
