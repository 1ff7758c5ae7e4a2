pub mod table;
pub mod variant;

// re-export for cleaner imports
pub use self::table::{FileKind, ReadOptions, VariantTable};
pub use self::variant::{VariantRecord, is_palindromic_key, reverse_canonical_key};
