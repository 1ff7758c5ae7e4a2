use thiserror::Error;

/// Error type for valign-core operations.
///
/// Format errors abort a realignment before any state is mutated; the
/// stage-order variant signals a programming-contract violation in the
/// pipeline (a stage invoked before its precondition stage).
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Mandatory column(s) missing from header: {0}")]
    MissingColumns(String),

    #[error("More than one chromosome found in file ({0} and {1}); realignment expects chromosome-level files")]
    MultipleChromosomes(String, String),

    #[error("Chromosome label {0} is not recognized; valid labels are 1-22, X, Y, MT")]
    UnknownChromosome(String),

    #[error("No variant rows found in {0}")]
    EmptyTable(String),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Unable to resolve file kind for {0}; expected a .pvar or .ssf extension")]
    UnknownFileKind(String),

    #[error("Malformed canonical key: {0}")]
    MalformedKey(String),

    #[error("Stage order violation: {0}")]
    StageOrder(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for valign-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
