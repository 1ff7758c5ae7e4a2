use clap::{Arg, ArgAction, Command};

pub const REALIGN_CMD: &str = "realign";

pub fn create_realign_cli() -> Command {
    Command::new(REALIGN_CMD)
        .author("Databio")
        .about("Clean, resolve, and realign one chromosome-level cohort file against a canonical dictionary")
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .required(true)
                .help("Chromosome-level cohort file (.pvar or .ssf, optionally gzipped)"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .short('d')
                .required(true)
                .help("Database alias in the library, or a path to a database directory"),
        )
        .arg(
            Arg::new("write-path")
                .long("write-path")
                .short('w')
                .required(true)
                .help("Directory the artifact tree is written under"),
        )
        .arg(
            Arg::new("file-type")
                .long("file-type")
                .help("pvar or ssf; detected from the file extension when omitted"),
        )
        .arg(
            Arg::new("mapping")
                .long("mapping")
                .help("Two-column file registering non-standard column names to the standard ones"),
        )
        .arg(
            Arg::new("comment-chars")
                .long("comment-chars")
                .action(ArgAction::Append)
                .help("Leading comment prefix to skip while parsing; may be given more than once"),
        )
        .arg(
            Arg::new("db-format")
                .long("db-format")
                .help("Dictionary storage format, dict (binary) or tsv; used when the database is first created"),
        )
        .arg(
            Arg::new("skip-db-update")
                .long("skip-db-update")
                .action(ArgAction::SetTrue)
                .help("Realign without extending the dictionary"),
        )
        .arg(
            Arg::new("return-all")
                .long("return-all")
                .action(ArgAction::SetTrue)
                .help("Accepted for compatibility; the corrected table always carries the standard columns"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Per-stage progress logging"),
        )
}
