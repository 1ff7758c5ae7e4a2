mod dbs;
mod realign;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "valign";
    pub const BIN_NAME: &str = "valign";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Realign chromosome-level cohort variant files against persistent canonical dictionaries so every cohort ends up keyed identically.")
        .subcommand_required(true)
        .subcommand(realign::cli::create_realign_cli())
        .subcommand(dbs::cli::create_list_dbs_cli())
        .subcommand(dbs::cli::create_delete_db_cli())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // REALIGN
        //
        Some((realign::cli::REALIGN_CMD, matches)) => {
            init_logging(matches.get_flag("verbose"));
            realign::handlers::run_realign(matches)?;
        }

        //
        // DATABASE LIBRARY
        //
        Some((dbs::cli::LIST_DBS_CMD, matches)) => {
            init_logging(false);
            dbs::handlers::run_list_dbs(matches)?;
        }
        Some((dbs::cli::DELETE_DB_CMD, matches)) => {
            init_logging(false);
            dbs::handlers::run_delete_db(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
