use clap::{Arg, Command};

pub const LIST_DBS_CMD: &str = "list-dbs";
pub const DELETE_DB_CMD: &str = "delete-db";

pub fn create_list_dbs_cli() -> Command {
    Command::new(LIST_DBS_CMD)
        .author("Databio")
        .about("List the dictionary databases in the library")
}

pub fn create_delete_db_cli() -> Command {
    Command::new(DELETE_DB_CMD)
        .author("Databio")
        .about("Delete a dictionary database")
        .arg(
            Arg::new("db")
                .long("db")
                .short('d')
                .required(true)
                .help("Database alias in the library, or a path to a database directory"),
        )
}
