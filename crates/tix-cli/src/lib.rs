//! CLI argument model for the tix ticket desk binary.

pub mod cli_args;

pub use cli_args::{Cli, COUNTER_FILE_NAME};
