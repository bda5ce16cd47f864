pub mod cli;

pub use cli::{parse_param, Cli, CliHandler, Commands};
