//! Command handlers -- one module per subcommand

pub mod build;
pub mod config;
pub mod parse;
