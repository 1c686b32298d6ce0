//! CLI subcommand implementations.

pub mod get;
pub mod rank;
pub mod top;
pub mod util;
