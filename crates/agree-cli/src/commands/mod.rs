//! CLI subcommand implementations.

pub mod coverage;
pub mod merge;
pub mod report;
pub mod segments;
mod util;

pub use util::resolve_input;
