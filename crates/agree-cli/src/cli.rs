//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inter-annotator agreement on labeled time spans.
///
/// Measures how much time is covered by one, two, or more annotators and how
/// much corroboration each individual span receives.
#[derive(Debug, Parser)]
#[command(name = "agree", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Time covered by exactly 1, 2, ... distinct annotators.
    Coverage {
        /// Merged annotations file (defaults to the configured input).
        input: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Per-segment support classification and split detection.
    Segments {
        /// Merged annotations file (defaults to the configured input).
        input: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// List every split segment.
        #[arg(long)]
        details: bool,

        /// Expected annotator IDs, overriding the configured roster.
        #[arg(long, value_delimiter = ',')]
        annotators: Option<Vec<String>>,
    },

    /// Coverage and segment statistics together.
    Report {
        /// Merged annotations file (defaults to the configured input).
        input: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Expected annotator IDs, overriding the configured roster.
        #[arg(long, value_delimiter = ',')]
        annotators: Option<Vec<String>>,
    },

    /// Merge per-annotator record exports into one file keyed by item.
    Merge {
        /// JSON files, each holding a list of records.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write the merged mapping here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotators_flag_splits_on_commas() {
        let cli = Cli::parse_from(["agree", "segments", "in.json", "--annotators", "a,b,c"]);
        let Some(Commands::Segments { annotators, .. }) = cli.command else {
            panic!("expected segments command");
        };
        assert_eq!(annotators.unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn merge_requires_inputs() {
        assert!(Cli::try_parse_from(["agree", "merge"]).is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
