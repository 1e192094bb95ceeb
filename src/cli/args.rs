//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::domain::TraversalKind;

/// Generate traversal oracle fixtures from a Newick tree
#[derive(Parser, Debug)]
#[command(name = "treeoracle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (default: ./treeoracle.toml when present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Tree selection shared by all tree-consuming commands.
#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    /// Tree in Newick notation, terminated by ';' (overrides config)
    #[arg(short, long)]
    pub tree: Option<String>,

    /// Traversal to include; repeat for several (overrides config)
    #[arg(short, long = "kind", value_enum, ignore_case = true)]
    pub kinds: Vec<TraversalKind>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the fixture file
    Generate {
        #[command(flatten)]
        tree: TreeArgs,
        /// Destination file (overrides config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Print the fixture to stdout instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Verify the fixture file is up to date (exit 1 if not)
    Check {
        #[command(flatten)]
        tree: TreeArgs,
        /// Fixture file (overrides config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show the tree and its traversal sequences
    Show {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Inspect settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
