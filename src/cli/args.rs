//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Ownership chart engine: turn entity ownership graphs into cycle-safe hierarchies
#[derive(Parser, Debug)]
#[command(name = "charted")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the ownership hierarchy
    Tree {
        /// Dataset file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Focus on one entity (id or name) and its ownership chain
        #[arg(long)]
        focus: Option<String>,

        /// Print the forest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show true roots and the current root decision
    Roots {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Report ownership cycles
    Cycles {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,

        /// Minimum ownership percentage of edges to consider
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Browse entities by name, e.g. to pick a root
    Entities {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,

        /// Case-insensitive substring on entity name or id
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List jurisdictions present in the dataset
    Jurisdictions {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
    },

    /// Manage the persisted root selection
    Root {
        #[command(subcommand)]
        command: RootCommands,
    },

    /// Manage settings
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

/// Filter flags shared by rendering commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive substring on entity name or id
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only entities in this jurisdiction
    #[arg(short, long)]
    pub jurisdiction: Option<String>,

    /// Minimum ownership percentage (default from config)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Attach persons as leaves
    #[arg(short, long)]
    pub persons: bool,
}

#[derive(Subcommand, Debug)]
pub enum RootCommands {
    /// Choose the root entity (id or name) for a dataset
    Set {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
        /// Entity id or name
        query: String,
    },
    /// Forget the chosen root
    Clear {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
    },
    /// Show the chosen root
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        data: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file location
    Path,
    /// Write a template global config
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_tree_flags_when_parsing_then_filters_are_collected() {
        let cli = Cli::parse_from([
            "charted", "-dd", "tree", "data.json", "-s", "beta", "--threshold", "50", "--persons",
            "--focus", "B",
        ]);

        assert_eq!(cli.debug, 2);
        match cli.command {
            Commands::Tree {
                data,
                filters,
                focus,
                json,
            } => {
                assert_eq!(data, PathBuf::from("data.json"));
                assert_eq!(filters.search.as_deref(), Some("beta"));
                assert_eq!(filters.threshold, Some(50.0));
                assert!(filters.persons);
                assert_eq!(focus.as_deref(), Some("B"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn given_entities_search_when_parsing_then_search_is_collected() {
        let cli = Cli::parse_from(["charted", "entities", "data.json", "--search", "acme"]);

        match cli.command {
            Commands::Entities { data, search } => {
                assert_eq!(data, PathBuf::from("data.json"));
                assert_eq!(search.as_deref(), Some("acme"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
