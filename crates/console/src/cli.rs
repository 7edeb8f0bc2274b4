use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use voe_core::skill_graph::LayoutDirection;
use voe_core::types::EntityKind;

/// Operator console for vision-on-edge deployments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL, overriding VOE_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch every entity list and print the counts
    Sync,
    /// Search one entity list by name, fields and tags
    Search {
        #[arg(value_enum)]
        kind: KindArg,
        /// Case-insensitive regular expression
        query: String,
    },
    /// Remember the signed-in account
    Login { account_id: String },
    /// Forget the signed-in account
    Logout,
    /// Work with skill graph files
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },
    /// Run a creation wizard from a JSON answers file
    Wizard {
        #[arg(value_enum)]
        kind: KindArg,
        /// Path to the answers JSON file
        answers: PathBuf,
        /// Send the result to the backend instead of printing it
        #[arg(long)]
        submit: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SkillAction {
    /// Check a graph and print the first problem
    Validate {
        file: PathBuf,
        /// Skill name checked against the taken names
        #[arg(long, default_value = "")]
        name: String,
        /// Names already used by other skills
        #[arg(long = "taken", value_delimiter = ',')]
        taken: Vec<String>,
        /// Model catalog JSON, needed when the file holds a flow
        #[arg(long)]
        models: Option<PathBuf>,
    },
    /// Lay the graph out again and print the layout blob
    Layout {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = DirectionArg::Tb)]
        direction: DirectionArg,
        #[arg(long)]
        models: Option<PathBuf>,
    },
    /// Print the backend flow payload of a graph
    Flow {
        file: PathBuf,
        #[arg(long)]
        models: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Camera,
    ComputeDevice,
    Deployment,
    AiSkill,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Camera => EntityKind::Camera,
            KindArg::ComputeDevice => EntityKind::ComputeDevice,
            KindArg::Deployment => EntityKind::Deployment,
            KindArg::AiSkill => EntityKind::AiSkill,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Top to bottom
    Tb,
    /// Left to right
    Lr,
}

impl From<DirectionArg> for LayoutDirection {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Tb => LayoutDirection::TopToBottom,
            DirectionArg::Lr => LayoutDirection::LeftToRight,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_wizard_invocation() {
        let cli = Cli::try_parse_from([
            "voe-console",
            "wizard",
            "compute-device",
            "device.json",
            "--submit",
        ])
        .unwrap();
        match cli.command {
            Command::Wizard { kind, submit, .. } => {
                assert!(matches!(kind, KindArg::ComputeDevice));
                assert!(submit);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_taken_names_list() {
        let cli = Cli::try_parse_from([
            "voe-console",
            "skill",
            "validate",
            "graph.json",
            "--name",
            "counter",
            "--taken",
            "a,b",
        ])
        .unwrap();
        let Command::Skill {
            action: SkillAction::Validate { taken, .. },
        } = cli.command
        else {
            panic!("expected skill validate");
        };
        assert_eq!(taken, ["a", "b"]);
    }
}
