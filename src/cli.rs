use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use transfer::{Invocation, Kind, Operation, TransferFlags};

#[derive(Parser)]
#[command(name = "cloner")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Clone Jenkins jobs, views and nodes between instances", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clone job from one instance to another
    Job(TransferArgs),
    /// Clone view from one instance to another
    View(TransferArgs),
    /// Clone node from one instance to another
    Node(TransferArgs),

    /// Save remote jobs into the local library
    DownloadJob(TransferArgs),
    /// Save remote views into the local library
    DownloadView(TransferArgs),
    /// Save remote nodes into the local library
    DownloadNode(TransferArgs),

    /// Push jobs from the local library: LIBRARY JOB...
    UpdateJob(TransferArgs),
    /// Push views from the local library: LIBRARY VIEW...
    UpdateView(TransferArgs),
    /// Push nodes from the local library: LIBRARY NODE...
    UpdateNode(TransferArgs),

    /// Delete remote jobs
    DeleteJob(TransferArgs),
    /// Delete remote views
    DeleteView(TransferArgs),
    /// Delete remote nodes
    DeleteNode(TransferArgs),

    /// Refresh every job of a local library: LIBRARY
    Pull(TransferArgs),

    /// Evaluate migration recipe
    Recipe(RecipeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Transfers
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct TransferArgs {
    /// Entity addresses (URLs or BASE::ENTITY)
    #[arg(value_name = "ADDRESS")]
    pub entities: Vec<String>,

    /// Accept addresses without an entity name
    #[arg(short, long)]
    pub force: bool,

    /// Do not perform any modifications to any instance
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Local library directory
    #[arg(short = 'l', long = "local-copy", value_name = "DIR", env = "CLONER_LIBRARY")]
    pub local_copy: Option<PathBuf>,
}

impl TransferArgs {
    fn flags(&self) -> TransferFlags {
        TransferFlags {
            force: self.force,
            dry_run: self.dry_run,
            local_library: self.local_copy.clone(),
        }
    }
}

// ============================================================================
// Recipe
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Recipe file to be executed
    #[arg(value_name = "RECIPE")]
    pub recipe: String,

    /// Do not perform any modifications to any instance
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Property for the recipe
    #[arg(short = 'p', long = "property", value_name = "NAME=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Accept addresses without an entity name in every step
    #[arg(short, long)]
    pub force: bool,

    /// Local library directory
    #[arg(short = 'l', long = "local-copy", value_name = "DIR", env = "CLONER_LIBRARY")]
    pub local_copy: Option<PathBuf>,
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

impl Command {
    /// Command-table call for this subcommand; `None` for `completions`.
    pub fn invocation(&self) -> Option<Invocation> {
        let (operation, args) = match self {
            Command::Job(a) => (Operation::Clone(Kind::Job), a),
            Command::View(a) => (Operation::Clone(Kind::View), a),
            Command::Node(a) => (Operation::Clone(Kind::Node), a),
            Command::DownloadJob(a) => (Operation::Download(Kind::Job), a),
            Command::DownloadView(a) => (Operation::Download(Kind::View), a),
            Command::DownloadNode(a) => (Operation::Download(Kind::Node), a),
            Command::UpdateJob(a) => (Operation::Update(Kind::Job), a),
            Command::UpdateView(a) => (Operation::Update(Kind::View), a),
            Command::UpdateNode(a) => (Operation::Update(Kind::Node), a),
            Command::DeleteJob(a) => (Operation::Delete(Kind::Job), a),
            Command::DeleteView(a) => (Operation::Delete(Kind::View), a),
            Command::DeleteNode(a) => (Operation::Delete(Kind::Node), a),
            Command::Pull(a) => (Operation::Pull, a),
            Command::Recipe(r) => {
                let flags = TransferFlags {
                    force: r.force,
                    dry_run: r.dry_run,
                    local_library: r.local_copy.clone(),
                };
                let properties: BTreeMap<String, String> =
                    r.properties.iter().cloned().collect();
                return Some(
                    Invocation::new(Operation::Recipe, vec![r.recipe.clone()])
                        .with_flags(flags)
                        .with_properties(properties),
                );
            }
            Command::Completions { .. } => return None,
        };

        Some(Invocation::new(operation, args.entities.clone()).with_flags(args.flags()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn invocation(args: &[&str]) -> Invocation {
        Cli::try_parse_from(args)
            .unwrap()
            .command
            .invocation()
            .unwrap()
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_table_entry_has_a_subcommand() {
        let cmd = Cli::command();
        for op in Operation::all() {
            assert!(
                cmd.find_subcommand(op.name()).is_some(),
                "missing subcommand {op}"
            );
        }
    }

    #[test]
    fn test_clone_job() {
        let inv = invocation(&["cloner", "job", "-n", "https://a/job/x", "https://b/job/y"]);
        assert_eq!(inv.operation, Operation::Clone(Kind::Job));
        assert_eq!(inv.args, vec!["https://a/job/x", "https://b/job/y"]);
        assert!(inv.flags.dry_run);
        assert!(!inv.flags.force);
    }

    #[test]
    fn test_download_with_library() {
        let inv = invocation(&["cloner", "download-view", "-l", "/srv/lib", "-f", "https://a/"]);
        assert_eq!(inv.operation, Operation::Download(Kind::View));
        assert_eq!(inv.flags.local_library, Some(PathBuf::from("/srv/lib")));
        assert!(inv.flags.force);
    }

    #[test]
    fn test_missing_positionals_reach_the_handler() {
        let inv = invocation(&["cloner", "update-node"]);
        assert!(inv.args.is_empty());
    }

    #[test]
    fn test_recipe_properties() {
        let inv = invocation(&[
            "cloner", "recipe", "-n", "-p", "job=build", "-p", "url=https://x/?a=b", "move.toml",
        ]);
        assert_eq!(inv.operation, Operation::Recipe);
        assert_eq!(inv.args, vec!["move.toml"]);
        assert!(inv.flags.dry_run);
        assert_eq!(inv.properties["job"], "build");
        assert_eq!(inv.properties["url"], "https://x/?a=b");
    }

    #[test]
    fn test_bad_property_is_rejected() {
        assert!(Cli::try_parse_from(["cloner", "recipe", "-p", "novalue", "r.toml"]).is_err());
        assert!(parse_property("=v").is_err());
    }

    #[test]
    fn test_completions_has_no_invocation() {
        let cli = Cli::try_parse_from(["cloner", "completions", "bash"]).unwrap();
        assert!(cli.command.invocation().is_none());
    }
}
