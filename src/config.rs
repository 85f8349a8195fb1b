//! Command line configuration.

use clap::Parser;

use crate::{ReleaseError, Result};

/// The branch looked at when `--branch` is not given.
pub const DEFAULT_BRANCH: &str = "main";
/// The workflow looked at when `--workflow` is not given.
pub const DEFAULT_WORKFLOW: &str = "multi-platform.yml";

/// Raw command line arguments. See [`Config`] for the validated form.
#[derive(Debug, Parser)]
#[command(
    version,
    about = "Publishes the module built by the latest CI run as a tagged GitHub release",
    after_help = "The GITHUB_TOKEN environment variable must hold a token allowed to create tags and releases."
)]
pub struct Args {
    /// GitHub repo owner (required)
    #[arg(long)]
    pub owner: Option<String>,

    /// GitHub repo name (required)
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch name to look for workflow runs
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Workflow filename
    #[arg(long = "workflow", default_value = DEFAULT_WORKFLOW)]
    pub workflow_file: String,

    /// Enable verbose debug output
    #[arg(long, short)]
    pub verbose: bool,
}

/// Validated configuration of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The repository owner.
    pub owner: String,
    /// The repository name.
    pub repo: String,
    /// The branch whose runs are looked at and which gets tagged.
    pub branch: String,
    /// The file name of the build workflow, such as `multi-platform.yml`.
    pub workflow_file: String,
    /// Also list the contents of both archives.
    pub verbose: bool,
}

impl Config {
    /// Validates parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::ConfigMissing`] if the owner or the repo is missing or empty.
    pub fn from_args(args: Args) -> Result<Self> {
        Ok(Self {
            owner: required(args.owner, "--owner")?,
            repo: required(args.repo, "--repo")?,
            branch: args.branch,
            workflow_file: args.workflow_file,
            verbose: args.verbose,
        })
    }
}

fn required(value: Option<String>, what: &'static str) -> Result<String> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ReleaseError::ConfigMissing { what })
}
