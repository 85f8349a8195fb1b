//! Data models of GitHub Actions workflows.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod artifact;

/// Represents a page of workflow runs from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowRuns {
    /// How many runs match, across all pages.
    pub total_count: u64,
    /// The runs of this page, newest first.
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Represents a GitHub Actions workflow run from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// The run id.
    pub id: u64,
    /// The commit the run built.
    pub head_sha: String,
    /// The branch the run was triggered on.
    pub head_branch: Option<String>,
    /// `completed` for every run the pipeline looks at.
    pub status: Option<String>,
    /// When the run was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl Display for WorkflowRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.head_sha)?;
        if let Some(created_at) = &self.created_at {
            write!(f, " created at {}", created_at.to_rfc3339())?;
        }
        Ok(())
    }
}
