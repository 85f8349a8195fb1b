//! Artifacts from GitHub REST API.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Represents artifacts from GitHub REST API.
#[derive(Debug, Deserialize, Clone)]
pub struct Artifacts {
    /// How many artifacts the repository has, across all pages.
    pub total_count: u64,
    /// The artifacts of this page.
    pub artifacts: Vec<Artifact>,
}

/// Represents an artifact from GitHub REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The artifact id.
    pub id: u64,
    /// The name the workflow uploaded the artifact under.
    pub name: String,
    /// The size of the zip archive.
    pub size_in_bytes: u64,
    /// The API endpoint redirecting to the zip archive.
    pub archive_download_url: String,
    /// Whether the retention period is over.
    pub expired: bool,
    /// When the artifact was uploaded.
    pub created_at: Option<DateTime<Utc>>,
    /// When the retention period ends.
    pub expires_at: Option<DateTime<Utc>>,
    /// Content digest of the zip archive, such as `sha256:<hex>`.
    pub digest: Option<String>,
    /// The run that uploaded the artifact, if known.
    pub workflow_run: Option<ArtifactWorkflowRun>,
}

/// The workflow run an [`Artifact`] was uploaded by.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ArtifactWorkflowRun {
    /// The run id.
    pub id: u64,
    /// The repository the run belongs to.
    pub repository_id: Option<u64>,
    /// The repository of the head commit.
    pub head_repository_id: Option<u64>,
    /// The branch the run was triggered on.
    pub head_branch: Option<String>,
    /// The commit the run built.
    pub head_sha: Option<String>,
}

impl Artifact {
    /// The id of the workflow run that produced this artifact, if GitHub reported one.
    pub fn run_id(&self) -> Option<u64> {
        self.workflow_run.as_ref().map(|run| run.id)
    }

    /// The hex-encoded SHA-256 digest of the archive, if the artifact carries one.
    pub fn sha256_digest(&self) -> Option<&str> {
        self.digest.as_deref()?.strip_prefix("sha256:")
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} at {})",
            self.name, self.id, self.archive_download_url
        )
    }
}
