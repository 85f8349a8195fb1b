use tracing::{debug, info};

use crate::{ReleaseError, Result, github::ReleaseHost, workflow::WorkflowRun};

/// Selects the latest completed run of `workflow_file` on `branch`.
///
/// The host lists runs newest first, so the first one is taken as is. Timestamps are not compared.
///
/// # Errors
///
/// Returns [`ReleaseError::RemoteCallFailed`] if the runs cannot be listed, or
/// [`ReleaseError::NoRunsFound`] if there are none.
pub async fn select_latest_run<H>(
    host: &H,
    workflow_file: &str,
    branch: &str,
) -> Result<WorkflowRun>
where
    H: ReleaseHost,
{
    debug!("listing completed runs of {workflow_file} on {branch}…");
    let runs = host
        .list_completed_runs(workflow_file, branch)
        .await
        .map_err(|source| ReleaseError::RemoteCallFailed {
            step: "list workflow runs",
            source,
        })?;
    debug!("found {} completed workflow runs", runs.len());

    let Some(latest) = runs.into_iter().next() else {
        return Err(ReleaseError::NoRunsFound {
            workflow: workflow_file.to_owned(),
            branch: branch.to_owned(),
        });
    };
    info!("latest run of {workflow_file} on {branch}: {latest}");

    Ok(latest)
}
