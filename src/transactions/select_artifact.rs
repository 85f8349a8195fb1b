use tracing::{debug, info, warn};

use crate::{
    ReleaseError, Result,
    github::ReleaseHost,
    workflow::{WorkflowRun, artifact::Artifact},
};

/// The name the build workflow uploads its output under.
pub const ARTIFACT_NAME: &str = "Build Output";

/// Selects the [`ARTIFACT_NAME`] artifact uploaded by `run`.
///
/// The artifacts of the whole repository are scanned in the order the host lists them and the
/// first one matching both the name and the run wins. Expired artifacts are still selected.
///
/// # Errors
///
/// Returns [`ReleaseError::RemoteCallFailed`] if the artifacts cannot be listed, or
/// [`ReleaseError::ArtifactNotFound`] if none matches.
pub async fn select_artifact<H>(host: &H, run: &WorkflowRun) -> Result<Artifact>
where
    H: ReleaseHost,
{
    let artifacts = host.list_artifacts().await.map_err(|source| ReleaseError::RemoteCallFailed {
        step: "list artifacts",
        source,
    })?;
    debug!("found {} artifacts total", artifacts.len());

    let artifact = artifacts
        .into_iter()
        .inspect(|artifact| debug!("artifact {artifact} from run {:?}", artifact.run_id()))
        .find(|artifact| artifact.name == ARTIFACT_NAME && artifact.run_id() == Some(run.id))
        .ok_or(ReleaseError::ArtifactNotFound {
            name: ARTIFACT_NAME,
            run_id: run.id,
        })?;

    if artifact.expired {
        warn!("artifact {artifact} has expired, downloading it will likely fail");
    }
    info!("selected artifact {artifact}");

    Ok(artifact)
}
