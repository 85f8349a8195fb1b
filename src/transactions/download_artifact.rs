use sha2::{Digest as _, Sha256};
use tracing::{debug, info, warn};

use crate::{
    ReleaseError, Result,
    github::{ApiError, ReleaseHost},
    workflow::artifact::Artifact,
};

/// Downloads the archive of an [`Artifact`] and returns its bytes.
///
/// The archive goes through a temporary file that is removed when this function returns, whether
/// it succeeds or not. If the artifact carries a SHA-256 digest the bytes are checked against it.
///
/// # Errors
///
/// Returns [`ReleaseError::RemoteCallFailed`] if no download URL can be obtained, or
/// [`ReleaseError::DownloadFailed`] if the artifact is gone, the transfer fails, or the bytes do
/// not match the digest.
pub async fn download_artifact<H>(host: &H, artifact: &Artifact) -> Result<Vec<u8>>
where
    H: ReleaseHost,
{
    debug!("getting download URL for artifact {}…", artifact.id);
    let url = host
        .artifact_download_url(artifact.id)
        .await
        .map_err(|source| match source {
            ApiError::Gone => ReleaseError::DownloadFailed(source),
            source => ReleaseError::RemoteCallFailed {
                step: "get artifact download URL",
                source,
            },
        })?;

    let temp = tempfile::Builder::new()
        .prefix("artifact-")
        .suffix(".zip")
        .tempfile()
        .map_err(|err| ReleaseError::DownloadFailed(err.into()))?;
    debug!("downloading artifact {artifact} to {:?}…", temp.path());

    let written = host
        .download(&url, temp.path())
        .await
        .map_err(ReleaseError::DownloadFailed)?;
    debug!("downloaded {written} bytes to {:?}", temp.path());

    let bytes = tokio::fs::read(temp.path())
        .await
        .map_err(|err| ReleaseError::DownloadFailed(err.into()))?;
    verify_digest(artifact, &bytes)?;
    info!("downloaded artifact {artifact}");

    Ok(bytes)
}

fn verify_digest(artifact: &Artifact, bytes: &[u8]) -> Result<()> {
    let Some(expected) = artifact.sha256_digest() else {
        match &artifact.digest {
            Some(digest) => warn!("unsupported digest {digest} for {artifact}, not verifying"),
            None => debug!("digest not provided for {artifact}"),
        }
        return Ok(());
    };

    let actual = hex::encode(Sha256::digest(bytes));
    if actual.eq_ignore_ascii_case(expected) {
        debug!("verified sha256 of {artifact}");
        Ok(())
    } else {
        Err(ReleaseError::DownloadFailed(ApiError::DigestMismatch {
            expected: expected.to_owned(),
            actual,
        }))
    }
}
