//! The release pipeline, from workflow run to published release.

use tracing::{debug, info, warn};

use crate::{
    Result,
    archive::{Archive, list_entries},
    config::Config,
    github::ReleaseHost,
    metadata::read_version,
    module::locate_module,
    transactions::{download_artifact, publish_release, select_artifact, select_latest_run},
};

/// What a successful [`run`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// The base name of the uploaded module file.
    pub module_filename: String,
    /// The version read from the module metadata.
    pub version: String,
    /// The created tag, equal to the version.
    pub tag_name: String,
    /// The title of the created release.
    pub release_title: String,
    /// The id of the created release.
    pub release_id: u64,
    /// The page of the created release, if the host reported one.
    pub release_url: Option<String>,
}

/// Publishes the module built by the latest completed run of the configured workflow.
///
/// Every step waits for the previous one and the first failure ends the run.
///
/// # Errors
///
/// Returns whichever [`crate::ReleaseError`] the failing step raised.
pub async fn run<H>(host: &H, config: &Config) -> Result<ReleaseOutcome>
where
    H: ReleaseHost,
{
    info!(
        "publishing {}/{} from {} on {}…",
        config.owner, config.repo, config.workflow_file, config.branch
    );

    let run = select_latest_run(host, &config.workflow_file, &config.branch).await?;
    let artifact = select_artifact(host, &run).await?;
    let artifact_bytes = download_artifact(host, &artifact).await?;

    let module = locate_module(&mut Archive::open(&artifact_bytes)?)?;
    info!("found module file {}", module.filename);

    if config.verbose {
        log_entries("artifact", &artifact_bytes);
        log_entries("module file", &module.bytes);
    }

    let version = read_version(&module.bytes)?;
    info!("parsed version {version}");

    let published = publish_release(host, &config.branch, &version, &module).await?;
    if let Some(url) = &published.release.html_url {
        info!("published {url}");
    }

    Ok(ReleaseOutcome {
        module_filename: published.asset_name,
        version,
        tag_name: published.tag_name,
        release_title: published.title,
        release_id: published.release.id,
        release_url: published.release.html_url,
    })
}

fn log_entries(label: &str, bytes: &[u8]) {
    match list_entries(bytes) {
        Ok(names) => {
            debug!("contents of {label}:");
            for name in names {
                debug!("  {name}");
            }
        }
        Err(err) => warn!("failed to list {label} contents: {err}"),
    }
}
