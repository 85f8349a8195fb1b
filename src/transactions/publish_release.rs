use chrono::Utc;
use tracing::{debug, info};

use crate::{
    ReleaseError, Result,
    github::{ApiError, NewTag, Release, ReleaseHost, Tagger},
    module::{MODULE_SUFFIX, ModuleFile},
};

/// The identity the tag objects are created under.
pub const TAGGER_NAME: &str = "GitHub Actions Bot";
/// See [`TAGGER_NAME`].
pub const TAGGER_EMAIL: &str = "actions@github.com";

/// What [`publish_release`] created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    /// The created tag.
    pub tag_name: String,
    /// The release title.
    pub title: String,
    /// The created release.
    pub release: Release,
    /// The name the module was uploaded under.
    pub asset_name: String,
}

/// The title of the release for `tag_name`.
pub fn release_title(tag_name: &str) -> String {
    format!("Release {tag_name}")
}

/// The message of the tag object for `version`.
pub fn tag_message(version: &str) -> String {
    format!("Tag for version {version}")
}

/// Tags the head of `branch` as `version`, publishes a release for the tag and attaches `module`.
///
/// The version is used verbatim as the tag name. Nothing is rolled back: if a later step fails,
/// whatever was created before stays.
///
/// # Errors
///
/// - [`ReleaseError::RemoteCallFailed`] if the branch cannot be resolved.
/// - [`ReleaseError::TagOrReleaseCreationFailed`] if the tag object, the tag ref or the release
///   cannot be created, an existing tag included.
/// - [`ReleaseError::AssetUploadFailed`] if the module cannot be uploaded.
pub async fn publish_release<H>(
    host: &H,
    branch: &str,
    version: &str,
    module: &ModuleFile,
) -> Result<PublishedRelease>
where
    H: ReleaseHost,
{
    let tag_name = version.to_owned();

    debug!("getting branch ref refs/heads/{branch}…");
    let commit = host.branch_head(branch).await.map_err(|source| ReleaseError::RemoteCallFailed {
        step: "get branch ref",
        source,
    })?;
    debug!("latest commit on {branch}: {commit}");

    let tag = NewTag::for_commit(
        tag_name.clone(),
        tag_message(version),
        commit,
        Tagger {
            name: TAGGER_NAME.to_owned(),
            email: TAGGER_EMAIL.to_owned(),
            date: Utc::now(),
        },
    );
    let tag_sha = host.create_tag(&tag).await.map_err(|source| {
        ReleaseError::TagOrReleaseCreationFailed {
            step: "create tag object",
            source,
        }
    })?;
    debug!("created tag object {tag_sha}");

    host.create_ref(&format!("refs/tags/{tag_name}"), &tag_sha)
        .await
        .map_err(|source| ReleaseError::TagOrReleaseCreationFailed {
            step: "create tag ref",
            source,
        })?;
    info!("created tag {tag_name}");

    let title = release_title(&tag_name);
    let release = host
        .create_release(&tag_name, &title)
        .await
        .map_err(|source| ReleaseError::TagOrReleaseCreationFailed {
            step: "create release",
            source,
        })?;
    debug!("created release {}", release.id);

    upload_module(host, &release, module).await?;

    Ok(PublishedRelease {
        tag_name,
        title,
        release,
        asset_name: module.filename.clone(),
    })
}

async fn upload_module<H>(host: &H, release: &Release, module: &ModuleFile) -> Result<()>
where
    H: ReleaseHost,
{
    let upload_failed = |source: ApiError| ReleaseError::AssetUploadFailed {
        name: module.filename.clone(),
        source,
    };

    let temp = tempfile::Builder::new()
        .prefix("mod-")
        .suffix(MODULE_SUFFIX)
        .tempfile()
        .map_err(|err| upload_failed(err.into()))?;
    tokio::fs::write(temp.path(), &module.bytes)
        .await
        .map_err(|err| upload_failed(err.into()))?;
    debug!("wrote {} to {:?}", module.filename, temp.path());

    debug!("uploading release asset {}…", module.filename);
    host.upload_asset(release, &module.filename, temp.path())
        .await
        .map_err(upload_failed)?;
    info!("uploaded release asset {}", module.filename);

    Ok(())
}
