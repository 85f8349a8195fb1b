//! Errors raised by the release pipeline.

use thiserror::Error;

use crate::github::ApiError;

/// An error that aborts the release pipeline.
///
/// Every variant names the step that failed. Nothing is retried or rolled back, so a failure after
/// the tag was created leaves the tag in place.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A required flag or credential is absent.
    #[error("missing required configuration: {what}")]
    ConfigMissing {
        /// What is missing.
        what: &'static str,
    },

    /// A hosting API call failed before anything was created.
    #[error("failed to {step}: {source}")]
    RemoteCallFailed {
        /// The step that issued the call.
        step: &'static str,
        /// The underlying failure.
        #[source]
        source: ApiError,
    },

    /// The workflow has no completed runs on the branch.
    #[error("no completed workflow runs found for workflow '{workflow}' on branch '{branch}'")]
    NoRunsFound {
        /// The workflow file name.
        workflow: String,
        /// The branch name.
        branch: String,
    },

    /// No artifact with the expected name belongs to the selected run.
    #[error("artifact '{name}' not found for workflow run {run_id}")]
    ArtifactNotFound {
        /// The expected artifact name.
        name: &'static str,
        /// The selected workflow run.
        run_id: u64,
    },

    /// Downloading the artifact failed, or the download did not match its digest.
    #[error("failed to download artifact: {0}")]
    DownloadFailed(#[source] ApiError),

    /// Some bytes could not be read as a zip archive.
    #[error("corrupt archive: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),

    /// The artifact holds no module file.
    #[error("{suffix} file not found in artifact")]
    ModuleNotFound {
        /// The module file suffix.
        suffix: &'static str,
    },

    /// The module file holds no metadata file.
    #[error("{file} not found inside module file")]
    MetadataNotFound {
        /// The metadata file name.
        file: &'static str,
    },

    /// The metadata file is not the expected JSON.
    #[error("failed to decode {file}: {source}")]
    MetadataCorrupt {
        /// The entry that failed to decode.
        file: String,
        /// The underlying failure.
        #[source]
        source: serde_json::Error,
    },

    /// The metadata file has no usable version.
    #[error("version key not found in {file}")]
    MissingVersion {
        /// The entry that was decoded.
        file: String,
    },

    /// Creating the tag object, the tag ref or the release failed.
    #[error("failed to {step}: {source}")]
    TagOrReleaseCreationFailed {
        /// The step that failed.
        step: &'static str,
        /// The underlying failure.
        #[source]
        source: ApiError,
    },

    /// Uploading the module file to the release failed.
    #[error("failed to upload release asset {name}: {source}")]
    AssetUploadFailed {
        /// The asset name.
        name: String,
        /// The underlying failure.
        #[source]
        source: ApiError,
    },
}

/// A [`std::result::Result`] defaulting to [`ReleaseError`].
pub type Result<T, E = ReleaseError> = std::result::Result<T, E>;

impl ReleaseError {
    /// The process exit code for this error, one per kind. Codes start at 3, clap exits with 2 on
    /// usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigMissing { .. } => 3,
            Self::RemoteCallFailed { .. } => 4,
            Self::NoRunsFound { .. } => 5,
            Self::ArtifactNotFound { .. } => 6,
            Self::DownloadFailed(_) => 7,
            Self::CorruptArchive(_) => 8,
            Self::ModuleNotFound { .. } => 9,
            Self::MetadataNotFound { .. } => 10,
            Self::MetadataCorrupt { .. } => 11,
            Self::MissingVersion { .. } => 12,
            Self::TagOrReleaseCreationFailed { .. } => 13,
            Self::AssetUploadFailed { .. } => 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            ReleaseError::ConfigMissing { what: "--owner" },
            ReleaseError::RemoteCallFailed {
                step: "list artifacts",
                source: ApiError::MissingLocation,
            },
            ReleaseError::NoRunsFound {
                workflow: "multi-platform.yml".to_owned(),
                branch: "main".to_owned(),
            },
            ReleaseError::ArtifactNotFound {
                name: "Build Output",
                run_id: 1,
            },
            ReleaseError::DownloadFailed(ApiError::MissingLocation),
            ReleaseError::CorruptArchive(zip::result::ZipError::FileNotFound),
            ReleaseError::ModuleNotFound { suffix: ".geode" },
            ReleaseError::MetadataNotFound { file: "mod.json" },
            ReleaseError::MetadataCorrupt {
                file: "mod.json".to_owned(),
                source: serde_json::from_str::<u8>("{").unwrap_err(),
            },
            ReleaseError::MissingVersion {
                file: "mod.json".to_owned(),
            },
            ReleaseError::TagOrReleaseCreationFailed {
                step: "create release",
                source: ApiError::MissingLocation,
            },
            ReleaseError::AssetUploadFailed {
                name: "mod.geode".to_owned(),
                source: ApiError::MissingLocation,
            },
        ];

        let codes: HashSet<u8> = errors.iter().map(ReleaseError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|code| *code > 2));
    }

    #[test]
    fn messages_name_the_failing_step() {
        let err = ReleaseError::NoRunsFound {
            workflow: "multi-platform.yml".to_owned(),
            branch: "main".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "no completed workflow runs found for workflow 'multi-platform.yml' on branch 'main'"
        );

        let err = ReleaseError::RemoteCallFailed {
            step: "list workflow runs",
            source: ApiError::MissingLocation,
        };
        assert!(
            err.to_string()
                .starts_with("failed to list workflow runs: ")
        );
    }
}
