//! Locates the packaged `.geode` module inside a build artifact.

use tracing::{debug, warn};

use crate::{ReleaseError, Result, archive::Archive};

/// Any artifact entry whose name ends with this is a module file.
pub const MODULE_SUFFIX: &str = ".geode";

/// A module file extracted from an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    /// The full path of the entry inside the artifact.
    pub path: String,
    /// The base name of [`Self::path`], used as the release asset name.
    pub filename: String,
    /// The content of the module file.
    pub bytes: Vec<u8>,
}

/// Extracts the first module file of `archive`, in central directory order.
///
/// Names are matched by a case-sensitive suffix, so `build/foo.geode` qualifies and
/// `build/FOO.GEODE` does not. When several entries qualify the first one wins and the rest are
/// only reported in the logs.
///
/// # Errors
///
/// Returns [`ReleaseError::ModuleNotFound`] if no file entry ends with [`MODULE_SUFFIX`], or
/// [`ReleaseError::CorruptArchive`] if the matching entry cannot be read.
pub fn locate_module(archive: &mut Archive<'_>) -> Result<ModuleFile> {
    let (entry, ignored) = {
        let mut candidates = archive
            .entries()
            .filter(|entry| !entry.is_dir && entry.name.ends_with(MODULE_SUFFIX));
        let entry = candidates.next();
        let ignored: Vec<String> = candidates.map(|entry| entry.name).collect();
        (entry, ignored)
    };

    let Some(entry) = entry else {
        return Err(ReleaseError::ModuleNotFound {
            suffix: MODULE_SUFFIX,
        });
    };
    if !ignored.is_empty() {
        warn!(
            "artifact holds {} {MODULE_SUFFIX} files, using {} and ignoring {}",
            ignored.len() + 1,
            entry.name,
            ignored.join(", ")
        );
    }

    let bytes = archive.read(&entry)?;
    debug!(
        "extracted {MODULE_SUFFIX} file from artifact: {} ({} bytes)",
        entry.name,
        bytes.len()
    );

    Ok(ModuleFile {
        filename: base_name(&entry.name).to_owned(),
        path: entry.name,
        bytes,
    })
}

/// Strips every leading directory from a slash-separated archive path.
pub fn base_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}
