//! Reads the mod version out of the `mod.json` packed inside a module file.

use serde::Deserialize;
use serde_json::{Deserializer, Value};
use tracing::debug;

use crate::{ReleaseError, Result, archive::Archive};

/// Any module entry whose name ends with this is the metadata file, wherever it sits.
pub const METADATA_FILE: &str = "mod.json";

/// The part of `mod.json` the release cares about. Every other field is ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// The mod version, `None` when absent or `null`.
    #[serde(default)]
    pub version: Option<String>,
}

impl ModuleMetadata {
    /// Decodes the first JSON value of `content`. Whatever follows it is ignored.
    ///
    /// A `null` document has no version. The `version` key is matched exactly first, then ignoring
    /// ASCII case.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] on malformed or empty JSON, a document that is neither an
    /// object nor `null`, or a `version` that is neither a string nor `null`.
    pub fn from_slice(content: &[u8]) -> Result<Self, serde_json::Error> {
        let mut deserializer = Deserializer::from_slice(content);
        let object = match Value::deserialize(&mut deserializer)? {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => return Self::deserialize(other),
        };

        let version = object.get("version").or_else(|| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("version"))
                .map(|(_, value)| value)
        });
        let version = match version {
            None | Some(Value::Null) => None,
            Some(value) => Some(String::deserialize(value)?),
        };

        Ok(Self { version })
    }
}

/// Opens `module` as an archive and returns the `version` of its metadata file, verbatim.
///
/// The first file entry whose name ends with [`METADATA_FILE`] is used, so `assets/mod.json`
/// counts as much as `mod.json`. The version is not trimmed or checked against any versioning
/// scheme.
///
/// # Errors
///
/// - [`ReleaseError::CorruptArchive`] if `module` is not a readable zip archive.
/// - [`ReleaseError::MetadataNotFound`] if there is no metadata file.
/// - [`ReleaseError::MetadataCorrupt`] if the metadata file is not the expected JSON.
/// - [`ReleaseError::MissingVersion`] if the version is absent, `null` or empty.
pub fn read_version(module: &[u8]) -> Result<String> {
    let mut archive = Archive::open(module)?;
    let Some(entry) = archive.find(|name| name.ends_with(METADATA_FILE)) else {
        return Err(ReleaseError::MetadataNotFound {
            file: METADATA_FILE,
        });
    };
    debug!("found {METADATA_FILE} inside module file at {}", entry.name);

    let content = archive.read(&entry)?;
    let metadata =
        ModuleMetadata::from_slice(&content).map_err(|source| ReleaseError::MetadataCorrupt {
            file: entry.name.clone(),
            source,
        })?;

    match metadata.version {
        Some(version) if !version.is_empty() => Ok(version),
        _ => Err(ReleaseError::MissingVersion { file: entry.name }),
    }
}
