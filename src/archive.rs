//! Random-access view over a zip archive held in memory.

use std::{
    fmt,
    io::{Cursor, Read as _},
};

use zip::{ZipArchive, result::ZipError};

use crate::Result;

/// An entry of an [`Archive`], in central directory order. The content is read on demand through
/// [`Archive::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// The position of the entry in the central directory.
    pub index: usize,
    /// The path of the entry, separated by forward slashes.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// A zip archive opened over borrowed bytes. The bytes are never modified, so the same buffer can
/// be opened any number of times.
pub struct Archive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Archive<'a> {
    /// Opens `bytes` as a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReleaseError::CorruptArchive`] if the bytes are not a readable zip archive.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }
}

impl Archive<'_> {
    /// The number of entries, directories included.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    /// Whether the archive has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Iterates the entries in central directory order without reading any content.
    pub fn entries(&self) -> impl Iterator<Item = ArchiveEntry> + '_ {
        (0..self.zip.len()).filter_map(|index| {
            let name = self.zip.name_for_index(index)?;
            Some(ArchiveEntry {
                index,
                name: name.to_owned(),
                is_dir: is_dir(name),
            })
        })
    }

    /// Finds the first file entry whose name satisfies `predicate`. Directories are skipped.
    pub fn find<F>(&self, predicate: F) -> Option<ArchiveEntry>
    where
        F: Fn(&str) -> bool,
    {
        self.entries()
            .find(|entry| !entry.is_dir && predicate(&entry.name))
    }

    /// Reads the whole content of `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReleaseError::CorruptArchive`] if the entry cannot be decompressed or fails
    /// its checksum.
    pub fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let mut file = self.zip.by_index(entry.index)?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).map_err(ZipError::from)?;
        Ok(content)
    }
}

impl fmt::Debug for Archive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.zip.len())
            .finish()
    }
}

/// Lists every entry name of the archive in `bytes`, directories included, in central directory
/// order. Meant for troubleshooting output only.
///
/// # Errors
///
/// Returns [`crate::ReleaseError::CorruptArchive`] if the bytes are not a readable zip archive.
pub fn list_entries(bytes: &[u8]) -> Result<Vec<String>> {
    let archive = Archive::open(bytes)?;
    Ok(archive.entries().map(|entry| entry.name).collect())
}

// Same rule the zip crate applies to its own entries.
fn is_dir(name: &str) -> bool {
    name.ends_with('/') || name.ends_with('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReleaseError, test_support::ZipBuilder};

    #[test]
    fn rejects_bytes_that_are_not_an_archive() {
        let inputs: [&[u8]; 3] = [b"", b"not a zip at all", b"PK\x03\x04 truncated"];
        for bytes in inputs {
            assert!(matches!(
                Archive::open(bytes),
                Err(ReleaseError::CorruptArchive(_))
            ));
            assert!(matches!(
                list_entries(bytes),
                Err(ReleaseError::CorruptArchive(_))
            ));
        }
    }

    #[test]
    fn rejects_a_truncated_central_directory() {
        let bytes = ZipBuilder::new().file("a.txt", "hello").build();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            Archive::open(truncated),
            Err(ReleaseError::CorruptArchive(_))
        ));
    }

    #[test]
    fn yields_entries_in_archive_order() {
        let bytes = ZipBuilder::new()
            .file("z.txt", "last letter, first entry")
            .dir("build/")
            .file("build/a.txt", "a")
            .build();

        let archive = Archive::open(&bytes).unwrap();
        assert_eq!(archive.len(), 3);
        assert!(!archive.is_empty());

        let entries: Vec<_> = archive.entries().collect();
        assert_eq!(
            entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            ["z.txt", "build/", "build/a.txt"]
        );
        assert_eq!(
            entries.iter().map(|e| e.is_dir).collect::<Vec<_>>(),
            [false, true, false]
        );
    }

    #[test]
    fn reads_entry_content() {
        let bytes = ZipBuilder::new()
            .file("a.txt", "alpha")
            .file("b.txt", "beta")
            .build();

        let mut archive = Archive::open(&bytes).unwrap();
        let entry = archive.find(|name| name == "b.txt").unwrap();
        assert_eq!(archive.read(&entry).unwrap(), b"beta");
    }

    #[test]
    fn rejects_an_entry_with_a_bad_checksum() {
        let mut bytes = ZipBuilder::new().file("a.txt", "hello world").build();
        let at = bytes
            .windows(b"hello world".len())
            .position(|window| window == b"hello world")
            .unwrap();
        bytes[at] ^= 0xff;

        let mut archive = Archive::open(&bytes).unwrap();
        let entry = archive.find(|name| name == "a.txt").unwrap();
        assert!(matches!(
            archive.read(&entry),
            Err(ReleaseError::CorruptArchive(_))
        ));
    }

    #[test]
    fn find_skips_directories() {
        let bytes = ZipBuilder::new()
            .dir("data.geode/")
            .file("out/data.geode", "module")
            .build();

        let archive = Archive::open(&bytes).unwrap();
        let entry = archive.find(|name| name.contains("data.geode")).unwrap();
        assert_eq!(entry.name, "out/data.geode");
    }

    #[test]
    fn the_same_bytes_can_be_opened_twice() {
        let bytes = ZipBuilder::new().file("a.txt", "alpha").build();

        let first = list_entries(&bytes).unwrap();
        let second = list_entries(&bytes).unwrap();
        assert_eq!(first, ["a.txt"]);
        assert_eq!(first, second);
    }
}
