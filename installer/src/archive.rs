//! ZIP archive access for tooth and asset archives.
//!
//! [`AssetArchive`] opens an archive once, indexes its entries in archive
//! order, and streams individual entries on request. The underlying file
//! handle is owned by the value and released when it is dropped.
//!
//! [`ToothArchive`] pairs a tooth archive with the descriptor found inside it
//! and the content root under which its placement sources resolve.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use lip_common::{PathError, ToothMetadata, ToothPath};
use log::trace;
use std::fs::File;
use std::io::{Read, Write};
use zip::ZipArchive;

/// File name of the descriptor inside a tooth archive.
pub const TOOTH_MANIFEST_NAME: &str = "tooth.json";

/// One entry of an archive, as listed in its central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    index: usize,
    name: String,
    is_dir: bool,
}

impl ArchiveEntry {
    /// Position of the entry in archive order.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw entry name as stored in the archive.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for directory entries.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Parses the entry name into a normalized path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the name is rooted or escapes the archive.
    pub fn path(&self) -> std::result::Result<ToothPath, PathError> {
        ToothPath::parse(&self.name)
    }
}

/// An open ZIP archive.
pub struct AssetArchive {
    path: Utf8PathBuf,
    zip: ZipArchive<File>,
    entries: Vec<ArchiveEntry>,
}

impl AssetArchive {
    /// Opens the archive at `path` and indexes its entries.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ArchiveOpen`] if the file cannot be opened
    /// or is not a valid ZIP archive, and [`InstallerError::ArchiveRead`] if
    /// an entry header cannot be read.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| InstallerError::ArchiveOpen {
            path: path.to_owned(),
            source: source.into(),
        })?;
        let mut zip = ZipArchive::new(file).map_err(|source| InstallerError::ArchiveOpen {
            path: path.to_owned(),
            source,
        })?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip
                .by_index_raw(index)
                .map_err(|source| InstallerError::ArchiveRead {
                    path: path.to_owned(),
                    entry: format!("#{index}"),
                    source,
                })?;
            entries.push(ArchiveEntry {
                index,
                name: file.name().to_owned(),
                is_dir: file.is_dir(),
            });
        }
        trace!("Opened archive {path} with {} entries", entries.len());

        Ok(Self {
            path: path.to_owned(),
            zip,
            entries,
        })
    }

    /// Path the archive was opened from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Entries in archive order.
    #[must_use]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Streams the contents of `entry` into `writer`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ArchiveRead`] if the entry cannot be opened
    /// and [`InstallerError::CopyFailed`] if reading or writing fails midway.
    pub fn copy_entry(
        &mut self,
        entry: &ArchiveEntry,
        writer: &mut dyn Write,
        destination: &Utf8Path,
    ) -> Result<u64> {
        let mut reader = self.open_entry(entry)?;
        std::io::copy(&mut reader, writer).map_err(|source| InstallerError::CopyFailed {
            entry: entry.name.clone(),
            path: destination.to_owned(),
            source,
        })
    }

    /// Reads `entry` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ArchiveRead`] if the entry cannot be opened
    /// and [`InstallerError::Io`] if it cannot be decoded.
    pub fn read_to_string(&mut self, entry: &ArchiveEntry) -> Result<String> {
        let mut reader = self.open_entry(entry)?;
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(content)
    }

    fn open_entry(&mut self, entry: &ArchiveEntry) -> Result<impl Read + '_> {
        self.zip
            .by_index(entry.index)
            .map_err(|source| InstallerError::ArchiveRead {
                path: self.path.clone(),
                entry: entry.name.clone(),
                source,
            })
    }
}

/// A tooth archive together with its descriptor and content root.
#[derive(Debug, Clone)]
pub struct ToothArchive {
    path: Utf8PathBuf,
    metadata: ToothMetadata,
    content_root: ToothPath,
}

impl ToothArchive {
    /// Assemble a tooth archive from parts already known to the caller.
    #[must_use]
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        metadata: ToothMetadata,
        content_root: ToothPath,
    ) -> Self {
        Self {
            path: path.into(),
            metadata,
            content_root,
        }
    }

    /// Opens a tooth archive and reads its descriptor.
    ///
    /// The shallowest `tooth.json` file in the archive is the descriptor and
    /// its directory becomes the content root. Entries whose names cannot be
    /// parsed are ignored during the search.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ToothManifestNotFound`] when no descriptor is
    /// present, [`InstallerError::Metadata`] when it cannot be parsed, and
    /// archive errors from [`AssetArchive::open`].
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let mut archive = AssetArchive::open(path)?;

        let manifest = archive
            .entries()
            .iter()
            .filter(|entry| !entry.is_dir())
            .filter_map(|entry| entry.path().ok().map(|parsed| (entry.clone(), parsed)))
            .filter(|(_, parsed)| parsed.file_name() == Some(TOOTH_MANIFEST_NAME))
            .min_by_key(|(_, parsed)| parsed.segments().len());

        let Some((entry, manifest_path)) = manifest else {
            return Err(InstallerError::ToothManifestNotFound {
                path: path.to_owned(),
            });
        };

        let json = archive.read_to_string(&entry)?;
        let metadata = ToothMetadata::from_json(&json)?;
        let content_root = manifest_path.parent().unwrap_or_default();
        trace!(
            "Found {} for {} under content root {content_root:?}",
            entry.name(),
            metadata.tooth
        );

        Ok(Self::new(path, metadata, content_root))
    }

    /// Path of the tooth archive.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The tooth descriptor.
    #[must_use]
    pub fn metadata(&self) -> &ToothMetadata {
        &self.metadata
    }

    /// Directory inside the archive under which placement sources resolve.
    #[must_use]
    pub fn content_root(&self) -> &ToothPath {
        &self.content_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_zip;

    fn temp_archive(entries: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("tooth.zip")).expect("utf-8 path");
        write_zip(&path, entries).expect("write zip");
        (dir, path)
    }

    #[test]
    fn lists_entries_in_archive_order() {
        let (_dir, path) = temp_archive(&[("a/", ""), ("a/b.txt", "b"), ("a/bb.txt", "bb")]);
        let archive = AssetArchive::open(&path).expect("open");

        let names: Vec<_> = archive.entries().iter().map(ArchiveEntry::name).collect();
        assert_eq!(names, vec!["a/", "a/b.txt", "a/bb.txt"]);
        assert!(archive.entries()[0].is_dir());
        assert!(!archive.entries()[1].is_dir());
    }

    #[test]
    fn entries_can_be_read_repeatedly() {
        let (_dir, path) = temp_archive(&[("bin/tool", "X")]);
        let mut archive = AssetArchive::open(&path).expect("open");
        let entry = archive.entries()[0].clone();

        assert_eq!(archive.read_to_string(&entry).expect("first read"), "X");
        assert_eq!(archive.read_to_string(&entry).expect("second read"), "X");
    }

    #[test]
    fn missing_archive_fails_to_open() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing.zip")).expect("utf-8 path");

        let err = AssetArchive::open(&path).err().expect("open fails");
        assert!(matches!(err, InstallerError::ArchiveOpen { .. }));
    }

    #[test]
    fn non_zip_file_fails_to_open() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("bogus.zip")).expect("utf-8 path");
        std::fs::write(&path, b"not a zip").expect("write");

        let err = AssetArchive::open(&path).err().expect("open fails");
        assert!(matches!(err, InstallerError::ArchiveOpen { .. }));
    }

    #[test]
    fn tooth_archive_finds_nested_descriptor() {
        let (_dir, path) = temp_archive(&[
            ("example@v1.0.0/tooth.json", r#"{ "tooth": "example.org/pkg" }"#),
            ("example@v1.0.0/vendor/tooth.json", r#"{ "tooth": "example.org/vendored" }"#),
            ("example@v1.0.0/bin/tool", "X"),
        ]);

        let tooth = ToothArchive::open(&path).expect("open tooth archive");
        assert_eq!(tooth.metadata().tooth.as_str(), "example.org/pkg");
        assert_eq!(tooth.content_root(), &ToothPath::new(["example@v1.0.0"]));
        assert_eq!(tooth.path(), path.as_path());
    }

    #[test]
    fn tooth_archive_at_root_has_empty_content_root() {
        let (_dir, path) = temp_archive(&[("tooth.json", r#"{ "tooth": "a.b/c" }"#)]);

        let tooth = ToothArchive::open(&path).expect("open tooth archive");
        assert!(tooth.content_root().is_empty());
    }

    #[test]
    fn tooth_archive_without_descriptor_is_rejected() {
        let (_dir, path) = temp_archive(&[("bin/tool", "X")]);

        let err = ToothArchive::open(&path).expect_err("no descriptor");
        assert!(matches!(err, InstallerError::ToothManifestNotFound { .. }));
    }
}
