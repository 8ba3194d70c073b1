//! Installation records.
//!
//! A successful installation leaves a copy of the tooth descriptor in the
//! metadata directory at `<metadata_dir>/<escaped identity>.json`. The
//! presence of that file is what marks a tooth as installed.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use lip_common::{ToothMetadata, ToothRepoPath};
use log::debug;
use std::io::Write;

const RECORD_EXTENSION: &str = "json";

/// Directory of installation records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataStore {
    dir: Utf8PathBuf,
}

impl MetadataStore {
    /// Create a store rooted at `dir`. The directory need not exist yet.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The metadata directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the record for `tooth`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lip_common::ToothRepoPath;
    /// use lip_installer::record::MetadataStore;
    ///
    /// let store = MetadataStore::new("/work/.lip/metadata");
    /// let path = store.record_path(&ToothRepoPath::from("example.org/pkg"));
    /// assert_eq!(path.file_name(), Some("example.org%2Fpkg.json"));
    /// ```
    #[must_use]
    pub fn record_path(&self, tooth: &ToothRepoPath) -> Utf8PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", tooth.escaped()))
    }

    /// Returns `true` when a record exists for `tooth`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::RecordQuery`] if the record's existence
    /// cannot be determined.
    pub fn is_installed(&self, tooth: &ToothRepoPath) -> Result<bool> {
        let path = self.record_path(tooth);
        path.try_exists()
            .map_err(|source| InstallerError::RecordQuery { path, source })
    }

    /// Writes the record for `metadata`, returning its path.
    ///
    /// The metadata directory is created when missing. An existing record
    /// is overwritten; callers check [`MetadataStore::is_installed`] first.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::CreateDirectory`] or
    /// [`InstallerError::RecordWrite`] on I/O failure and
    /// [`InstallerError::Metadata`] if serialization fails.
    pub fn write_record(&self, metadata: &ToothMetadata) -> Result<Utf8PathBuf> {
        let json = metadata.to_json()?;

        std::fs::create_dir_all(&self.dir).map_err(|source| InstallerError::CreateDirectory {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.record_path(&metadata.tooth);
        write_file(&path, json.as_bytes()).map_err(|source| InstallerError::RecordWrite {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote installation record {path}");
        Ok(path)
    }

    /// Reads the record for `tooth`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::RecordQuery`] if the file cannot be read and
    /// [`InstallerError::Metadata`] if it does not hold a valid descriptor.
    pub fn read_record(&self, tooth: &ToothRepoPath) -> Result<Option<ToothMetadata>> {
        let path = self.record_path(tooth);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(InstallerError::RecordQuery { path, source }),
        };
        Ok(Some(ToothMetadata::from_json(&json)?))
    }
}

#[cfg(unix)]
fn write_file(path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_file(path: &Utf8Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents)
}
