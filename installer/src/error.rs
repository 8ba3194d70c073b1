//! Error types for the lip installer.
//!
//! Each variant names one root cause of a failed installation. Variants fall
//! into five groups: configuration, conflicts, lifecycle commands, I/O, and
//! paths. The transaction layer wraps them with the step that failed; see
//! [`crate::transaction::InstallFailure`].

use crate::command::CommandPhase;
use camino::Utf8PathBuf;
use lip_common::{MetadataError, PathError, ToothRepoPath};
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The descriptor's asset URL and the supplied asset archive disagree.
    #[error(
        "asset archive and asset URL must be both specified or both empty \
         (asset URL: {asset_url:?}, asset archive: {asset_archive:?})"
    )]
    AssetLocationMismatch {
        /// Asset URL declared by the descriptor, empty when absent.
        asset_url: String,
        /// Asset archive supplied by the caller, if any.
        asset_archive: Option<Utf8PathBuf>,
    },

    /// The installer configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    Config {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// An installation record already exists for the tooth.
    #[error("tooth {tooth} is already installed")]
    AlreadyInstalled {
        /// Identity of the installed tooth.
        tooth: ToothRepoPath,
    },

    /// A placement rule targets a path that already exists.
    #[error("destination {path} already exists")]
    DestinationExists {
        /// The occupied destination.
        path: Utf8PathBuf,
    },

    /// Checking whether a destination exists failed.
    #[error("failed to inspect destination {path}: {source}")]
    DestinationCheck {
        /// The destination being inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A lifecycle command ran and exited unsuccessfully.
    #[error("{phase} command `{command}` failed with {status}")]
    CommandFailed {
        /// Lifecycle phase the command belongs to.
        phase: CommandPhase,
        /// The command line as declared.
        command: String,
        /// Exit status reported by the shell.
        status: ExitStatus,
    },

    /// A lifecycle command could not be started.
    #[error("failed to launch {phase} command `{command}`: {source}")]
    CommandLaunch {
        /// Lifecycle phase the command belongs to.
        phase: CommandPhase,
        /// The command line as declared.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or is not a valid ZIP file.
    #[error("failed to open archive {path}: {source}")]
    ArchiveOpen {
        /// Path to the archive.
        path: Utf8PathBuf,
        /// Underlying ZIP error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry could not be read from an open archive.
    #[error("failed to read entry {entry} of archive {path}: {source}")]
    ArchiveRead {
        /// Path to the archive.
        path: Utf8PathBuf,
        /// Name of the entry.
        entry: String,
        /// Underlying ZIP error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The tooth archive does not contain a `tooth.json` descriptor.
    #[error("tooth archive {path} does not contain tooth.json")]
    ToothManifestNotFound {
        /// Path to the tooth archive.
        path: Utf8PathBuf,
    },

    /// A directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Copying an archive entry to its destination failed.
    #[error("failed to copy {entry} to {path}: {source}")]
    CopyFailed {
        /// Name of the archive entry.
        entry: String,
        /// Destination file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Checking for an installation record failed.
    #[error("failed to query installation record {path}: {source}")]
    RecordQuery {
        /// Path of the record.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing an installation record failed.
    #[error("failed to write installation record {path}: {source}")]
    RecordWrite {
        /// Path of the record.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tooth descriptor could not be parsed or serialized.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// A placement rule or archive entry path is malformed.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// A platform directory could not be determined.
    #[error("could not determine {what}")]
    DirectoryNotFound {
        /// Which directory was being resolved.
        what: &'static str,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
