//! The installation transaction.
//!
//! [`Installer::install`] takes a tooth from "not installed" to "installed"
//! through a fixed sequence of steps:
//!
//! 1. check that no installation record exists for the tooth;
//! 2. run the pre-install commands;
//! 3. place files from the asset archive into the workspace;
//! 4. run the post-install commands;
//! 5. write the installation record.
//!
//! Before any of these, the asset location is validated: a descriptor that
//! names an asset URL must be paired with a downloaded asset archive, and one
//! without an asset URL must not be. The first failing step aborts the
//! transaction. Nothing is rolled back; [`InstallFailure`] reports how far
//! the transaction got so the caller can tell the user what was left behind.

use crate::archive::{AssetArchive, ToothArchive};
use crate::command::{CommandContext, CommandExecutor, CommandPhase, run_commands};
use crate::config::InstallContext;
use crate::error::InstallerError;
use crate::placement::{PlacementReport, place_files};
use camino::{Utf8Path, Utf8PathBuf};
use lip_common::ToothPath;
use log::{debug, info};
use std::fmt;
use thiserror::Error;

/// Progress of an installation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstallState {
    /// No side effect has happened yet.
    NotStarted,
    /// Pre-install commands have all succeeded.
    PreInstallDone,
    /// Every placement rule has been applied.
    FilesPlaced,
    /// Post-install commands have all succeeded.
    PostInstallDone,
    /// The installation record has been written.
    Committed,
}

/// A step of the installation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Pairing the descriptor's asset URL with the supplied asset archive.
    ResolveAsset,
    /// Looking for an existing installation record.
    CheckInstalled,
    /// Running pre-install commands.
    PreInstall,
    /// Copying files into the workspace.
    PlaceFiles,
    /// Running post-install commands.
    PostInstall,
    /// Writing the installation record.
    Commit,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ResolveAsset => "resolve the asset archive",
            Self::CheckInstalled => "check for an existing installation",
            Self::PreInstall => "run pre-install commands",
            Self::PlaceFiles => "place files",
            Self::PostInstall => "run post-install commands",
            Self::Commit => "write the installation record",
        })
    }
}

/// A failed installation.
#[derive(Debug, Error)]
#[error("failed to {step}: {source}")]
pub struct InstallFailure {
    /// The step that failed.
    pub step: InstallStep,
    /// The last state reached before the failure.
    pub reached: InstallState,
    /// Root cause.
    #[source]
    pub source: InstallerError,
}

/// What to install.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    /// The tooth archive and its descriptor.
    pub tooth: &'a ToothArchive,
    /// Separately downloaded asset archive, required when the descriptor
    /// names an asset URL.
    pub asset_archive: Option<&'a Utf8Path>,
}

impl<'a> InstallRequest<'a> {
    /// Create a request that places files from the tooth archive itself.
    #[must_use]
    pub fn new(tooth: &'a ToothArchive) -> Self {
        Self {
            tooth,
            asset_archive: None,
        }
    }

    /// Places files from `asset_archive` instead of the tooth archive.
    #[must_use]
    pub fn with_asset_archive(mut self, asset_archive: &'a Utf8Path) -> Self {
        self.asset_archive = Some(asset_archive);
        self
    }
}

/// Summary of a successful installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Final state, always [`InstallState::Committed`].
    pub state: InstallState,
    /// Per-rule placement outcome.
    pub placement: PlacementReport,
    /// Path of the written installation record.
    pub record_path: Utf8PathBuf,
}

/// Archive that placement rules read from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AssetSource<'a> {
    archive: &'a Utf8Path,
    content_root: ToothPath,
}

/// Runs installation transactions against one workspace.
pub struct Installer<'a> {
    context: InstallContext,
    executor: &'a dyn CommandExecutor,
}

impl<'a> Installer<'a> {
    /// Create an installer for `context` that runs lifecycle commands with
    /// `executor`.
    #[must_use]
    pub fn new(context: InstallContext, executor: &'a dyn CommandExecutor) -> Self {
        Self { context, executor }
    }

    /// The settings this installer runs with.
    #[must_use]
    pub fn context(&self) -> &InstallContext {
        &self.context
    }

    /// Installs the tooth described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallFailure`] naming the failing step, the last state
    /// reached, and the underlying [`InstallerError`]. Steps completed
    /// before the failure are not undone.
    pub fn install(&self, request: &InstallRequest<'_>) -> Result<InstallReport, InstallFailure> {
        let metadata = request.tooth.metadata();
        let mut state = InstallState::NotStarted;
        let fail = |step: InstallStep, reached: InstallState| {
            move |source: InstallerError| InstallFailure {
                step,
                reached,
                source,
            }
        };

        let asset = resolve_asset(request).map_err(fail(InstallStep::ResolveAsset, state))?;

        let store = self.context.metadata_store();
        let installed = store
            .is_installed(&metadata.tooth)
            .map_err(fail(InstallStep::CheckInstalled, state))?;
        if installed {
            return Err(fail(InstallStep::CheckInstalled, state)(
                InstallerError::AlreadyInstalled {
                    tooth: metadata.tooth.clone(),
                },
            ));
        }

        info!("Installing {}", metadata.tooth);
        let commands = CommandContext {
            working_dir: self.context.workspace_root(),
            env: self.context.command_env(),
        };

        run_commands(
            self.executor,
            CommandPhase::PreInstall,
            &metadata.commands.pre_install,
            commands,
        )
        .map_err(fail(InstallStep::PreInstall, state))?;
        state = InstallState::PreInstallDone;

        let placement = self
            .place(&asset, request)
            .map_err(fail(InstallStep::PlaceFiles, state))?;
        state = InstallState::FilesPlaced;
        debug!(
            "Placed {} file(s) for {}",
            placement.files_written(),
            metadata.tooth
        );

        run_commands(
            self.executor,
            CommandPhase::PostInstall,
            &metadata.commands.post_install,
            commands,
        )
        .map_err(fail(InstallStep::PostInstall, state))?;
        state = InstallState::PostInstallDone;

        let record_path = store
            .write_record(metadata)
            .map_err(fail(InstallStep::Commit, state))?;
        state = InstallState::Committed;
        info!("Installed {}", metadata.tooth);

        Ok(InstallReport {
            state,
            placement,
            record_path,
        })
    }

    fn place(
        &self,
        asset: &AssetSource<'_>,
        request: &InstallRequest<'_>,
    ) -> crate::error::Result<PlacementReport> {
        let mut archive = AssetArchive::open(asset.archive)?;
        place_files(
            &request.tooth.metadata().files.place,
            &mut archive,
            &asset.content_root,
            self.context.workspace_root(),
        )
    }
}

fn resolve_asset<'a>(request: &InstallRequest<'a>) -> crate::error::Result<AssetSource<'a>> {
    let asset_url = request.tooth.metadata().asset_url();
    match (asset_url, request.asset_archive) {
        (None, None) => Ok(AssetSource {
            archive: request.tooth.path(),
            content_root: request.tooth.content_root().clone(),
        }),
        (Some(_), Some(archive)) => Ok(AssetSource {
            archive,
            content_root: ToothPath::empty(),
        }),
        (url, archive) => Err(InstallerError::AssetLocationMismatch {
            asset_url: url.unwrap_or_default().to_owned(),
            asset_archive: archive.map(Utf8Path::to_owned),
        }),
    }
}
