//! Platform directory resolution.
//!
//! The installer reads its global configuration from the platform config
//! directory. Access goes through [`BaseDirs`] so tests can supply their own
//! locations.

use directories_next::ProjectDirs;
use std::path::PathBuf;

const CONFIG_FILENAME: &str = "config.toml";

/// Source of platform directories used by the installer.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory holding lip's global configuration.
    fn lip_config_dir(&self) -> Option<PathBuf>;
}

/// Path of the global configuration file, if a config directory is known.
#[must_use]
pub fn config_file(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.lip_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// [`BaseDirs`] backed by the platform conventions of `directories-next`.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    project: ProjectDirs,
}

impl SystemBaseDirs {
    /// Resolves platform directories, returning `None` when no home
    /// directory can be determined.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lip_installer::dirs::{BaseDirs, SystemBaseDirs};
    ///
    /// let dirs = SystemBaseDirs::new().expect("failed to initialise directories");
    /// assert!(dirs.lip_config_dir().is_some());
    /// ```
    #[must_use]
    pub fn new() -> Option<Self> {
        ProjectDirs::from("org", "lippkg", "lip").map(|project| Self { project })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn lip_config_dir(&self) -> Option<PathBuf> {
        Some(self.project.config_dir().to_path_buf())
    }
}
