//! Installer configuration.
//!
//! Settings come from an optional global `config.toml` in the platform config
//! directory, then from command-line overrides. The resolved values travel
//! through the installer as an [`InstallContext`], which is the only place
//! the workspace root and metadata directory are decided.

use crate::dirs::{BaseDirs, config_file};
use crate::error::{InstallerError, Result};
use crate::record::MetadataStore;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Metadata directory used when neither the config file nor the command line
/// names one, relative to the workspace root.
pub const DEFAULT_METADATA_DIR: &str = ".lip/metadata";

/// Contents of the global configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Where installation records are kept. Relative paths resolve against
    /// the workspace root.
    pub metadata_dir: Option<Utf8PathBuf>,
    /// Extra environment variables for lifecycle commands.
    pub command_env: BTreeMap<String, String>,
}

impl InstallerConfig {
    /// Loads the global configuration file, falling back to defaults when
    /// there is no config directory or no file.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the file exists but cannot be
    /// read or parsed.
    pub fn load(dirs: &dyn BaseDirs) -> Result<Self> {
        let Some(path) = config_file(dirs) else {
            debug!("No config directory; using default configuration");
            return Ok(Self::default());
        };
        let path = Utf8PathBuf::from_path_buf(path).map_err(|path| InstallerError::Config {
            path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
            reason: "path is not valid UTF-8".to_owned(),
        })?;
        Self::load_from(&path)
    }

    /// Loads configuration from `path`, returning defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Config`] when the file cannot be read or
    /// parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use lip_installer::config::InstallerConfig;
    ///
    /// let config = InstallerConfig::load_from(Utf8Path::new("/nonexistent/config.toml"))?;
    /// assert_eq!(config, InstallerConfig::default());
    /// # Ok::<(), lip_installer::error::InstallerError>(())
    /// ```
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {path}; using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(InstallerError::Config {
                    path: path.to_owned(),
                    reason: err.to_string(),
                });
            }
        };
        Self::parse(&text).map_err(|reason| InstallerError::Config {
            path: path.to_owned(),
            reason,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }
}

/// Resolved settings for one installation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallContext {
    workspace_root: Utf8PathBuf,
    metadata_dir: Utf8PathBuf,
    command_env: BTreeMap<String, String>,
}

impl InstallContext {
    /// Create a context for `workspace_root` with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use lip_installer::config::InstallContext;
    ///
    /// let context = InstallContext::new("/work");
    /// assert_eq!(context.metadata_dir(), Utf8Path::new("/work/.lip/metadata"));
    /// ```
    #[must_use]
    pub fn new(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        Self::from_config(workspace_root, &InstallerConfig::default())
    }

    /// Create a context for `workspace_root` using `config`.
    #[must_use]
    pub fn from_config(workspace_root: impl Into<Utf8PathBuf>, config: &InstallerConfig) -> Self {
        let workspace_root = workspace_root.into();
        let metadata_dir = resolve(
            &workspace_root,
            config
                .metadata_dir
                .as_deref()
                .unwrap_or(Utf8Path::new(DEFAULT_METADATA_DIR)),
        );
        Self {
            workspace_root,
            metadata_dir,
            command_env: config.command_env.clone(),
        }
    }

    /// Overrides the metadata directory. Relative paths resolve against the
    /// workspace root.
    #[must_use]
    pub fn with_metadata_dir(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.metadata_dir = resolve(&self.workspace_root, dir.as_ref());
        self
    }

    /// Adds an environment override for lifecycle commands.
    #[must_use]
    pub fn with_command_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.command_env.insert(key.into(), value.into());
        self
    }

    /// Root directory files are placed under and commands run in.
    #[must_use]
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Directory holding installation records.
    #[must_use]
    pub fn metadata_dir(&self) -> &Utf8Path {
        &self.metadata_dir
    }

    /// Environment overrides for lifecycle commands.
    #[must_use]
    pub fn command_env(&self) -> &BTreeMap<String, String> {
        &self.command_env
    }

    /// Record store for this context.
    #[must_use]
    pub fn metadata_store(&self) -> MetadataStore {
        MetadataStore::new(self.metadata_dir.clone())
    }
}

fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        root.join(path)
    }
}
