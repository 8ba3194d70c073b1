//! The tooth descriptor consumed by the installer.
//!
//! [`ToothMetadata`] mirrors the `tooth.json` document shipped inside every
//! tooth archive. The installer reads the identity, lifecycle commands,
//! asset URL and placement rules from it, and persists the whole document as
//! the installation record. Fields the installer does not interpret
//! (`version`, `info`) are carried through unchanged.

use crate::repo_path::ToothRepoPath;
use serde::{Deserialize, Serialize};

const FORMAT_VERSION: u32 = 2;

/// Errors arising while reading or writing a tooth descriptor.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The JSON document could not be parsed.
    #[error("failed to parse tooth metadata: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The descriptor could not be serialized.
    #[error("failed to serialize tooth metadata: {source}")]
    Serialize {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The descriptor has no tooth repository path.
    #[error("tooth metadata is missing the `tooth` field")]
    MissingTooth,
}

/// A validated tooth descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothMetadata {
    /// Descriptor schema version.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    /// Repository path identifying the tooth.
    pub tooth: ToothRepoPath,
    /// Tooth version string.
    #[serde(default)]
    pub version: String,
    /// Descriptive information shown to users.
    #[serde(default, skip_serializing_if = "ToothInfo::is_empty")]
    pub info: ToothInfo,
    /// Remote asset archive location; empty when the tooth archive is the asset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub asset_url: String,
    /// Lifecycle commands run around installation.
    #[serde(default)]
    pub commands: Commands,
    /// File placement rules.
    #[serde(default)]
    pub files: Files,
}

/// Descriptive information about a tooth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToothInfo {
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Author name.
    pub author: String,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl ToothInfo {
    fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.author.is_empty()
            && self.tags.is_empty()
    }
}

/// Ordered shell command lines run before and after file placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    /// Commands run before any file is placed.
    pub pre_install: Vec<String>,
    /// Commands run after every file is placed.
    pub post_install: Vec<String>,
}

/// File handling rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Files {
    /// Placement rules, applied in order.
    pub place: Vec<PlaceRule>,
}

/// Copies one archive file to a workspace destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRule {
    /// Source path relative to the archive content root.
    pub src: String,
    /// Destination path relative to the workspace root.
    pub dest: String,
}

impl PlaceRule {
    /// Create a placement rule.
    #[must_use]
    pub fn new(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }
}

impl ToothMetadata {
    /// Create a descriptor with no commands, no asset URL and no rules.
    ///
    /// # Examples
    ///
    /// ```
    /// use lip_common::{PlaceRule, ToothMetadata};
    ///
    /// let mut metadata = ToothMetadata::new("a.b/c");
    /// metadata.files.place.push(PlaceRule::new("bin/tool", "tool"));
    /// assert_eq!(metadata.tooth.as_str(), "a.b/c");
    /// assert!(metadata.asset_url().is_none());
    /// ```
    #[must_use]
    pub fn new(tooth: impl Into<ToothRepoPath>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            tooth: tooth.into(),
            version: String::new(),
            info: ToothInfo::default(),
            asset_url: String::new(),
            commands: Commands::default(),
            files: Files::default(),
        }
    }

    /// Parses a `tooth.json` document.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`] for malformed JSON and
    /// [`MetadataError::MissingTooth`] when the identity is blank.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let metadata: Self =
            serde_json::from_str(json).map_err(|source| MetadataError::Parse { source })?;
        if metadata.tooth.as_str().trim().is_empty() {
            return Err(MetadataError::MissingTooth);
        }
        Ok(metadata)
    }

    /// Serializes the descriptor as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Serialize`] if serialization fails.
    pub fn to_json(&self) -> Result<String, MetadataError> {
        serde_json::to_string_pretty(self).map_err(|source| MetadataError::Serialize { source })
    }

    /// Returns the asset URL, treating a blank value as absent.
    #[must_use]
    pub fn asset_url(&self) -> Option<&str> {
        let url = self.asset_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

const fn default_format_version() -> u32 {
    FORMAT_VERSION
}
