//! Shared types for the lip tooth installer: the tooth descriptor, the
//! tooth identity, and the separator-independent path value used to match
//! archive entries against placement rules.

pub mod metadata;
pub mod path;
pub mod repo_path;

pub use metadata::{Commands, Files, MetadataError, PlaceRule, ToothInfo, ToothMetadata};
pub use path::{PathError, ToothPath};
pub use repo_path::ToothRepoPath;
