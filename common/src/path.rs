//! Canonical paths for tooth archives and placement rules.
//!
//! A [`ToothPath`] is a relative path held as a list of segments. Both `/`
//! and `\` are accepted as separators when parsing, so paths written on one
//! platform compare equal to the same path written on another. Archive entry
//! names and placement rule paths are parsed into this form before they are
//! compared or joined onto a filesystem root.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::str::FromStr;

/// Errors raised when text cannot be parsed as a [`ToothPath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path is rooted (leading separator or drive prefix).
    #[error("path {path:?} must be relative")]
    Absolute {
        /// The rejected path text.
        path: String,
    },

    /// The path climbs out of its root through a `..` segment.
    #[error("path {path:?} must not contain `..` segments")]
    ParentTraversal {
        /// The rejected path text.
        path: String,
    },

    /// The path contains a NUL byte.
    #[error("path {path:?} contains a NUL character")]
    InvalidCharacter {
        /// The rejected path text.
        path: String,
    },
}

/// A relative, separator-independent path.
///
/// Empty segments and `.` segments are discarded while parsing, so
/// `"./bin//tool"` and `"bin\\tool"` both parse to the same value as
/// `"bin/tool"`. Equality is exact and case-sensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ToothPath {
    segments: Vec<String>,
}

impl ToothPath {
    /// Builds a path from already-validated segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use lip_common::path::ToothPath;
    ///
    /// let path = ToothPath::new(["bin", "tool"]);
    /// assert_eq!(path.segments(), &["bin", "tool"]);
    /// ```
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the empty path, which denotes the root it is joined onto.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a relative path from its textual representation.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the text is rooted, contains a `..`
    /// segment, or contains a NUL character.
    ///
    /// # Examples
    ///
    /// ```
    /// use lip_common::path::ToothPath;
    ///
    /// let parsed = ToothPath::parse("./bin\\tool")?;
    /// assert_eq!(parsed.to_string(), "bin/tool");
    /// assert!(ToothPath::parse("../escape").is_err());
    /// # Ok::<(), lip_common::path::PathError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.contains('\0') {
            return Err(PathError::InvalidCharacter {
                path: text.to_owned(),
            });
        }
        if text.starts_with(['/', '\\']) || has_drive_prefix(text) {
            return Err(PathError::Absolute {
                path: text.to_owned(),
            });
        }

        let mut segments = Vec::new();
        for segment in text.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(PathError::ParentTraversal {
                        path: text.to_owned(),
                    });
                }
                other => segments.push(other.to_owned()),
            }
        }
        Ok(Self { segments })
    }

    /// Returns the path segments as a slice.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` when the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `self` followed by the segments of `other`.
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Returns the final segment when present.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the path without its final segment, or `None` when empty.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Resolves the path against a filesystem root using the host separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use lip_common::path::ToothPath;
    ///
    /// let path = ToothPath::parse("bin/tool")?;
    /// let local = path.to_local(Utf8Path::new("workspace"));
    /// assert!(local.ends_with("bin/tool"));
    /// # Ok::<(), lip_common::path::PathError>(())
    /// ```
    #[must_use]
    pub fn to_local(&self, root: &Utf8Path) -> Utf8PathBuf {
        let mut local = root.to_owned();
        for segment in &self.segments {
            local.push(segment);
        }
        local
    }
}

impl FromStr for ToothPath {
    type Err = PathError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text)
    }
}

impl fmt::Display for ToothPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Detects `C:`-style prefixes, which are rooted on Windows.
fn has_drive_prefix(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}
