//! Semantic wrapper for tooth repository paths.
//!
//! A tooth is identified by its repository path, for example
//! `github.com/lippkg/example`. The same string keys the installation record,
//! so this module also owns the escaping used to turn it into a file name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The globally unique identity of a tooth.
///
/// Validation is the descriptor parser's job; this type only keeps the
/// identity from being confused with other strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToothRepoPath(String);

impl ToothRepoPath {
    /// Create a new repository path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the repository path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the query-escaped form used for installation record names.
    ///
    /// ASCII alphanumerics and `-_.~` are kept, spaces become `+`, and every
    /// other byte is percent-encoded. Existing registries name records this
    /// way, so `~` stays literal and `*` becomes `%2A`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lip_common::ToothRepoPath;
    ///
    /// let tooth = ToothRepoPath::from("example.org/pkg");
    /// assert_eq!(tooth.escaped(), "example.org%2Fpkg");
    /// ```
    #[must_use]
    pub fn escaped(&self) -> String {
        let mut escaped = String::with_capacity(self.0.len());
        for chunk in url::form_urlencoded::byte_serialize(self.0.as_bytes()) {
            // Percent-encoded bytes arrive one per chunk; unchanged bytes in runs.
            match chunk {
                "%7E" => escaped.push('~'),
                run => escaped.push_str(&run.replace('*', "%2A")),
            }
        }
        escaped
    }
}

impl AsRef<str> for ToothRepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ToothRepoPath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ToothRepoPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ToothRepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::slash("a.b/c", "a.b%2Fc")]
    #[case::github("github.com/lippkg/example", "github.com%2Flippkg%2Fexample")]
    #[case::space("my tooth", "my+tooth")]
    #[case::colon("host:8080/x", "host%3A8080%2Fx")]
    #[case::tilde("user~x/pkg", "user~x%2Fpkg")]
    #[case::asterisk("a*b/c", "a%2Ab%2Fc")]
    #[case::tilde_and_asterisk("user~x/a*b", "user~x%2Fa%2Ab")]
    #[case::literal_percent("a%7Eb", "a%257Eb")]
    fn escapes_for_record_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ToothRepoPath::from(raw).escaped(), expected);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&ToothRepoPath::from("a.b/c")).expect("serialize");
        assert_eq!(json, "\"a.b/c\"");
    }
}
