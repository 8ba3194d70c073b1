//! Copies archive entries into the workspace according to placement rules.
//!
//! Rules are applied in declaration order. Each rule names a source path
//! relative to the archive content root and a destination relative to the
//! workspace root. A destination is never overwritten: if anything already
//! exists there, placement stops before touching the filesystem for that
//! rule. Files placed by earlier rules stay where they are.

use crate::archive::AssetArchive;
use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use lip_common::{PlaceRule, ToothPath};
use log::{debug, warn};
use std::fs::File;
use std::io::ErrorKind;

/// Outcome of applying one placement rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePlacement {
    /// Expected source path inside the archive.
    pub source: ToothPath,
    /// Destination file in the workspace.
    pub destination: Utf8PathBuf,
    /// Number of archive entries copied to the destination.
    pub matches: usize,
}

/// Per-rule outcome of a placement run, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    rules: Vec<RulePlacement>,
}

impl PlacementReport {
    /// Outcomes for every rule that was applied.
    #[must_use]
    pub fn rules(&self) -> &[RulePlacement] {
        &self.rules
    }

    /// Rules that matched no archive entry.
    pub fn unmatched(&self) -> impl Iterator<Item = &RulePlacement> {
        self.rules.iter().filter(|rule| rule.matches == 0)
    }

    /// Total number of files written.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.rules.iter().map(|rule| rule.matches).sum()
    }
}

/// Applies `rules` to `archive`, writing files beneath `workspace_root`.
///
/// Sources resolve against `content_root` and must equal an entry's
/// normalized path exactly. A rule with no matching entry is reported but is
/// not an error. A rule matching several entries copies each in archive
/// order, so the last one wins.
///
/// # Errors
///
/// Returns [`InstallerError::DestinationExists`] when a destination is
/// occupied, [`InstallerError::InvalidPath`] for malformed rule paths, and
/// I/O or archive errors raised while creating directories or copying. Any
/// error aborts the remaining rules.
pub fn place_files(
    rules: &[PlaceRule],
    archive: &mut AssetArchive,
    content_root: &ToothPath,
    workspace_root: &Utf8Path,
) -> Result<PlacementReport> {
    let mut report = PlacementReport::default();
    for rule in rules {
        let placement = place_rule(rule, archive, content_root, workspace_root)?;
        match placement.matches {
            0 => warn!(
                "No entry in {} matches {}; {} was not created",
                archive.path(),
                placement.source,
                placement.destination
            ),
            1 => {}
            count => warn!(
                "{count} entries in {} match {}; the last one was kept at {}",
                archive.path(),
                placement.source,
                placement.destination
            ),
        }
        report.rules.push(placement);
    }
    Ok(report)
}

fn place_rule(
    rule: &PlaceRule,
    archive: &mut AssetArchive,
    content_root: &ToothPath,
    workspace_root: &Utf8Path,
) -> Result<RulePlacement> {
    let destination = ToothPath::parse(&rule.dest)?.to_local(workspace_root);
    ensure_vacant(&destination)?;

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|source| InstallerError::CreateDirectory {
            path: parent.to_owned(),
            source,
        })?;
    }

    let source = content_root.join(&ToothPath::parse(&rule.src)?);
    let mut matching = Vec::new();
    for entry in archive.entries().iter().filter(|entry| !entry.is_dir()) {
        if entry.path()? == source {
            matching.push(entry.clone());
        }
    }

    for entry in &matching {
        let mut file = File::create(&destination).map_err(|source| InstallerError::CopyFailed {
            entry: entry.name().to_owned(),
            path: destination.clone(),
            source,
        })?;
        let bytes = archive.copy_entry(entry, &mut file, &destination)?;
        debug!("Placed {} at {destination} ({bytes} bytes)", entry.name());
    }

    Ok(RulePlacement {
        source,
        destination,
        matches: matching.len(),
    })
}

/// Fails unless nothing, not even a dangling symlink, exists at `path`.
fn ensure_vacant(path: &Utf8Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Err(InstallerError::DestinationExists {
            path: path.to_owned(),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(InstallerError::DestinationCheck {
            path: path.to_owned(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_zip;
    use rstest::rstest;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        workspace: Utf8PathBuf,
        archive: AssetArchive,
    }

    fn fixture(entries: &[(&str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        let archive_path = root.join("asset.zip");
        write_zip(&archive_path, entries).expect("write zip");
        let workspace = root.join("workspace");
        std::fs::create_dir(&workspace).expect("workspace dir");
        let archive = AssetArchive::open(&archive_path).expect("open archive");
        Fixture {
            _dir: dir,
            workspace,
            archive,
        }
    }

    #[test]
    fn copies_exact_match_only() {
        let mut fx = fixture(&[("a/b.txt", "short"), ("a/bb.txt", "long")]);
        let rules = [PlaceRule::new("a/b.txt", "out.txt")];

        let report = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect("placement succeeds");

        let content = std::fs::read_to_string(fx.workspace.join("out.txt")).expect("placed");
        assert_eq!(content, "short");
        assert_eq!(report.rules()[0].matches, 1);
    }

    #[test]
    fn copies_exact_match_under_content_root() {
        let mut fx = fixture(&[
            ("a/b.txt", "short"),
            ("a/bb.txt", "long"),
            ("b.txt", "outside"),
        ]);
        let rules = [PlaceRule::new("b.txt", "out.txt")];

        let report = place_files(&rules, &mut fx.archive, &ToothPath::new(["a"]), &fx.workspace)
            .expect("placement succeeds");

        let content = std::fs::read_to_string(fx.workspace.join("out.txt")).expect("placed");
        assert_eq!(content, "short");
        assert_eq!(report.rules()[0].matches, 1);
        assert_eq!(report.rules()[0].source, ToothPath::new(["a", "b.txt"]));
    }

    #[test]
    fn resolves_sources_under_content_root() {
        let mut fx = fixture(&[
            ("pkg@v1/", ""),
            ("pkg@v1/bin/", ""),
            ("pkg@v1/bin/tool", "X"),
            ("bin/tool", "outside"),
        ]);
        let rules = [PlaceRule::new("bin/tool", "tools/tool")];

        place_files(
            &rules,
            &mut fx.archive,
            &ToothPath::new(["pkg@v1"]),
            &fx.workspace,
        )
        .expect("placement succeeds");

        let content =
            std::fs::read_to_string(fx.workspace.join("tools").join("tool")).expect("placed");
        assert_eq!(content, "X");
    }

    #[test]
    fn unmatched_rule_is_reported_without_error() {
        let mut fx = fixture(&[("bin/tool", "X")]);
        let rules = [PlaceRule::new("bin/missing", "missing")];

        let report = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect("placement succeeds");

        assert!(!fx.workspace.join("missing").exists());
        assert_eq!(report.unmatched().count(), 1);
        assert_eq!(report.files_written(), 0);
    }

    #[test]
    fn multiple_matches_keep_the_last_entry() {
        let mut fx = fixture(&[("./bin/tool", "first"), ("bin/tool", "second")]);
        let rules = [PlaceRule::new("bin/tool", "tool")];

        let report = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect("placement succeeds");

        let content = std::fs::read_to_string(fx.workspace.join("tool")).expect("placed");
        assert_eq!(content, "second");
        assert_eq!(report.rules()[0].matches, 2);
    }

    #[test]
    fn existing_destination_aborts_later_rules() {
        let mut fx = fixture(&[("one", "1"), ("two", "2"), ("three", "3")]);
        std::fs::write(fx.workspace.join("taken"), "keep").expect("seed");
        let rules = [
            PlaceRule::new("one", "first"),
            PlaceRule::new("two", "taken"),
            PlaceRule::new("three", "third"),
        ];

        let err = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect_err("destination occupied");

        assert!(matches!(err, InstallerError::DestinationExists { .. }));
        assert!(fx.workspace.join("first").exists());
        assert!(!fx.workspace.join("third").exists());
        let kept = std::fs::read_to_string(fx.workspace.join("taken")).expect("seeded");
        assert_eq!(kept, "keep");
    }

    #[test]
    fn existing_destination_creates_no_directories() {
        let mut fx = fixture(&[("one", "1")]);
        std::fs::create_dir(fx.workspace.join("bin")).expect("seed dir");
        let rules = [PlaceRule::new("one", "bin")];

        let err = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect_err("destination occupied");

        assert!(matches!(err, InstallerError::DestinationExists { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_counts_as_existing() {
        let mut fx = fixture(&[("one", "1")]);
        std::os::unix::fs::symlink(fx.workspace.join("nowhere"), fx.workspace.join("link"))
            .expect("symlink");
        let rules = [PlaceRule::new("one", "link")];

        let err = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect_err("destination occupied");

        assert!(matches!(err, InstallerError::DestinationExists { .. }));
        assert!(!fx.workspace.join("nowhere").exists());
    }

    #[rstest]
    #[case::escaping_destination("one", "../outside")]
    #[case::absolute_destination("one", "/etc/passwd")]
    #[case::escaping_source("../one", "one")]
    fn malformed_rule_paths_are_rejected(#[case] src: &str, #[case] dest: &str) {
        let mut fx = fixture(&[("one", "1")]);
        let rules = [PlaceRule::new(src, dest)];

        let err = place_files(&rules, &mut fx.archive, &ToothPath::empty(), &fx.workspace)
            .expect_err("invalid path");

        assert!(matches!(err, InstallerError::InvalidPath(_)));
    }
}
