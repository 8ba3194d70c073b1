//! Shared test utilities for the installer crate.

use crate::command::{CommandExecutor, CommandSpec};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::process::ExitStatus;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.cast_unsigned())
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Every command is recorded. Commands succeed unless registered with
/// [`StubExecutor::failing`] or [`StubExecutor::unlaunchable`].
#[derive(Debug, Default)]
pub struct StubExecutor {
    exit_codes: HashMap<String, i32>,
    unlaunchable: Vec<String>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl StubExecutor {
    /// Creates a stub where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command_line` exit with `code`.
    #[must_use]
    pub fn failing(mut self, command_line: &str, code: i32) -> Self {
        self.exit_codes.insert(command_line.to_owned(), code);
        self
    }

    /// Makes `command_line` fail to launch.
    #[must_use]
    pub fn unlaunchable(mut self, command_line: &str) -> Self {
        self.unlaunchable.push(command_line.to_owned());
        self
    }

    /// Command lines executed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|spec| spec.command_line().to_owned())
            .collect()
    }

    /// Full command specifications executed so far, in order.
    #[must_use]
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for StubExecutor {
    fn execute(&self, spec: &CommandSpec) -> std::io::Result<ExitStatus> {
        self.calls.borrow_mut().push(spec.clone());
        if self
            .unlaunchable
            .iter()
            .any(|line| line == spec.command_line())
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("stub cannot launch `{}`", spec.command_line()),
            ));
        }
        let code = self
            .exit_codes
            .get(spec.command_line())
            .copied()
            .unwrap_or(0);
        Ok(exit_status(code))
    }
}

/// Writes a ZIP archive containing `entries` to `path`.
///
/// Each entry is a `(name, content)` pair. Names ending in `/` become
/// directory entries and their content is ignored.
///
/// # Errors
///
/// Returns any error raised while creating or writing the archive.
pub fn write_zip(path: &Utf8Path, entries: &[(&str, &str)]) -> zip::result::ZipResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options)?;
        } else {
            writer.start_file(*name, options)?;
            writer.write_all(content.as_bytes())?;
        }
    }

    writer.finish()?;
    Ok(())
}
