//! Lifecycle command execution.
//!
//! Tooth descriptors declare `pre_install` and `post_install` command lines.
//! Each line is wrapped in a [`CommandSpec`] and handed to a
//! [`CommandExecutor`], which runs it through the host shell and reports the
//! exit status. Commands run one at a time; the first failure stops the
//! sequence.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::process::{Command, ExitStatus};

/// Lifecycle phase a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    /// Runs before any file is placed.
    PreInstall,
    /// Runs after every file is placed.
    PostInstall,
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreInstall => "pre-install",
            Self::PostInstall => "post-install",
        })
    }
}

/// A single shell command line with its execution environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    command_line: String,
    working_dir: Utf8PathBuf,
    env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Create a command that runs `command_line` inside `working_dir`.
    #[must_use]
    pub fn new(command_line: impl Into<String>, working_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            command_line: command_line.into(),
            working_dir: working_dir.into(),
            env: BTreeMap::new(),
        }
    }

    /// Adds environment overrides on top of the inherited environment.
    #[must_use]
    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(key, value)| (key.clone(), value.clone())));
        self
    }

    /// The command line as declared by the descriptor.
    #[must_use]
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Directory the command runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Environment overrides applied to the command.
    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Builds the host shell invocation for this command.
    ///
    /// Unix hosts use `sh -c`; Windows hosts use `cmd /C`. Standard streams
    /// are inherited from the installer process.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut command = shell_command(&self.command_line);
        command
            .current_dir(self.working_dir.as_std_path())
            .envs(&self.env);
        command
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(command_line);
    command
}

/// Abstraction for running lifecycle commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs the command to completion and returns its exit status.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or waiting for the
    /// command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lip_installer::command::{CommandExecutor, CommandSpec, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let status = executor.execute(&CommandSpec::new("echo hello", "."))?;
    /// assert!(status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn execute(&self, spec: &CommandSpec) -> std::io::Result<ExitStatus>;
}

/// Executes commands through the host shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, spec: &CommandSpec) -> std::io::Result<ExitStatus> {
        spec.to_command().status()
    }
}

/// Where and how lifecycle commands run.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Working directory for every command.
    pub working_dir: &'a Utf8Path,
    /// Environment overrides applied to every command.
    pub env: &'a BTreeMap<String, String>,
}

/// Runs `commands` in order, stopping at the first failure.
///
/// An empty slice succeeds without touching the executor.
///
/// # Errors
///
/// Returns [`InstallerError::CommandLaunch`] when a command cannot be
/// started and [`InstallerError::CommandFailed`] when one exits
/// unsuccessfully. Commands after the failing one are not run.
pub fn run_commands(
    executor: &dyn CommandExecutor,
    phase: CommandPhase,
    commands: &[String],
    context: CommandContext<'_>,
) -> Result<()> {
    for command in commands {
        let spec = CommandSpec::new(command.as_str(), context.working_dir).with_env(context.env);
        debug!("Running {phase} command `{command}` in {}", context.working_dir);

        let status = executor
            .execute(&spec)
            .map_err(|source| InstallerError::CommandLaunch {
                phase,
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(InstallerError::CommandFailed {
                phase,
                command: command.clone(),
                status,
            });
        }
    }
    Ok(())
}
