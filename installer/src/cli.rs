//! CLI argument definitions for the lip installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint so the argument surface can be tested without
//! running an installation.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Install lip teeth into a workspace.
#[derive(Parser, Debug)]
#[command(name = "lip-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install lip teeth into a workspace.\n\n",
    "A tooth archive is a ZIP file carrying a tooth.json descriptor. Installing ",
    "it runs the descriptor's pre-install commands, copies the files named by its ",
    "placement rules into the workspace, runs its post-install commands, and ",
    "records the installation so the tooth is not installed twice.\n\n",
    "Teeth whose descriptor names an asset_url take their files from a separately ",
    "downloaded asset archive, passed with --asset.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install a tooth into the current directory:\n",
    "    $ lip-installer install example.zip\n\n",
    "  Install a tooth whose files ship in a separate asset archive:\n",
    "    $ lip-installer install example.zip --asset example-asset.zip\n\n",
    "  Check whether a tooth is installed:\n",
    "    $ lip-installer installed github.com/lippkg/example",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `--verbose` and `--quiet`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use lip_installer::cli::Cli;
    /// use log::LevelFilter;
    ///
    /// let cli = Cli::parse_from(["lip-installer", "-vv", "installed", "a.b/c"]);
    /// assert_eq!(cli.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install a tooth archive.
    Install(InstallArgs),

    /// Report whether a tooth is installed.
    Installed(InstalledArgs),
}

/// Workspace location shared by every subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Workspace root [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub workspace: Option<Utf8PathBuf>,

    /// Directory holding installation records [default: <WORKSPACE>/.lip/metadata].
    #[arg(long, value_name = "DIR")]
    pub metadata_dir: Option<Utf8PathBuf>,
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Tooth archive to install.
    #[arg(value_name = "TOOTH_ARCHIVE")]
    pub tooth_archive: Utf8PathBuf,

    /// Asset archive holding the files, for teeth that declare an asset URL.
    #[arg(short, long, value_name = "ZIP")]
    pub asset: Option<Utf8PathBuf>,

    /// Workspace and metadata locations.
    #[command(flatten)]
    pub location: LocationArgs,
}

/// Arguments for the installed command.
#[derive(Parser, Debug, Clone)]
pub struct InstalledArgs {
    /// Tooth repository path, e.g. `github.com/lippkg/example`.
    #[arg(value_name = "TOOTH")]
    pub tooth: String,

    /// Workspace and metadata locations.
    #[command(flatten)]
    pub location: LocationArgs,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
