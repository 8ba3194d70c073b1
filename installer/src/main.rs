//! lip installer CLI entrypoint.
//!
//! This binary installs a tooth archive into a workspace, or reports whether
//! a tooth is already installed there.

use camino::Utf8PathBuf;
use clap::Parser;
use lip_common::ToothRepoPath;
use lip_installer::archive::ToothArchive;
use lip_installer::cli::{Cli, Command, InstallArgs, InstalledArgs, LocationArgs};
use lip_installer::command::SystemCommandExecutor;
use lip_installer::config::{InstallContext, InstallerConfig};
use lip_installer::dirs::SystemBaseDirs;
use lip_installer::error::InstallerError;
use lip_installer::transaction::{InstallFailure, InstallRequest, Installer};
use log::{LevelFilter, warn};
use std::io::Write;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Installer(#[from] InstallerError),
    #[error(transparent)]
    Install(#[from] InstallFailure),
}

type RunResult = std::result::Result<(), RunError>;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// `RUST_LOG`, when set, takes precedence over the command-line level.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> RunResult {
    let config = load_config()?;
    match &cli.command {
        Command::Install(args) => run_install(args, &config, cli.quiet, stderr),
        Command::Installed(args) => run_installed(args, &config, stdout),
    }
}

fn load_config() -> Result<InstallerConfig, InstallerError> {
    match SystemBaseDirs::new() {
        Some(dirs) => InstallerConfig::load(&dirs),
        None => {
            warn!("Could not determine the config directory; using default configuration");
            Ok(InstallerConfig::default())
        }
    }
}

fn run_install(
    args: &InstallArgs,
    config: &InstallerConfig,
    quiet: bool,
    stderr: &mut dyn Write,
) -> RunResult {
    let context = resolve_context(&args.location, config)?;
    let tooth = ToothArchive::open(&args.tooth_archive)?;
    let mut request = InstallRequest::new(&tooth);
    if let Some(asset) = &args.asset {
        request = request.with_asset_archive(asset);
    }

    let executor = SystemCommandExecutor;
    let report = Installer::new(context, &executor).install(&request)?;

    if !quiet {
        write_stderr_line(
            stderr,
            format_args!(
                "Installed {} ({} file(s) placed)",
                tooth.metadata().tooth,
                report.placement.files_written()
            ),
        );
        for rule in report.placement.unmatched() {
            write_stderr_line(
                stderr,
                format_args!("Warning: nothing in the archive matched {}", rule.source),
            );
        }
    }
    Ok(())
}

fn run_installed(
    args: &InstalledArgs,
    config: &InstallerConfig,
    stdout: &mut dyn Write,
) -> RunResult {
    let context = resolve_context(&args.location, config)?;
    let tooth = ToothRepoPath::from(args.tooth.as_str());
    let installed = context.metadata_store().is_installed(&tooth)?;
    let status = if installed { "installed" } else { "not installed" };
    if writeln!(stdout, "{tooth} is {status}").is_err() {
        // Best-effort output; ignore write failures.
    }
    Ok(())
}

fn resolve_context(
    location: &LocationArgs,
    config: &InstallerConfig,
) -> Result<InstallContext, InstallerError> {
    let workspace = match &location.workspace {
        Some(dir) => dir.clone(),
        None => current_dir()?,
    };
    let context = InstallContext::from_config(workspace, config);
    Ok(match &location.metadata_dir {
        Some(dir) => context.with_metadata_dir(dir),
        None => context,
    })
}

fn current_dir() -> Result<Utf8PathBuf, InstallerError> {
    let dir = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(dir).map_err(|_| InstallerError::DirectoryNotFound {
        what: "a UTF-8 current directory",
    })
}

fn exit_code_for_run_result(result: RunResult, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lip_installer::test_utils::write_zip;
    use lip_installer::transaction::{InstallState, InstallStep};

    struct Workspace {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("temp dir");
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
            Self { _dir: dir, root }
        }

        fn location(&self) -> LocationArgs {
            LocationArgs {
                workspace: Some(self.root.join("workspace")),
                metadata_dir: None,
            }
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = InstallFailure {
            step: InstallStep::CheckInstalled,
            reached: InstallState::NotStarted,
            source: InstallerError::AlreadyInstalled {
                tooth: ToothRepoPath::from("a.b/c"),
            },
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err.into()), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("failed to check for an existing installation"));
        assert!(stderr_text.contains("tooth a.b/c is already installed"));
    }

    #[test]
    fn resolve_context_applies_metadata_dir_override() {
        let location = LocationArgs {
            workspace: Some(Utf8PathBuf::from("/work")),
            metadata_dir: Some(Utf8PathBuf::from("records")),
        };

        let context =
            resolve_context(&location, &InstallerConfig::default()).expect("context resolves");
        assert_eq!(context.workspace_root(), camino::Utf8Path::new("/work"));
        assert_eq!(context.metadata_dir(), camino::Utf8Path::new("/work/records"));
    }

    #[test]
    fn install_then_installed_reports_record() {
        let ws = Workspace::new();
        std::fs::create_dir(ws.root.join("workspace")).expect("workspace dir");
        let tooth_archive = ws.root.join("tooth.zip");
        write_zip(
            &tooth_archive,
            &[
                (
                    "tooth.json",
                    r#"{ "tooth": "a.b/c", "files": { "place": [{ "src": "bin/tool", "dest": "tool" }] } }"#,
                ),
                ("bin/tool", "X"),
            ],
        )
        .expect("write zip");
        let config = InstallerConfig::default();

        let args = InstallArgs {
            tooth_archive,
            asset: None,
            location: ws.location(),
        };
        let mut stderr = Vec::new();
        run_install(&args, &config, false, &mut stderr).expect("install succeeds");
        let stderr_text = String::from_utf8(stderr).expect("stderr UTF-8");
        assert!(stderr_text.contains("Installed a.b/c (1 file(s) placed)"));

        let args = InstalledArgs {
            tooth: "a.b/c".to_owned(),
            location: ws.location(),
        };
        let mut stdout = Vec::new();
        run_installed(&args, &config, &mut stdout).expect("query succeeds");
        assert_eq!(
            String::from_utf8(stdout).expect("stdout UTF-8"),
            "a.b/c is installed\n"
        );
    }

    #[test]
    fn installed_reports_missing_tooth() {
        let ws = Workspace::new();
        let args = InstalledArgs {
            tooth: "a.b/c".to_owned(),
            location: ws.location(),
        };

        let mut stdout = Vec::new();
        run_installed(&args, &InstallerConfig::default(), &mut stdout).expect("query succeeds");
        assert_eq!(
            String::from_utf8(stdout).expect("stdout UTF-8"),
            "a.b/c is not installed\n"
        );
    }
}
