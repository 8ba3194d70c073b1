//! lip installer library.
//!
//! This crate installs teeth: it runs a tooth's lifecycle commands, copies
//! its files from a ZIP archive into a workspace, and records the
//! installation. It is used by the `lip-installer` CLI binary and can be
//! consumed programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`archive`] - ZIP access for tooth and asset archives
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - Lifecycle command execution
//! - [`config`] - Configuration file and resolved install settings
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Error types for every failure cause
//! - [`placement`] - Rule-driven copying of archive entries into the workspace
//! - [`record`] - Installation records
//! - [`transaction`] - The installation transaction and its state machine

pub mod archive;
pub mod cli;
pub mod command;
pub mod config;
pub mod dirs;
pub mod error;
pub mod placement;
pub mod record;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod transaction;
