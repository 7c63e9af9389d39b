//! Pre-flight checks before connecting to servers.
//!
//! Validates settings and looks up every server command before any process
//! is spawned, so a missing executable is reported by name.

use crate::config::{ServerSettings, Settings};
use crate::error::{Result, TaskloopError};
use std::path::{Path, PathBuf};

/// Run pre-flight checks for the configured servers.
///
/// Returns warnings for problems that may still work out at runtime, or an
/// error describing what's missing.
pub fn check(settings: &Settings) -> Result<Vec<String>> {
    settings.validate()?;

    let mut warnings = Vec::new();
    for (name, server) in &settings.servers {
        check_command(name, server)?;
        warnings.extend(check_script_args(name, server));
    }
    Ok(warnings)
}

/// Check that a server's executable can be found.
fn check_command(name: &str, server: &ServerSettings) -> Result<()> {
    if find_executable(&server.command, server.cwd_path().as_deref()).is_some() {
        return Ok(());
    }
    Err(TaskloopError::Connection(format!(
        "Server '{}': command '{}' not found. Install it or fix servers.{}.command",
        name, server.command, name
    )))
}

/// Script arguments (e.g. the server's `dist/index.js`) that do not exist.
fn check_script_args(name: &str, server: &ServerSettings) -> Vec<String> {
    let base = server
        .cwd_path()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();

    server
        .args
        .iter()
        .filter(|arg| is_script_path(arg))
        .filter(|arg| !base.join(Settings::expand_path(arg)).exists())
        .map(|arg| format!("Server '{}': script '{}' does not exist relative to {}", name, arg, base.display()))
        .collect()
}

fn is_script_path(arg: &str) -> bool {
    !arg.starts_with('-')
        && [".js", ".mjs", ".cjs", ".py", ".ts"]
            .iter()
            .any(|ext| arg.ends_with(ext))
}

/// Resolve a command the way the OS would: paths directly, bare names through `PATH`.
fn find_executable(command: &str, cwd: Option<&Path>) -> Option<PathBuf> {
    let expanded = Settings::expand_path(command);

    if expanded.components().count() > 1 || expanded.is_absolute() {
        let candidate = match cwd {
            Some(dir) if expanded.is_relative() => dir.join(&expanded),
            _ => expanded,
        };
        return candidate.is_file().then_some(candidate);
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| {
            let plain = dir.join(command);
            let exe = dir.join(format!("{}.exe", command));
            [plain, exe]
        })
        .find(|candidate| candidate.is_file())
}
