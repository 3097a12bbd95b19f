//! The process launcher.

use crate::command::{ExitCode, Stdin, Stdout};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::parser::Stage;
use log::debug;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};

/// A stage whose program could not be started.
#[derive(Debug)]
pub enum LaunchError {
    /// No executable under that name.
    NotFound(String),
    /// The executable exists but the OS refused to run it.
    Spawn { program: String, source: io::Error },
}

impl LaunchError {
    /// The status recorded for the stage in place of a real exit code.
    pub fn status(&self, config: &ShellConfig) -> ExitCode {
        match self {
            LaunchError::NotFound(_) => config.not_found_status,
            LaunchError::Spawn { .. } => config.exec_failure_status,
        }
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::NotFound(name) => write!(f, "Command not found: {name}"),
            LaunchError::Spawn { program, source } => {
                write!(f, "An error occurred: {program}: {source}")
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::NotFound(_) => None,
            LaunchError::Spawn { source, .. } => Some(source),
        }
    }
}

/// Start the program of `stage` with the given standard streams.
///
/// The child sees `argv[0]` exactly as typed, gets the variables and working
/// directory of `env`, and keeps the interpreter's standard error. Both stream
/// handles are consumed: once this returns, the interpreter no longer holds them,
/// which is what lets a downstream reader see end of stream when the child exits.
pub fn spawn(
    stage: &Stage,
    stdin: Box<dyn Stdin>,
    stdout: Box<dyn Stdout>,
    env: &Environment,
) -> Result<Child, LaunchError> {
    let program = stage.program();
    let search_paths = env.search_path();
    let executable = find_command_path(&search_paths, Path::new(program))
        .ok_or_else(|| LaunchError::NotFound(program.to_string()))?;

    let child = Command::new(&*executable)
        .arg0(program)
        .args(stage.args())
        .stdin(stdin.stdio())
        .stdout(stdout.stdio())
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .spawn()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LaunchError::NotFound(program.to_string()),
            _ => LaunchError::Spawn {
                program: program.to_string(),
                source,
            },
        })?;
    debug!("spawned pid {} for {:?}", child.id(), stage.argv);
    Ok(child)
}

/// Translate an exit status into a shell status code.
///
/// A child killed by a signal reports `128 + signal`.
pub fn status_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names a file.
/// - Relative with multiple components (e.g., `bin/sh`) or `./`-prefixed: returns it
///   if it names a file, relative to the current directory.
/// - Single path component (no separators): search each directory in `search_paths`
///   (PATH) and return the first match that is executable. A file without any
///   execute bit does not stop the search.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, None) => None,
        // Single component -> search in PATH
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if find_by_path(&path).is_none() {
            continue;
        }
        if is_executable(&path) {
            return Some(path);
        }
        debug!("skipping {}: not executable", path.display());
    }
    None
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}
