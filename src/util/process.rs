//! Executable lookup and process termination helpers.

use std::path::{Path, PathBuf};

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake.
pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}

/// Find make, preferring `$MAKE` when it is set.
pub fn find_make() -> Option<PathBuf> {
    if let Ok(make) = std::env::var("MAKE") {
        if let Some(path) = find_executable(&make) {
            return Some(path);
        }
    }

    ["make", "gmake"].iter().find_map(|name| find_executable(name))
}

/// Resolve the program of an execution request to an absolute path.
///
/// Bare names are looked up on PATH. Anything with a path separator must
/// exist and be executable; relative paths are taken from the current
/// directory.
pub fn resolve_program(program: &Path) -> Result<PathBuf, String> {
    if program.components().count() == 1 && !program.is_absolute() {
        let name = program.to_string_lossy();
        return find_executable(&name).ok_or_else(|| format!("`{}` not found on PATH", name));
    }

    let path = std::path::absolute(program)
        .map_err(|e| format!("invalid path `{}`: {}", program.display(), e))?;

    let metadata = std::fs::metadata(&path)
        .map_err(|_| format!("`{}` does not exist", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("`{}` is not a file", path.display()));
    }
    if !is_executable(&metadata) {
        return Err(format!("`{}` is not executable", path.display()));
    }

    Ok(path)
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

/// Forcibly kill a process and every process in its group.
///
/// The process must have been started as a group leader. Falls back to
/// killing the single process when the group is already gone.
#[cfg(unix)]
pub fn kill_process_group(pid: u32) {
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => tracing::debug!(%pid, "sent SIGKILL to process group"),
        Err(e) => {
            tracing::debug!(%pid, error = %e, "failed to signal process group, trying process only");
            if let Err(e) = kill(pid, Signal::SIGKILL) {
                tracing::debug!(%pid, error = %e, "failed to signal process");
            }
        }
    }
}

#[cfg(not(unix))]
pub fn kill_process_group(pid: u32) {
    tracing::warn!(pid, "forced termination is not supported on this platform");
}

/// Kill whatever is left in the group of an already reaped leader.
///
/// The group id stays valid while any member is alive, so unlike
/// [`kill_process_group`] this never falls back to signalling the bare pid.
#[cfg(unix)]
pub fn kill_stray_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(pid as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) => tracing::debug!(%pgid, "killed leftover processes in group"),
        Err(Errno::ESRCH) => {}
        Err(e) => tracing::debug!(%pgid, error = %e, "failed to signal process group"),
    }
}

#[cfg(not(unix))]
pub fn kill_stray_group(_pid: u32) {}
