//! Test utilities for Shipyard unit tests.
//!
//! Supervised executions are tested against real processes, so these
//! helpers write small POSIX shell scripts into temporary directories.
//!
//! # Example
//!
//! ```rust,ignore
//! use shipyard::test_support::write_script;
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let script = write_script(tmp.path(), "fail.sh", "exit 3");
//!     // Run `script` through a Session...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

pub use fixtures::*;

/// Write an executable `/bin/sh` script and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

/// A script printing `line 1` through `line <count>` to stdout.
pub fn numbered_lines_script(dir: &Path, count: usize) -> PathBuf {
    write_script(
        dir,
        "numbers.sh",
        &format!(
            "i=1\nwhile [ $i -le {} ]; do\n  echo \"line $i\"\n  i=$((i+1))\ndone",
            count
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_script_is_runnable() {
        let tmp = TempDir::new().unwrap();
        let script = write_script(tmp.path(), "hello.sh", "echo hello");

        let output = std::process::Command::new(&script).output().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
