//! Project fixtures for ops tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::write_script;

/// A native project with a source tree, an output directory and fake
/// build tools that log their arguments.
pub struct NativeProject {
    pub tmp: TempDir,
    pub source: PathBuf,
    pub output: PathBuf,
    pub tools: PathBuf,
}

impl NativeProject {
    /// Create `source/CMakeLists.txt` and empty `output`/`tools` dirs.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        let output = tmp.path().join("target").join("native");
        let tools = tmp.path().join("tools");

        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::write(
            source.join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.10)\n",
        )
        .unwrap();

        NativeProject {
            tmp,
            source,
            output,
            tools,
        }
    }

    /// A fake tool that prints each argument on its own line, then `body`.
    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        write_script(
            &self.tools,
            name,
            &format!("for a in \"$@\"; do echo \"arg:$a\"; done\necho \"cwd:$(pwd -P)\"\n{}", body),
        )
    }

    /// Where a fake tool may write a log.
    pub fn log_path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }
}

impl Default for NativeProject {
    fn default() -> Self {
        Self::new()
    }
}
