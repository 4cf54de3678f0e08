//! Configuration file support for Shipyard.
//!
//! Shipyard supports two configuration file locations:
//! - Global: `~/.shipyard/config.toml` - User-wide defaults
//! - Project: `.shipyard/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Shipyard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `shipyard generate` settings
    pub generate: GenerateConfig,

    /// `shipyard compile` settings
    pub compile: CompileConfig,

    /// `shipyard test` settings
    pub test: TestConfig,
}

/// Settings for running CMake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Directory holding the top-level CMakeLists.txt
    pub source: Option<PathBuf>,

    /// Build tree directory
    pub output: Option<PathBuf>,

    /// CMake generator (default "Unix Makefiles")
    pub generator: Option<String>,

    /// Path to the cmake executable
    pub cmake: Option<PathBuf>,

    /// Environment variables passed to CMake
    pub env: BTreeMap<String, String>,

    /// CMake cache variables (`-D`); an empty value defines the bare name
    pub vars: BTreeMap<String, String>,
}

/// Settings for running make in the build tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Build tree directory
    pub output: Option<PathBuf>,

    /// Make target (default: the Makefile's default target)
    pub target: Option<String>,

    /// Path to the make executable
    pub make: Option<PathBuf>,
}

/// Settings for running native test binaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Seconds before a test is killed (default 600)
    pub timeout: Option<u64>,

    /// Directory for `.status`, `.stdout` and `.stderr` files
    pub results: Option<PathBuf>,

    /// Environment variables passed to every test
    pub env: BTreeMap<String, String>,

    /// Arguments passed to every test
    pub args: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Maps are merged key by key; lists are replaced when non-empty.
    pub fn merge(&mut self, other: Config) {
        // Generate settings
        if other.generate.source.is_some() {
            self.generate.source = other.generate.source;
        }
        if other.generate.output.is_some() {
            self.generate.output = other.generate.output;
        }
        if other.generate.generator.is_some() {
            self.generate.generator = other.generate.generator;
        }
        if other.generate.cmake.is_some() {
            self.generate.cmake = other.generate.cmake;
        }
        self.generate.env.extend(other.generate.env);
        self.generate.vars.extend(other.generate.vars);

        // Compile settings
        if other.compile.output.is_some() {
            self.compile.output = other.compile.output;
        }
        if other.compile.target.is_some() {
            self.compile.target = other.compile.target;
        }
        if other.compile.make.is_some() {
            self.compile.make = other.compile.make;
        }

        // Test settings
        if other.test.timeout.is_some() {
            self.test.timeout = other.test.timeout;
        }
        if other.test.results.is_some() {
            self.test.results = other.test.results;
        }
        self.test.env.extend(other.test.env);
        if !other.test.args.is_empty() {
            self.test.args = other.test.args;
        }
    }
}

/// Get the global shipyard config directory (~/.shipyard).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".shipyard"))
}

/// Get the global config path (~/.shipyard/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.shipyard/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".shipyard").join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.shipyard/config.toml)
/// 2. Global config (~/.shipyard/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path.filter(|p| p.exists()) {
        config.merge(Config::load_or_default(global_path));
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Load the configuration that applies to `project_root`.
pub fn load_project_config(project_root: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(project_root))
}
