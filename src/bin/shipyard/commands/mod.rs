//! Command implementations

pub mod compile;
pub mod completions;
pub mod generate;
pub mod test;

use std::path::PathBuf;

/// Build tree used when neither flags nor config name one.
pub const DEFAULT_OUTPUT_DIR: &str = "target/native";

/// Resolve a directory option: flag, then config, then default.
pub fn pick_dir(flag: Option<PathBuf>, config: Option<PathBuf>, default: &str) -> PathBuf {
    flag.or(config).unwrap_or_else(|| PathBuf::from(default))
}
