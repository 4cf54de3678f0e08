//! Host platform checks.

use anyhow::{bail, Result};

/// Whether the host platform can run supervised native builds.
pub fn is_supported(os: &str) -> bool {
    os != "windows"
}

/// Refuse to run on hosts we cannot supervise processes on.
///
/// Called at the top of every public operation.
pub fn validate_platform() -> Result<()> {
    if !is_supported(std::env::consts::OS) {
        bail!("shipyard does not (yet) support the Windows platform");
    }
    Ok(())
}
