//! Version command for the tyup CLI.
//!
//! Prints the server version tyup would install. In verbose mode, also
//! shows build information for tyup itself.

use anyhow::{Context, Result};

use crate::settings::{self, GlobalArgs};

/// Executes the version command.
///
/// # Errors
///
/// Returns an error if the version source cannot be resolved.
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config = settings::load_config(global)?;
    let version = config
        .version_source
        .resolve()
        .context("Failed to resolve server version")?;

    println!("ty {version}");
    if global.verbose {
        print_build_info();
    }
    Ok(())
}

/// Prints build information for tyup.
fn print_build_info() {
    println!();
    println!("Build Information:");
    println!("  tyup:     {}", env!("CARGO_PKG_VERSION"));
    println!("  Commit:   {}", git_commit());
    println!("  Target:   {}", build_target());
    println!("  Platform: {}", platform_string());
}

/// Returns the git commit hash from environment or a fallback.
fn git_commit() -> &'static str {
    option_env!("TYUP_GIT_COMMIT").unwrap_or("unknown")
}

fn build_target() -> &'static str {
    option_env!("TYUP_BUILD_TARGET").unwrap_or("unknown")
}

/// Returns a human-readable platform string.
fn platform_string() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}
