//! Verify command for the tyup CLI.
//!
//! Checks a local archive against a `sha256sum`-format file, the same check
//! `tyup install` applies to downloads.
//!
//! ## Usage
//!
//! ```bash
//! tyup verify ty-x86_64-unknown-linux-gnu.tar.gz ty-x86_64-unknown-linux-gnu.tar.gz.sha256
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tyup_installer::verify::verify_checksum;

/// Arguments for the verify command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Archive to check.
    pub archive: PathBuf,

    /// File holding the expected digest, e.g. `<archive>.sha256`.
    pub checksum: PathBuf,
}

/// Executes the verify command.
///
/// # Errors
///
/// Returns an error if either file is unreadable or the digests differ.
pub fn execute(args: &VerifyArgs) -> Result<()> {
    let data = std::fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive: {}", args.archive.display()))?;
    let golden = std::fs::read_to_string(&args.checksum)
        .with_context(|| format!("Failed to read checksum file: {}", args.checksum.display()))?;

    verify_checksum(&data, &golden)
        .with_context(|| format!("Verification failed for {}", args.archive.display()))?;

    println!("OK: {}", args.archive.display());
    Ok(())
}
