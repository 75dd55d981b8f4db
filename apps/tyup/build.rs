//! Build script for the tyup CLI.
//!
//! Sets compile-time environment variables for version information.

use std::process::Command;

fn main() {
    let commit = git_output(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=TYUP_GIT_COMMIT={commit}");

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=TYUP_BUILD_TARGET={target}");

    if let Some(workspace_root) = git_output(&["rev-parse", "--show-toplevel"]) {
        println!("cargo:rerun-if-changed={workspace_root}/.git/HEAD");
    }
}

/// Runs git and returns its trimmed stdout, if any.
fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if output.status.success() {
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}
