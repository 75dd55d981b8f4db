//! Platforms command for the tyup CLI.
//!
//! Prints the platform table; the detected host platform is marked with `*`.

use anyhow::Result;
use tyup_installer::PlatformKey;

/// Executes the platforms command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute() -> Result<()> {
    let host = PlatformKey::detect().ok();

    for key in PlatformKey::ALL {
        println!("{}", format_row(key, host == Some(key)));
    }
    Ok(())
}

fn format_row(key: PlatformKey, is_host: bool) -> String {
    let descriptor = key.descriptor();
    let marker = if is_host { '*' } else { ' ' };
    format!(
        "{marker} {:<12} {:<40} {}",
        key.as_str(),
        descriptor.archive_filename,
        descriptor.executable_relative_path
    )
}
