//! Global options and installer construction.
//!
//! Configuration is layered: environment first, then the `--config` file,
//! then `--version-pin` / `--requirements` on the command line.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;
use tyup_installer::{
    ConfigFile, InstallEvent, Installer, InstallerConfig, PinnedVersion, RequirementsFile, TyServer,
};

/// Options accepted by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// TOML config file applied on top of the environment.
    #[clap(long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Install this server version instead of the built-in pin.
    #[clap(long = "version-pin", global = true, value_name = "VERSION")]
    pub version_pin: Option<String>,

    /// Read the server version from a `ty==<version>` line in this file.
    #[clap(long = "requirements", global = true, value_name = "FILE")]
    pub requirements: Option<PathBuf>,

    /// Show debug logs and detailed version information.
    #[clap(short = 'v', long = "verbose", global = true, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Builds the installer configuration from all sources.
///
/// # Errors
///
/// Returns an error if the environment, config file or version options are
/// invalid.
pub fn load_config(global: &GlobalArgs) -> Result<InstallerConfig> {
    if global.version_pin.is_some() && global.requirements.is_some() {
        bail!("--version-pin and --requirements cannot be used together");
    }

    let mut config = InstallerConfig::from_env().context("Failed to read environment")?;

    if let Some(path) = &global.config {
        let file = ConfigFile::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        config = config.apply_file(file)?;
    }

    if let Some(version) = &global.version_pin {
        config = config.with_version_source(PinnedVersion(version.clone()));
    } else if let Some(path) = &global.requirements {
        config = config.with_version_source(RequirementsFile::new(path));
    }

    debug!(
        storage_root = %config.storage_root.display(),
        platform = %config.platform,
        release_base_url = %config.release_base_url,
        "configuration loaded"
    );
    Ok(config)
}

/// Builds the installer for the configured version.
///
/// # Errors
///
/// Returns an error if configuration fails or the version cannot be resolved.
pub fn installer(global: &GlobalArgs) -> Result<Installer> {
    let config = load_config(global)?;
    Installer::new(config).context("Failed to initialize installer")
}

/// Builds the host view of the installer with progress printed to stdout.
///
/// # Errors
///
/// See [`installer`].
pub fn server(global: &GlobalArgs) -> Result<TyServer> {
    let installer = installer(global)?.with_observer(std::sync::Arc::new(print_progress));
    Ok(TyServer::new(installer))
}

fn print_progress(event: &InstallEvent) {
    match event {
        InstallEvent::Started { version, platform } => {
            println!("Installing ty {version} for {platform}...");
        }
        InstallEvent::Purged { path } => {
            println!("Removed previous installation at {}", path.display());
        }
        InstallEvent::Downloading { url } => println!("Downloading from {url}..."),
        InstallEvent::Verifying { .. } => println!("Verifying checksum..."),
        InstallEvent::Extracting { .. } => println!("Extracting..."),
        InstallEvent::Completed { .. } | InstallEvent::Failed { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_pin_and_requirements_conflict() {
        let global = GlobalArgs {
            version_pin: Some("0.0.1".to_string()),
            requirements: Some(PathBuf::from("requirements.txt")),
            ..GlobalArgs::default()
        };

        let err = load_config(&global).unwrap_err();

        assert!(err.to_string().contains("cannot be used together"));
    }
}
