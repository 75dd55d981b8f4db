#![warn(clippy::pedantic)]

//! # tyup
//!
//! Installs and locates the ty language server for the current platform.
//! Plugin hosts and scripts call `tyup path` to find the executable and
//! `tyup install` to make sure it exists.
//!
//! ## Subcommands
//!
//! - `install` - Download, verify and unpack the pinned server version
//! - `status` - Show installation state
//! - `path` - Print the executable path
//! - `version` - Print the pinned server version
//! - `uninstall` - Remove every installed version
//! - `platforms` - List supported platforms and their archives
//! - `verify` - Check a local archive against a `sha256sum` file
//!
//! ## Examples
//!
//! ```bash
//! tyup install
//! tyup --version-pin 0.0.1-alpha.20 install --force
//! tyup --requirements requirements.txt path
//! ```

mod commands;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{install, path, platforms, status, uninstall, verify, version};
use settings::GlobalArgs;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TYUP_LOG";

/// Installer for the ty language server.
#[derive(Parser)]
#[command(
    name = "tyup",
    author,
    version,
    about = "Install and locate the ty language server",
    after_help = "\
ENVIRONMENT VARIABLES:
    TYUP_HOME               Storage root (default: ~/.tyup)
    TYUP_DIST_SERVER        Release base URL (default: https://github.com/astral-sh/ty/releases/download)
    TYUP_PLATFORM           Platform override, e.g. linux_arm64
    TYUP_LOG                Log filter (default: warn)"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the tyup CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install the pinned server version.
    ///
    /// Does nothing if the version is already installed, unless --force is
    /// given. Any previously installed version is removed.
    Install(install::InstallArgs),

    /// Show installation state, version, platform and executable path.
    Status,

    /// Print the path of the server executable.
    Path(path::PathArgs),

    /// Print the pinned server version.
    ///
    /// With -v, also prints build information for tyup itself.
    Version,

    /// Remove every installed version.
    Uninstall,

    /// List supported platforms and their release archives.
    Platforms,

    /// Verify a local archive against a sha256sum-format file.
    Verify(verify::VerifyArgs),
}

fn main() {
    if let Err(e) = run() {
        std::process::exit(handle_error(&e));
    }
}

/// Prints an error and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Install(args) => install::execute(&cli.global, &args),
        Commands::Status => status::execute(&cli.global),
        Commands::Path(args) => path::execute(&cli.global, &args),
        Commands::Version => version::execute(&cli.global),
        Commands::Uninstall => uninstall::execute(&cli.global),
        Commands::Platforms => platforms::execute(),
        Commands::Verify(args) => verify::execute(&args),
    }
}

/// Installs the stderr log subscriber.
///
/// `TYUP_LOG` wins when set; otherwise `-v` selects debug output for tyup.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "tyup=debug,tyup_installer=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
