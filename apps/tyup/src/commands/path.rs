//! Path command for the tyup CLI.
//!
//! Prints where the server executable lives. Scripts use `--install` to make
//! sure the path exists before spawning it.

use anyhow::{Result, bail};
use clap::Args;
use tyup_installer::{ManagedServer, ensure_installed};

use crate::settings::{self, GlobalArgs};

/// Arguments for the path command.
#[derive(Args, Debug)]
pub struct PathArgs {
    /// Install the server first if it is missing.
    #[clap(long = "install", action = clap::ArgAction::SetTrue, conflicts_with = "check")]
    pub install: bool,

    /// Fail if the server is not installed.
    #[clap(long = "check", action = clap::ArgAction::SetTrue)]
    pub check: bool,
}

/// Executes the path command.
///
/// # Errors
///
/// Returns an error if configuration fails, `--check` is given and the
/// server is missing, or `--install` fails.
pub fn execute(global: &GlobalArgs, args: &PathArgs) -> Result<()> {
    let server = settings::server(global)?;

    let path = if args.install {
        ensure_installed(&server)?
    } else {
        if args.check && server.needs_installation() {
            bail!(
                "ty {} is not installed. Run 'tyup install' first.",
                server.server_version()
            );
        }
        server.server_path()
    };

    println!("{}", path.display());
    Ok(())
}
