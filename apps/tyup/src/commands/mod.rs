//! Command modules for the tyup CLI.
//!
//! ## Installation Commands
//!
//! - [`install`] - Install the pinned server version
//! - [`uninstall`] - Remove installed versions
//!
//! ## Inspection Commands
//!
//! - [`status`] - Show installation state
//! - [`path`] - Print the executable path
//! - [`version`] - Print version information
//! - [`platforms`] - List the platform table
//! - [`verify`] - Check a local archive

pub mod install;
pub mod path;
pub mod platforms;
pub mod status;
pub mod uninstall;
pub mod verify;
pub mod version;
