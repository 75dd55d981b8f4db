//! Error types for the installer.
//!
//! Every failure of an install surfaces to the caller as an [`Error`]. The
//! variants follow the failure taxonomy of the install pipeline and each one
//! carries enough context (URL, path, platform, digests) to render a useful
//! message without further lookups.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::verify::ChecksumMismatch;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Consolidated error type for installer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid static configuration: unknown platform key, unparsable version
    /// source, unsupported archive name, unreadable config file.
    ///
    /// Not retried; fixing it requires changing configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of what was misconfigured.
        message: String,
    },

    /// Network or HTTP failure while downloading an archive or checksum.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The downloaded archive does not match its golden hash.
    #[error("integrity check failed for {url}: {mismatch}")]
    Integrity {
        /// URL the archive was downloaded from.
        url: String,
        /// Expected and actual digests.
        #[source]
        mismatch: ChecksumMismatch,
    },

    /// An archive member would be written outside the destination directory.
    #[error("path traversal in archive: member '{member}' escapes {}", dest.display())]
    PathTraversal {
        /// Name of the offending member, as stored in the archive.
        member: String,
        /// The destination directory extraction was confined to.
        dest: PathBuf,
    },

    /// The archive stream itself could not be decoded.
    #[error("failed to read archive {filename}: {message}")]
    Archive {
        /// Declared filename of the archive.
        filename: String,
        /// What went wrong while reading it.
        message: String,
        /// The underlying decoder error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Reading or writing the installation directory failed.
    #[error("{message}: {}", path.display())]
    Filesystem {
        /// Description of the operation that failed.
        message: String,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Extraction succeeded but the executable is not where the platform
    /// descriptor says it should be.
    #[error("executable not found after extraction: {}", path.display())]
    MissingExecutable {
        /// The expected executable path.
        path: PathBuf,
    },
}

impl Error {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Filesystem` error for the given path.
    #[must_use]
    pub fn filesystem(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a new `Archive` error wrapping a decoder failure.
    #[must_use]
    pub fn archive(
        filename: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Archive {
            filename: filename.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `PathTraversal` error.
    #[must_use]
    pub fn path_traversal(member: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self::PathTraversal {
            member: member.into(),
            dest: dest.into(),
        }
    }

    /// Returns `true` for failures that are never worth retrying without a
    /// configuration or upstream change.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Integrity { .. }
                | Self::PathTraversal { .. }
                | Self::MissingExecutable { .. }
        )
    }
}
