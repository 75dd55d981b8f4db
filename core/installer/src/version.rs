//! Server version resolution.
//!
//! The version to install is never taken from the network. It comes from a
//! [`VersionSource`]: either a pinned string (by default the build-time
//! [`TY_VERSION`] constant) or a `ty==<version>` line in a pinned
//! requirements file.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Error, Result};

/// Server version this build of tyup is pinned to.
pub const TY_VERSION: &str = "0.0.1-alpha.21";

/// A validated server version without a leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionTag(String);

impl VersionTag {
    /// Parses a version string, dropping a leading `v`.
    ///
    /// The tag becomes part of URLs and directory names, so it must be
    /// non-empty and free of whitespace, path separators and `..`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for empty or unsafe input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let tag = trimmed.strip_prefix('v').unwrap_or(trimmed);

        if tag.is_empty() {
            return Err(Error::configuration(format!("invalid version '{raw}': empty")));
        }
        if tag.contains("..")
            || tag
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | ':'))
        {
            return Err(Error::configuration(format!(
                "invalid version '{raw}': must not contain whitespace, separators or '..'"
            )));
        }

        Ok(Self(tag.to_string()))
    }

    /// Returns the version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the installation directory name, `v<version>`.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy that decides which server version to install.
pub trait VersionSource: fmt::Debug + Send + Sync {
    /// Resolves the version.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the source is missing or unparsable.
    fn resolve(&self) -> Result<VersionTag>;
}

/// A fixed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedVersion(pub String);

impl Default for PinnedVersion {
    fn default() -> Self {
        Self(TY_VERSION.to_string())
    }
}

impl VersionSource for PinnedVersion {
    fn resolve(&self) -> Result<VersionTag> {
        VersionTag::parse(&self.0)
    }
}

/// Reads the version from a `requirements.txt`-style file.
///
/// The first line of the form `<package>==<version>` wins. Package names are
/// compared case-insensitively; comments and environment markers after the
/// version are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsFile {
    /// Path of the requirements file.
    pub path: PathBuf,
    /// Package whose pin to read, `ty` by default.
    pub package: String,
}

impl RequirementsFile {
    /// Creates a source reading the `ty` pin from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            package: "ty".to_string(),
        }
    }

    /// Extracts the pinned version of `package` from requirements text.
    #[must_use]
    pub fn find_pin<'a>(content: &'a str, package: &str) -> Option<&'a str> {
        static PIN: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*==\s*([^\s;#]+)")
                .unwrap_or_else(|e| unreachable!("pin pattern is valid: {e}"))
        });

        content.lines().find_map(|line| {
            let caps = PIN.captures(line)?;
            let name = caps.get(1)?.as_str();
            if normalize(name) != normalize(package) {
                return None;
            }
            caps.get(2).map(|m| m.as_str())
        })
    }
}

/// PEP 503 name normalization: case-insensitive, `-`, `_` and `.` equivalent.
fn normalize(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '.'], "-")
}

impl VersionSource for RequirementsFile {
    fn resolve(&self) -> Result<VersionTag> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::configuration(format!(
                "cannot read requirements file {}: {e}",
                self.path.display()
            ))
        })?;

        let pin = Self::find_pin(&content, &self.package).ok_or_else(|| {
            Error::configuration(format!(
                "no '{}==<version>' pin in {}",
                self.package,
                self.path.display()
            ))
        })?;

        VersionTag::parse(pin)
    }
}
