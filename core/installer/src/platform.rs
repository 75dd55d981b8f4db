//! Platform detection and archive lookup.
//!
//! Maps an OS/architecture pair to the release archive published for it and
//! to the location of the server executable inside that archive.
//!
//! ## Supported Platforms
//!
//! - Linux `x86_64` and ARM64 (`linux_x64`, `linux_arm64`)
//! - macOS `x86_64` and ARM64 (`osx_x64`, `osx_arm64`)
//! - Windows `x86_64` and x86 (`windows_x64`, `windows_x86`)

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Platform-specific release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchiveDescriptor {
    /// File name of the release archive, also used to pick the extractor.
    pub archive_filename: &'static str,
    /// Path of the executable relative to the extraction root.
    pub executable_relative_path: &'static str,
}

/// A supported OS and architecture combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformKey {
    /// Linux on ARM64
    LinuxArm64,
    /// Linux on `x86_64`
    LinuxX64,
    /// macOS on ARM64 (Apple Silicon)
    OsxArm64,
    /// macOS on `x86_64`
    OsxX64,
    /// Windows on `x86_64`
    WindowsX64,
    /// Windows on 32-bit x86
    WindowsX86,
}

impl PlatformKey {
    /// Every supported platform, in table order.
    pub const ALL: [Self; 6] = [
        Self::LinuxArm64,
        Self::LinuxX64,
        Self::OsxArm64,
        Self::OsxX64,
        Self::WindowsX64,
        Self::WindowsX86,
    ];

    /// Detects the current platform from the compile-time target.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the host OS/architecture combination
    /// has no published archive.
    pub fn detect() -> Result<Self> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust's `std::env::consts` OS and architecture names to a key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unsupported combinations.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self> {
        match (os, arch) {
            ("linux", "aarch64") => Ok(Self::LinuxArm64),
            ("linux", "x86_64") => Ok(Self::LinuxX64),
            ("macos", "aarch64") => Ok(Self::OsxArm64),
            ("macos", "x86_64") => Ok(Self::OsxX64),
            ("windows", "x86_64") => Ok(Self::WindowsX64),
            ("windows", "x86") => Ok(Self::WindowsX86),
            _ => Err(Error::configuration(format!(
                "unsupported platform: {os} on {arch}. Supported platforms are: {}",
                supported_list()
            ))),
        }
    }

    /// Returns the token form used in configuration, e.g. `linux_arm64`.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxArm64 => "linux_arm64",
            Self::LinuxX64 => "linux_x64",
            Self::OsxArm64 => "osx_arm64",
            Self::OsxX64 => "osx_x64",
            Self::WindowsX64 => "windows_x64",
            Self::WindowsX86 => "windows_x86",
        }
    }

    /// Returns the OS half of the key.
    #[must_use = "returns the OS string without side effects"]
    pub fn os(self) -> &'static str {
        match self {
            Self::LinuxArm64 | Self::LinuxX64 => "linux",
            Self::OsxArm64 | Self::OsxX64 => "osx",
            Self::WindowsX64 | Self::WindowsX86 => "windows",
        }
    }

    /// Returns whether this platform is Windows.
    #[must_use = "returns platform check result without side effects"]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::WindowsX64 | Self::WindowsX86)
    }

    /// Returns the release artifact published for this platform.
    #[must_use = "returns the descriptor without side effects"]
    pub fn descriptor(self) -> ArchiveDescriptor {
        resolve(self)
    }
}

/// Looks up the archive descriptor for a platform.
#[must_use = "returns the descriptor without side effects"]
pub fn resolve(key: PlatformKey) -> ArchiveDescriptor {
    let (archive_filename, executable_relative_path) = match key {
        PlatformKey::LinuxArm64 => (
            "ty-aarch64-unknown-linux-gnu.tar.gz",
            "ty-aarch64-unknown-linux-gnu/ty",
        ),
        PlatformKey::LinuxX64 => (
            "ty-x86_64-unknown-linux-gnu.tar.gz",
            "ty-x86_64-unknown-linux-gnu/ty",
        ),
        PlatformKey::OsxArm64 => ("ty-aarch64-apple-darwin.tar.gz", "ty-aarch64-apple-darwin/ty"),
        PlatformKey::OsxX64 => ("ty-x86_64-apple-darwin.tar.gz", "ty-x86_64-apple-darwin/ty"),
        PlatformKey::WindowsX64 => ("ty-x86_64-pc-windows-msvc.zip", "ty.exe"),
        PlatformKey::WindowsX86 => ("ty-i686-pc-windows-msvc.zip", "ty.exe"),
    };
    ArchiveDescriptor {
        archive_filename,
        executable_relative_path,
    }
}

fn supported_list() -> String {
    PlatformKey::ALL
        .iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "unknown platform key '{s}'. Supported platforms are: {}",
                    supported_list()
                ))
            })
    }
}
