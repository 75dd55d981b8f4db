//! Archive extraction for downloaded releases.
//!
//! Archives are extracted straight from memory. The format is picked from the
//! declared file name:
//!
//! | suffix               | reader              |
//! |----------------------|---------------------|
//! | `.tar`               | tar                 |
//! | `.tar.gz`, `.tgz`    | tar over gzip       |
//! | `.tar.bz2`           | tar over bzip2      |
//! | `.tar.xz`            | tar over xz         |
//! | `.zip`               | zip                 |
//!
//! Any other suffix is not an error: [`extract_archive`] returns `Ok(false)`
//! and leaves the file system untouched.
//!
//! ## Path confinement
//!
//! Every member must resolve to a path inside the destination directory and
//! must not contain `..`. For tar archives all members (and link targets) are
//! checked before the first write, including members that would be written
//! through a symlink created earlier in the same archive. Zip members are checked one by one right before each write, so a
//! rejected zip may leave earlier members behind.

use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use tracing::debug;
use xz2::read::XzDecoder;

use crate::errors::{Error, Result};

/// Stream compression wrapped around a tar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain `.tar`
    None,
    /// `.tar.gz` / `.tgz`
    Gzip,
    /// `.tar.bz2`
    Bzip2,
    /// `.tar.xz`
    Xz,
}

/// Container format inferred from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A tar archive with optional stream compression.
    Tar(Compression),
    /// A zip archive.
    Zip,
}

impl ArchiveKind {
    /// Infers the archive kind from a file name suffix.
    ///
    /// Returns `None` if no supported suffix matches.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let name = filename.to_ascii_lowercase();
        if name.ends_with(".tar") {
            Some(Self::Tar(Compression::None))
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Tar(Compression::Gzip))
        } else if name.ends_with(".tar.bz2") {
            Some(Self::Tar(Compression::Bzip2))
        } else if name.ends_with(".tar.xz") {
            Some(Self::Tar(Compression::Xz))
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Extracts an in-memory archive into `dest_dir`.
///
/// Creates the destination directory (and its parents) if it does not exist.
/// Member paths are kept as stored; nothing is stripped.
///
/// Returns `Ok(false)` if `filename` has no supported archive suffix.
///
/// # Errors
///
/// Returns an error if:
/// - A member resolves outside `dest_dir` ([`Error::PathTraversal`])
/// - The archive stream is malformed ([`Error::Archive`])
/// - Directory or file creation fails ([`Error::Filesystem`])
///
/// # Example
///
/// ```ignore
/// let data = std::fs::read("ty-x86_64-unknown-linux-gnu.tar.gz")?;
/// extract_archive(&data, "ty-x86_64-unknown-linux-gnu.tar.gz", Path::new("out"))?;
/// ```
pub fn extract_archive(data: &[u8], filename: &str, dest_dir: &Path) -> Result<bool> {
    let Some(kind) = ArchiveKind::from_filename(filename) else {
        debug!(filename, "no archive format matched");
        return Ok(false);
    };

    std::fs::create_dir_all(dest_dir)
        .map_err(|e| Error::filesystem("failed to create directory", dest_dir, e))?;
    let root = dest_dir
        .canonicalize()
        .map_err(|e| Error::filesystem("failed to resolve directory", dest_dir, e))?;

    debug!(filename, ?kind, dest = %root.display(), "extracting archive");

    match kind {
        ArchiveKind::Tar(compression) => extract_tar(data, compression, filename, &root)?,
        ArchiveKind::Zip => extract_zip(data, filename, &root)?,
    }

    Ok(true)
}

fn tar_stream(data: &[u8], compression: Compression) -> Box<dyn Read + '_> {
    match compression {
        Compression::None => Box::new(data),
        Compression::Gzip => Box::new(GzDecoder::new(data)),
        Compression::Bzip2 => Box::new(BzDecoder::new(data)),
        Compression::Xz => Box::new(XzDecoder::new(data)),
    }
}

/// Extracts a tar archive after confirming every member stays inside `root`.
fn extract_tar(data: &[u8], compression: Compression, filename: &str, root: &Path) -> Result<()> {
    check_tar_members(data, compression, filename, root)?;

    let mut archive = Archive::new(tar_stream(data, compression));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive.unpack(root).map_err(|e| {
        if escapes_destination(&e) {
            Error::path_traversal(e.to_string(), root)
        } else {
            Error::filesystem(format!("failed to unpack {filename}"), root, e)
        }
    })
}

/// Detects the `tar` crate's own refusal to write outside the destination.
fn escapes_destination(e: &std::io::Error) -> bool {
    const MARKER: &str = "outside of destination";

    if e.to_string().contains(MARKER) {
        return true;
    }
    let mut current: Option<&(dyn std::error::Error + 'static)> = e
        .get_ref()
        .map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(err) = current {
        if err.to_string().contains(MARKER) {
            return true;
        }
        current = err.source();
    }
    false
}

fn check_tar_members(
    data: &[u8],
    compression: Compression,
    filename: &str,
    root: &Path,
) -> Result<()> {
    let mut archive = Archive::new(tar_stream(data, compression));
    let entries = archive
        .entries()
        .map_err(|e| Error::archive(filename, "failed to read tar entries", e))?;

    // Resolved paths of symlink members seen so far.
    let mut symlinks: Vec<PathBuf> = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| Error::archive(filename, "failed to read tar entry", e))?;
        let member = entry
            .path()
            .map_err(|e| Error::archive(filename, "invalid entry path", e))?
            .into_owned();
        let entry_type = entry.header().entry_type();

        let resolved = confine(root, &member, entry_type.is_dir())?;

        // A member below an earlier symlink would be written through it.
        if symlinks
            .iter()
            .any(|link| resolved != *link && resolved.starts_with(link))
        {
            return Err(Error::path_traversal(member.display().to_string(), root));
        }

        if matches!(entry_type, EntryType::Symlink | EntryType::Link) {
            let Some(target) = entry
                .link_name()
                .map_err(|e| Error::archive(filename, "invalid link target", e))?
            else {
                continue;
            };
            // Symlinks resolve against the member's directory, hard links
            // against the archive root.
            let base = if entry_type == EntryType::Symlink {
                resolved.parent().unwrap_or(root).to_path_buf()
            } else {
                root.to_path_buf()
            };
            if resolve_lexically(&base, &target).is_none_or(|p| !p.starts_with(root)) {
                return Err(Error::path_traversal(
                    format!("{} -> {}", member.display(), target.display()),
                    root,
                ));
            }
            if entry_type == EntryType::Symlink {
                symlinks.push(resolved);
            }
        }
    }

    Ok(())
}

/// Extracts a zip archive, checking each member right before it is written.
fn extract_zip(data: &[u8], filename: &str, root: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::archive(filename, "failed to read zip archive", e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::archive(filename, format!("failed to read entry {i}"), e))?;

        let member = PathBuf::from(entry.name());
        let output_path = confine(root, &member, entry.is_dir())?;

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| Error::filesystem("failed to create directory", &output_path, e))?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::filesystem("failed to create directory", parent, e))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .map_err(|e| Error::filesystem("failed to create file", &output_path, e))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| Error::filesystem("failed to extract", &output_path, e))?;

        #[cfg(unix)]
        apply_unix_mode(&output_path, entry.unix_mode())?;
    }

    Ok(())
}

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode else {
        return Ok(());
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| Error::filesystem("failed to set permissions", path, e))
}

/// Resolves `member` against `root` and rejects anything outside it.
///
/// Members containing `..` are rejected even when they fold back inside
/// `root`, since `tar` skips them without writing anything.
fn confine(root: &Path, member: &Path, is_dir: bool) -> Result<PathBuf> {
    if member
        .components()
        .any(|component| component == Component::ParentDir)
    {
        return Err(Error::path_traversal(member.display().to_string(), root));
    }

    match resolve_lexically(root, member) {
        // Not a strict descendant check: a `./` directory entry names the
        // root itself.
        Some(resolved) if resolved.starts_with(root) && (is_dir || resolved != root) => {
            Ok(resolved)
        }
        _ => Err(Error::path_traversal(member.display().to_string(), root)),
    }
}

/// Joins `relative` onto `base`, folding `.` and `..` without touching the
/// file system.
///
/// Returns `None` for absolute paths and for `..` chains that climb past the
/// file system root.
fn resolve_lexically(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return None,
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::Normal(part) => resolved.push(part),
        }
    }
    Some(resolved)
}

/// Marks a file as executable for owner, group and others (Unix only).
///
/// # Errors
///
/// Returns an error if the file metadata cannot be read or the permissions
/// cannot be set.
#[cfg(unix)]
pub fn set_executable_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::filesystem("failed to get metadata", path, e))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .map_err(|e| Error::filesystem("failed to set permissions", path, e))
}

/// Sets executable permissions (no-op where the execute bit does not exist).
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
pub fn set_executable_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
