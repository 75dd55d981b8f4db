//! Checksum verification for downloaded archives.
//!
//! Release archives are published next to a `<archive>.sha256` file in the
//! `sha256sum` format (`"<hex>  <filename>"`). Only the first token of that
//! file matters; the rest is ignored.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// The computed digest differs from the golden hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("checksum mismatch: expected {expected}, got {actual}")]
pub struct ChecksumMismatch {
    /// Digest taken from the golden hash file.
    pub expected: String,
    /// Digest computed over the downloaded bytes.
    pub actual: String,
}

/// Computes the SHA256 hash of a byte buffer as a lowercase hex string.
#[must_use]
pub fn compute_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Extracts the digest from `sha256sum`-style text.
///
/// Returns the first whitespace-delimited token, or `None` for blank input.
#[must_use]
pub fn expected_digest(golden: &str) -> Option<&str> {
    golden.split_whitespace().next()
}

/// Verifies that `data` matches the digest in `golden`.
///
/// `golden` may be a bare hex digest or a full `sha256sum` line; the
/// comparison is case-insensitive.
///
/// # Errors
///
/// Returns [`ChecksumMismatch`] if the digests differ or `golden` is blank.
///
/// # Example
///
/// ```
/// use tyup_installer::verify::{compute_sha256, verify_checksum};
///
/// let data = b"hello world\n";
/// let golden = format!("{}  hello.txt\n", compute_sha256(data));
/// assert!(verify_checksum(data, &golden).is_ok());
/// ```
pub fn verify_checksum(data: &[u8], golden: &str) -> Result<(), ChecksumMismatch> {
    let actual = compute_sha256(data);
    let expected = expected_digest(golden).unwrap_or_default().to_lowercase();

    if expected != actual {
        return Err(ChecksumMismatch { expected, actual });
    }

    Ok(())
}
