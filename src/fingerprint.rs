//! Short deterministic content fingerprints used in generated file names.

use std::hash::Hasher;
use twox_hash::XxHash64;

/// Number of hex characters in a fingerprint.
pub const FINGERPRINT_LEN: usize = 8;

/// Returns an 8-character lowercase hex fingerprint of `content`.
///
/// The digest is the high 32 bits of XxHash64 with seed 0, so identical
/// content always yields the same fingerprint.
///
/// ```
/// use topicsort::fingerprint::fingerprint;
///
/// let fp = fingerprint("def foo(): pass");
/// assert_eq!(fp.len(), 8);
/// assert_eq!(fp, fingerprint("def foo(): pass"));
/// ```
pub fn fingerprint(content: &str) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(content.as_bytes());
    format!("{:08x}", hasher.finish() >> 32)
}
