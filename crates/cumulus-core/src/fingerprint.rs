//! Content fingerprints.
//!
//! A fingerprint is the lowercase hex MD5 digest of a buffer followed by
//! its lowercase hex SHA-1 digest — 72 characters total. It is both the
//! content identifier the cloud addresses parts by and the integrity
//! check applied to downloaded part data.

use digest::Digest;
use md5::Md5;
use sha1::Sha1;

/// Length of a fingerprint string: 32 hex characters of MD5 plus
/// 40 of SHA-1.
pub const FINGERPRINT_LEN: usize = 72;

/// Compute the fingerprint of a byte buffer.
pub fn fingerprint(data: &[u8]) -> String {
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    out.push_str(&hex::encode(Md5::digest(data)));
    out.push_str(&hex::encode(Sha1::digest(data)));
    out
}
