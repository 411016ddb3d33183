//! Dedup key encoding.
//!
//! A dedup key is the SHA-1 of the original file content, rendered as URL-safe
//! base64 without padding.

use base64::prelude::*;

/// Converts standard base64 text into the URL-safe, unpadded alphabet.
///
/// ```rust
/// use mediasync_decode::urlsafe_base64;
/// assert_eq!(urlsafe_base64("bjvmULLYvkVj8jWVQFu1Pl98hYA="), "bjvmULLYvkVj8jWVQFu1Pl98hYA");
/// assert_eq!(urlsafe_base64("a+b/cw=="), "a-b_cw");
/// ```
pub fn urlsafe_base64(standard: &str) -> String {
    standard.trim_end_matches('=').replace('+', "-").replace('/', "_")
}

/// Encodes a raw SHA-1 digest as a dedup key.
pub fn dedup_key_from_sha1(digest: impl AsRef<[u8]>) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(digest)
}
