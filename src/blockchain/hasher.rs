use std::fmt::Display;

use sha2::{Digest, Sha256};

/// Hash an ordered list of values into a lowercase hex SHA-256 digest.
///
/// Every part is rendered with `Display` and the renderings are concatenated
/// with no separator, so `("12", "3")` and `("1", "23")` produce the same
/// preimage. Existing digests depend on this layout.
pub fn digest(parts: &[&dyn Display]) -> String {
    let preimage: String = parts.iter().map(|part| part.to_string()).collect();
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when the first `difficulty` hex characters of `digest` are all `'0'`.
pub fn meets_difficulty(digest: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|c| c == b'0')
}
