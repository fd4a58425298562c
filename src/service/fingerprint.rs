//! Consistency fingerprints for classification attempts

use sha2::{Digest, Sha256};

/// Characters of the narrative that take part in the fingerprint
const NARRATIVE_PREFIX_CHARS: usize = 100;
const FINGERPRINT_LENGTH: usize = 16;

/// Short fingerprint of narrative prefix, category and subcategory
///
/// Two attempts on the same narrative that agree on the exact pair share a fingerprint.
pub fn consistency_fingerprint(narrative: &str, category: &str, subcategory: &str) -> String {
    let prefix: String = narrative.chars().take(NARRATIVE_PREFIX_CHARS).collect();
    let key_components = format!("{}|{}|{}", prefix, category, subcategory);

    let mut hash = hash_string(&key_components);
    hash.truncate(FINGERPRINT_LENGTH);
    hash
}

/// Hash a string to a hex string using SHA256
fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}
