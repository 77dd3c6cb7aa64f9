//! Content hashing for summary cache keys.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of `text`.
#[must_use]
pub fn hash_content(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Builds the cache key for one file's diff: `"{filename}:{digest}"`.
#[must_use]
pub fn cache_key(filename: &str, diff: &str) -> String {
    format!("{filename}:{}", hash_content(diff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_hashes_empty_string() {
        assert_eq!(
            hash_content(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_deterministic_lowercase_hex() {
        let first = hash_content("+fn main() {}\n");
        let second = hash_content("+fn main() {}\n");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn different_content_different_digest() {
        assert_ne!(hash_content("+a"), hash_content("+b"));
    }

    #[test]
    fn key_combines_filename_and_digest() {
        let key = cache_key("src/lib.rs", "abc");
        assert_eq!(
            key,
            "src/lib.rs:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(key, cache_key("src/main.rs", "abc"));
    }
}
