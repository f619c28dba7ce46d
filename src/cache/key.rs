//! Key Derivation Module
//!
//! Maps URLs to cache keys and cache keys to file names under the disk root.
//!
//! URL keys are the lowercase hex SHA-256 of the URL. The hash is part of the
//! on-disk format: every process and version must agree on it so that a
//! cache directory written by one can be read by another.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Scheme prefix of synthetic URLs issued for temporary entries.
pub const TEMPORARY_URL_SCHEME: &str = "temp:";

/// Longest key that is used verbatim as a file name.
const MAX_VERBATIM_KEY_LENGTH: usize = 128;

/// Suffix marking a file name derived by hashing the key.
const HASHED_NAME_SUFFIX: &str = ".h";

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// == URL -> Key ==
/// Derives the cache key for a URL.
pub fn key_for_url(url: &str) -> String {
    sha256_hex(url.as_bytes())
}

// == Key -> File Name ==
/// Returns the file name a key is stored under.
///
/// Keys made only of lowercase ASCII letters, digits, `_` and `-` (and no
/// longer than 128 bytes) are used as-is, unless they name a Windows device.
/// Any other key is hashed and given a `.h` suffix. Verbatim names never
/// contain a dot, so the two forms cannot collide, and two verbatim names
/// never differ only by case.
pub fn file_name_for_key(key: &str) -> String {
    if is_verbatim_safe(key) {
        key.to_string()
    } else {
        let mut name = sha256_hex(key.as_bytes());
        name.push_str(HASHED_NAME_SUFFIX);
        name
    }
}

fn is_verbatim_safe(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_VERBATIM_KEY_LENGTH
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
        && !is_reserved_device_name(key)
}

/// Device names Windows resolves in every directory.
fn is_reserved_device_name(name: &str) -> bool {
    match name {
        "con" | "prn" | "aux" | "nul" => true,
        _ => {
            let bytes = name.as_bytes();
            bytes.len() == 4
                && (name.starts_with("com") || name.starts_with("lpt"))
                && (b'1'..=b'9').contains(&bytes[3])
        }
    }
}

/// Returns the disk path for a key under `root`.
pub fn disk_path_for_key(root: &Path, key: &str) -> PathBuf {
    root.join(file_name_for_key(key))
}

/// Returns the disk path for a URL under `root`.
pub fn disk_path_for_url(root: &Path, url: &str) -> PathBuf {
    disk_path_for_key(root, &key_for_url(url))
}

// == Temporary URLs ==
/// Issues a fresh synthetic URL for content whose real URL is not known yet.
pub fn temporary_url() -> String {
    format!("{}{}", TEMPORARY_URL_SCHEME, Uuid::new_v4().simple())
}

/// Returns true if the URL was issued by [`temporary_url`].
pub fn is_temporary_url(url: &str) -> bool {
    url.starts_with(TEMPORARY_URL_SCHEME)
}
