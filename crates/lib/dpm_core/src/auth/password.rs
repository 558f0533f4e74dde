//! Password hashing via bcrypt, generated application passphrases and
//! token fingerprints.

use rand::seq::IndexedRandom;
use rand::rng;
use sha2::{Digest, Sha256};

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

const PASSPHRASE_WORDS: &[&str] = &[
    "amber", "anchor", "birch", "canyon", "cedar", "comet", "delta", "ember", "falcon", "fjord",
    "garnet", "harbor", "indigo", "juniper", "kestrel", "lagoon", "maple", "meadow", "nebula",
    "onyx", "orchid", "pebble", "quartz", "raven", "saffron", "summit", "tundra", "umber",
    "velvet", "willow", "yarrow", "zephyr",
];

/// Words per generated passphrase.
const PASSPHRASE_LEN: usize = 5;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// Random space-separated passphrase for an application.
pub fn generate_passphrase() -> String {
    let mut rng = rng();
    (0..PASSPHRASE_LEN)
        .filter_map(|_| PASSPHRASE_WORDS.choose(&mut rng).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hex SHA-256 of a token; only fingerprints of issued tokens are stored.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}
