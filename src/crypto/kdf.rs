//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  One derivation produces 48 bytes: the first 32 are
//! the AES-256 key, the last 16 the initialization vector.  Cost
//! parameters come from a [`Profile`] or an explicit `Argon2Params`.
//!
//! Argon2 refuses salts shorter than eight bytes.  Those are replaced by
//! a SHA-256 digest of a fixed label and the salt, so any string can be
//! used as a salt and still derives the same key every time.

use std::borrow::Cow;

use argon2::{Algorithm, Argon2, Params, Version, MIN_SALT_LEN};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use super::profile::Profile;
use crate::errors::{Result, SaveVaultError};

/// Length of the salt produced by [`generate_salt`] (256 bits).
const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the derived IV in bytes (one AES block).
pub const IV_LEN: usize = 16;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Prefix hashed in front of salts too short for Argon2.
const SHORT_SALT_LABEL: &[u8] = b"savevault short salt v1";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of iterations.
    pub iterations: u32,
    /// Parallelism lanes.
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Profile::default().cost_params()
    }
}

/// Derive a 32-byte key and a 16-byte IV from a password and salt.
///
/// The same password + salt + profile always produce the same bytes.
pub fn derive_key_iv(
    password: &[u8],
    salt: &[u8],
    profile: Profile,
) -> Result<([u8; KEY_LEN], [u8; IV_LEN])> {
    derive_key_iv_with_params(password, salt, &profile.cost_params())
}

/// Derive a key and IV with explicit Argon2id parameters.
///
/// Enforces minimum Argon2 parameters to prevent dangerously weak KDF settings.
pub fn derive_key_iv_with_params(
    password: &[u8],
    salt: &[u8],
    argon2_params: &Argon2Params,
) -> Result<([u8; KEY_LEN], [u8; IV_LEN])> {
    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(SaveVaultError::Configuration(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 {
        return Err(SaveVaultError::Configuration(
            "Argon2 iterations must be at least 1".into(),
        ));
    }
    if argon2_params.parallelism < 1 {
        return Err(SaveVaultError::Configuration(
            "Argon2 parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(KEY_LEN + IV_LEN),
    )
    .map_err(|e| SaveVaultError::Configuration(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    tracing::trace!(
        memory_kib = argon2_params.memory_kib,
        iterations = argon2_params.iterations,
        parallelism = argon2_params.parallelism,
        "deriving key and iv"
    );

    let mut output = [0u8; KEY_LEN + IV_LEN];
    argon2
        .hash_password_into(password, &argon2_salt(salt), &mut output)
        .map_err(|e| SaveVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&output[..KEY_LEN]);
    iv.copy_from_slice(&output[KEY_LEN..]);
    output.zeroize();

    Ok((key, iv))
}

/// The salt handed to Argon2: `salt` itself, or a digest when it is too short.
fn argon2_salt(salt: &[u8]) -> Cow<'_, [u8]> {
    if salt.len() >= MIN_SALT_LEN {
        return Cow::Borrowed(salt);
    }
    let mut hasher = Sha256::new();
    hasher.update(SHORT_SALT_LABEL);
    hasher.update(salt);
    Cow::Owned(hasher.finalize().to_vec())
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
