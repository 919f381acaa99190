//! Cryptographic primitives for savevault.
//!
//! This module provides:
//! - Argon2id cost presets per deployment target (`profile`)
//! - Password-based key and IV derivation (`kdf`)
//! - The key/IV/mode/padding bundle for one call (`context`)
//! - Streaming AES-256 encryption and decryption (`stream`)

pub mod context;
pub mod kdf;
pub mod profile;
pub mod stream;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key_iv, EncryptionContext, Profile, ...};
pub use context::{CipherMode, EncryptionContext, PaddingScheme};
pub use kdf::{derive_key_iv, derive_key_iv_with_params, generate_salt, Argon2Params};
pub use profile::{cost_params, Profile};
pub use stream::{CipherStage, DecryptReader, EncryptWriter};
