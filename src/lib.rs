//! Password-protected save files.
//!
//! A value is serialized to JSON, gzip-compressed, AES-256 encrypted and
//! written to a single file; reading runs the same chain backwards.  The
//! key and IV come either from Argon2id over a password and salt, tuned
//! by a [`Profile`], or straight from the caller as an
//! [`EncryptionContext`].
//!
//! The file carries no header and no authentication tag.  This keeps
//! casual users from reading or editing saves; it does not stop a
//! determined attacker.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod pipeline;
pub mod store;

pub use config::Settings;
pub use crypto::{CipherMode, EncryptionContext, PaddingScheme, Profile};
pub use errors::{Result, SaveVaultError};
pub use pipeline::Pipeline;
pub use store::{
    read_file, read_file_async, read_file_with, read_file_with_async, write_file,
    write_file_async, write_file_with, write_file_with_async,
};
