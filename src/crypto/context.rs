//! Everything the cipher stage needs to encrypt or decrypt one file.

use std::fmt;

use cipher::block_padding::{AnsiX923, Iso7816, Padding, Pkcs7, UnpadError};
use cipher::consts::U16;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_key_iv, IV_LEN, KEY_LEN};
use super::profile::Profile;
use crate::errors::Result;

/// One AES block.
pub type Block = aes::Block;

/// Block chaining mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// Cipher block chaining, seeded by the IV.
    #[default]
    Cbc,
    /// Electronic codebook. The IV is ignored.
    Ecb,
}

/// How the final partial block is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingScheme {
    #[default]
    Pkcs7,
    AnsiX923,
    Iso7816,
}

impl PaddingScheme {
    /// Pad `block`, whose first `pos` bytes are data. `pos` is below 16.
    pub(crate) fn pad(self, block: &mut Block, pos: usize) {
        match self {
            PaddingScheme::Pkcs7 => <Pkcs7 as Padding<U16>>::pad(block, pos),
            PaddingScheme::AnsiX923 => <AnsiX923 as Padding<U16>>::pad(block, pos),
            PaddingScheme::Iso7816 => <Iso7816 as Padding<U16>>::pad(block, pos),
        }
    }

    /// Validate the padding of the final block and return its data bytes.
    pub(crate) fn unpad(self, block: &Block) -> std::result::Result<&[u8], UnpadError> {
        match self {
            PaddingScheme::Pkcs7 => <Pkcs7 as Padding<U16>>::unpad(block),
            PaddingScheme::AnsiX923 => <AnsiX923 as Padding<U16>>::unpad(block),
            PaddingScheme::Iso7816 => <Iso7816 as Padding<U16>>::unpad(block),
        }
    }
}

/// Key, IV, mode and padding for a single write or read.
///
/// Build one with [`EncryptionContext::derive`] from a password, or with
/// [`EncryptionContext::new`] from raw key material.  The key and IV are
/// zeroed when the context is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionContext {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
    #[zeroize(skip)]
    mode: CipherMode,
    #[zeroize(skip)]
    padding: PaddingScheme,
}

impl EncryptionContext {
    /// AES-256-CBC with PKCS#7 padding over the given key and IV.
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self {
            key,
            iv,
            mode: CipherMode::default(),
            padding: PaddingScheme::default(),
        }
    }

    /// Run Argon2id over `password` and `salt` with the profile's costs.
    pub fn derive(password: &[u8], salt: &[u8], profile: Profile) -> Result<Self> {
        let (mut key, mut iv) = derive_key_iv(password, salt, profile)?;
        let context = Self::new(key, iv);
        key.zeroize();
        iv.zeroize();
        Ok(context)
    }

    /// A fresh random key and IV.
    pub fn random() -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        let context = Self::new(key, iv);
        key.zeroize();
        iv.zeroize();
        context
    }

    pub fn with_mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_padding(mut self, padding: PaddingScheme) -> Self {
        self.padding = padding;
        self
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn padding(&self) -> PaddingScheme {
        self.padding
    }
}

// Never print key material.
impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .finish()
    }
}
