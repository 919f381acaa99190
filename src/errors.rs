use std::io;

use thiserror::Error;

/// All errors that can occur while saving or loading a file.
#[derive(Debug, Error)]
pub enum SaveVaultError {
    // --- Config errors ---
    #[error("Configuration error: {0}")]
    Configuration(String),

    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Cryptographic error: {0}")]
    Cryptographic(String),

    // --- Stage errors ---
    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Could not decode payload as `{type_name}`: {message}")]
    Serialization {
        type_name: &'static str,
        message: String,
    },

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SaveVaultError {
    /// Wrap this error so it can travel through an `io::Read`/`io::Write`
    /// chain and be recovered intact by [`SaveVaultError::from_io`].
    pub(crate) fn into_io(self) -> io::Error {
        let kind = match &self {
            SaveVaultError::Io(e) => e.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, self)
    }

    /// Recover a stage error carried inside an `io::Error`.
    ///
    /// Errors without a `SaveVaultError` payload become `Io`.
    pub(crate) fn from_io(err: io::Error) -> Self {
        if !Self::is_tagged(&err) {
            return SaveVaultError::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<SaveVaultError>()) {
            Some(Ok(stage)) => *stage,
            Some(Err(other)) => SaveVaultError::Io(io::Error::new(kind, other)),
            None => SaveVaultError::Io(io::Error::from(kind)),
        }
    }

    /// True when `err` already carries a `SaveVaultError` payload.
    pub(crate) fn is_tagged(err: &io::Error) -> bool {
        err.get_ref()
            .is_some_and(|inner| inner.is::<SaveVaultError>())
    }
}

/// Convenience type alias for savevault results.
pub type Result<T> = std::result::Result<T, SaveVaultError>;
