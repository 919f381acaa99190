use std::path::Path;

use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::crypto::context::{CipherMode, PaddingScheme};
use crate::crypto::profile::Profile;
use crate::errors::{Result, SaveVaultError};

/// Pipeline tuning, optionally loaded from a TOML file.
///
/// Every field has a sensible default so savevault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Argon2 cost preset (default: desktop-game).
    #[serde(default)]
    pub profile: Profile,

    /// Block chaining mode (default: cbc).
    #[serde(default)]
    pub cipher_mode: CipherMode,

    /// Final-block padding (default: pkcs7).
    #[serde(default)]
    pub padding: PaddingScheme,

    /// Gzip level, 0 (store) to 9 (smallest).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_compression_level() -> u32 {
    Compression::default().level()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            cipher_mode: CipherMode::default(),
            padding: PaddingScheme::default(),
            compression_level: default_compression_level(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SaveVaultError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;

        settings.compression()?;
        Ok(settings)
    }

    /// The configured gzip level.
    pub fn compression(&self) -> Result<Compression> {
        if self.compression_level > 9 {
            return Err(SaveVaultError::Configuration(format!(
                "compression_level must be between 0 and 9 (got {})",
                self.compression_level
            )));
        }
        Ok(Compression::new(self.compression_level))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
