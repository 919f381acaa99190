//! Argon2 cost presets per deployment target.
//!
//! A `Profile` is a named, fixed set of Argon2id parameters.  Servers can
//! afford a 64 MB, three-pass derivation; a phone cannot.  The table is
//! static data, there is nothing to initialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::kdf::Argon2Params;
use crate::errors::{Result, SaveVaultError};

/// Key-derivation cost preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// 8 lanes, 3 passes, 64 MB.
    ServerGrade,
    /// 2 lanes, 1 pass, 16 MB.
    #[default]
    DesktopGame,
    /// 1 lane, 1 pass, 8 MB.
    MobileGame,
}

impl Profile {
    /// Every profile, in table order.
    pub const ALL: [Profile; 3] = [
        Profile::ServerGrade,
        Profile::DesktopGame,
        Profile::MobileGame,
    ];

    /// The Argon2id cost parameters for this profile.
    pub const fn cost_params(self) -> Argon2Params {
        match self {
            Profile::ServerGrade => Argon2Params {
                parallelism: 8,
                iterations: 3,
                memory_kib: 65_536,
            },
            Profile::DesktopGame => Argon2Params {
                parallelism: 2,
                iterations: 1,
                memory_kib: 16_384,
            },
            Profile::MobileGame => Argon2Params {
                parallelism: 1,
                iterations: 1,
                memory_kib: 8_192,
            },
        }
    }

    /// Kebab-case name, as used in settings files.
    pub const fn name(self) -> &'static str {
        match self {
            Profile::ServerGrade => "server-grade",
            Profile::DesktopGame => "desktop-game",
            Profile::MobileGame => "mobile-game",
        }
    }
}

/// Look up the cost parameters of `profile`.
pub const fn cost_params(profile: Profile) -> Argon2Params {
    profile.cost_params()
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = SaveVaultError;

    /// Accepts `server-grade`, `ServerGrade`, `server_grade` and so on,
    /// ignoring case and separators.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "servergrade" => Ok(Profile::ServerGrade),
            "desktopgame" => Ok(Profile::DesktopGame),
            "mobilegame" => Ok(Profile::MobileGame),
            _ => Err(SaveVaultError::Configuration(format!(
                "unknown profile '{s}' (expected server-grade, desktop-game or mobile-game)"
            ))),
        }
    }
}

impl TryFrom<u8> for Profile {
    type Error = SaveVaultError;

    fn try_from(index: u8) -> Result<Self> {
        Profile::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| SaveVaultError::Configuration(format!("unknown profile index {index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_presets() {
        let server = cost_params(Profile::ServerGrade);
        assert_eq!(
            (server.parallelism, server.iterations, server.memory_kib),
            (8, 3, 65_536)
        );

        let desktop = cost_params(Profile::DesktopGame);
        assert_eq!(
            (desktop.parallelism, desktop.iterations, desktop.memory_kib),
            (2, 1, 16_384)
        );

        let mobile = cost_params(Profile::MobileGame);
        assert_eq!(
            (mobile.parallelism, mobile.iterations, mobile.memory_kib),
            (1, 1, 8_192)
        );
    }

    #[test]
    fn default_is_desktop_game() {
        assert_eq!(Profile::default(), Profile::DesktopGame);
    }

    #[test]
    fn parses_names_loosely() {
        assert_eq!("server-grade".parse::<Profile>().unwrap(), Profile::ServerGrade);
        assert_eq!("DesktopGame".parse::<Profile>().unwrap(), Profile::DesktopGame);
        assert_eq!("MOBILE_GAME".parse::<Profile>().unwrap(), Profile::MobileGame);
    }

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let err = "console".parse::<Profile>().unwrap_err();
        assert!(matches!(err, SaveVaultError::Configuration(_)));
    }

    #[test]
    fn numeric_index_outside_table_is_rejected() {
        assert_eq!(Profile::try_from(0).unwrap(), Profile::ServerGrade);
        assert_eq!(Profile::try_from(2).unwrap(), Profile::MobileGame);
        assert!(matches!(
            Profile::try_from(3),
            Err(SaveVaultError::Configuration(_))
        ));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for profile in Profile::ALL {
            assert_eq!(profile.to_string().parse::<Profile>().unwrap(), profile);
        }
    }
}
