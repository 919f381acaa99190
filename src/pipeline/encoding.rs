//! Value-to-bytes encoding stage.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{Result, SaveVaultError};

/// Turns a typed value into bytes and back.
///
/// `decode_stream` returns `Ok(None)` for a payload that holds no value,
/// so callers can tell an empty file from a corrupt one.
pub trait Encoding {
    fn encode_stream<T>(&self, value: &T, sink: &mut dyn Write) -> Result<()>
    where
        T: Serialize + ?Sized;

    fn decode_stream<T>(&self, source: &mut dyn Read) -> Result<Option<T>>
    where
        T: DeserializeOwned;
}

/// Compact UTF-8 JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Encoding for Json {
    fn encode_stream<T>(&self, value: &T, sink: &mut dyn Write) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_writer(sink, value).map_err(|e| {
            if e.is_io() {
                SaveVaultError::from_io(e.into())
            } else {
                SaveVaultError::Serialization {
                    type_name: std::any::type_name::<T>(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn decode_stream<T>(&self, source: &mut dyn Read) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut body = Vec::new();
        source
            .read_to_end(&mut body)
            .map_err(SaveVaultError::from_io)?;

        tracing::trace!(bytes = body.len(), "decoded payload size");

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        // `Option<T>` maps a literal `null` to `None`.
        serde_json::from_slice::<Option<T>>(&body).map_err(|e| SaveVaultError::Serialization {
            type_name: std::any::type_name::<T>(),
            message: e.to_string(),
        })
    }
}
