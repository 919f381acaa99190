//! Save and load typed values to encrypted files.
//!
//! Every function here runs the standard chain: JSON, gzip, AES-256.
//! The `*_with` variants take a ready-made [`EncryptionContext`]; the
//! others derive one from a password and salt with the given profile
//! (`Profile::default()` is `DesktopGame`).
//!
//! The async variants only yield while the file is read or written.
//! Key derivation, compression and encryption run inline on the calling
//! task, so an expensive profile still blocks it.
//!
//! Writes go straight to `path`: a failure part-way through can leave a
//! truncated file behind.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::crypto::context::EncryptionContext;
use crate::crypto::profile::Profile;
use crate::errors::Result;
use crate::pipeline::Pipeline;

/// Encrypt `value` into `path` with a key derived from `password` and `salt`.
pub fn write_file<T>(
    value: &T,
    path: impl AsRef<Path>,
    password: &str,
    salt: &str,
    profile: Profile,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let context = EncryptionContext::derive(password.as_bytes(), salt.as_bytes(), profile)?;
    tracing::debug!(path = %path.as_ref().display(), %profile, "writing file");
    write_file_with(value, path, context)
}

/// Read back a value written by [`write_file`].
///
/// Returns `Ok(None)` when the file decodes to an empty or `null` payload.
pub fn read_file<T>(
    path: impl AsRef<Path>,
    password: &str,
    salt: &str,
    profile: Profile,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let context = EncryptionContext::derive(password.as_bytes(), salt.as_bytes(), profile)?;
    tracing::debug!(path = %path.as_ref().display(), %profile, "reading file");
    read_file_with(path, context)
}

/// Encrypt `value` into `path` with a caller-supplied context.
pub fn write_file_with<T>(value: &T, path: impl AsRef<Path>, context: EncryptionContext) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), mode = ?context.mode(), "opening file for write");

    let pipeline = Pipeline::standard(context);
    let file = File::create(path)?;
    pipeline.write_to(value, Box::new(file))
}

/// Read back a value written by [`write_file_with`].
pub fn read_file_with<T>(path: impl AsRef<Path>, context: EncryptionContext) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), mode = ?context.mode(), "opening file for read");

    let pipeline = Pipeline::standard(context);
    let file = File::open(path)?;
    pipeline.read_from(file)
}

/// Async [`write_file`].
pub async fn write_file_async<T>(
    value: &T,
    path: impl AsRef<Path>,
    password: &str,
    salt: &str,
    profile: Profile,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let context = EncryptionContext::derive(password.as_bytes(), salt.as_bytes(), profile)?;
    tracing::debug!(path = %path.as_ref().display(), %profile, "writing file");
    write_file_with_async(value, path, context).await
}

/// Async [`read_file`].
pub async fn read_file_async<T>(
    path: impl AsRef<Path>,
    password: &str,
    salt: &str,
    profile: Profile,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let context = EncryptionContext::derive(password.as_bytes(), salt.as_bytes(), profile)?;
    tracing::debug!(path = %path.as_ref().display(), %profile, "reading file");
    read_file_with_async(path, context).await
}

/// Async [`write_file_with`].
///
/// The whole chain runs into memory first; the only await point is the
/// file write.
pub async fn write_file_with_async<T>(
    value: &T,
    path: impl AsRef<Path>,
    context: EncryptionContext,
) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), mode = ?context.mode(), "encoding for async write");

    let bytes = Pipeline::standard(context).to_bytes(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Async [`read_file_with`].
pub async fn read_file_with_async<T>(
    path: impl AsRef<Path>,
    context: EncryptionContext,
) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), mode = ?context.mode(), "reading file async");

    let bytes = tokio::fs::read(path).await?;
    Pipeline::standard(context).from_bytes(&bytes)
}
