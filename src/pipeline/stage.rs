//! Capability traits shared by every stage of the chain.
//!
//! A write chain is a stack of [`Sink`]s: each layer transforms the bytes
//! written to it and forwards them to the layer beneath, ending at the
//! file.  A read chain is a stack of plain `io::Read`ers.  Stages plug in
//! through [`ByteStage`], which knows how to put one layer on top of an
//! existing sink or source.

use std::fs::File;
use std::io::{self, Read, Write};

use crate::errors::{Result, SaveVaultError};

/// A writable layer that must be finalized explicitly.
///
/// `close` finishes this layer (trailers, final padded block, ...) and
/// then closes the layer beneath it, so a chain is released outermost
/// first.  A sink that is dropped without `close` releases its resources
/// but may leave the output incomplete.
pub trait Sink: Write {
    fn close(self: Box<Self>) -> Result<()>;
}

pub type BoxSink<'a> = Box<dyn Sink + 'a>;
pub type BoxSource<'a> = Box<dyn Read + 'a>;

/// A byte-to-byte transformation such as compression or encryption.
pub trait ByteStage {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Put this stage on top of `inner` for writing.
    fn wrap_sink<'a>(&self, inner: BoxSink<'a>) -> Result<BoxSink<'a>>;

    /// Put this stage on top of `inner` for reading.
    fn wrap_source<'a>(&self, inner: BoxSource<'a>) -> Result<BoxSource<'a>>;
}

impl Sink for File {
    fn close(self: Box<Self>) -> Result<()> {
        let mut file = *self;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

impl<W: Write + ?Sized> Sink for &mut W {
    fn close(self: Box<Self>) -> Result<()> {
        let writer = *self;
        writer.flush()?;
        Ok(())
    }
}

/// Reader adapter that stamps its own failures with a stage error.
///
/// Errors that already carry a `SaveVaultError` (raised further down the
/// chain) pass through untouched, so the caller sees the stage that
/// actually failed.
pub(crate) struct TagErrors<R> {
    inner: R,
    tag: fn(io::Error) -> SaveVaultError,
}

impl<R: Read> TagErrors<R> {
    pub(crate) fn new(inner: R, tag: fn(io::Error) -> SaveVaultError) -> Self {
        Self { inner, tag }
    }

    pub(crate) fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: Read> Read for TagErrors<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) if SaveVaultError::is_tagged(&e) => Err(e),
            Err(e) => Err((self.tag)(e).into_io()),
        }
    }
}

/// Wrap a raw file (or any reader) as the bottom of a read chain.
pub fn source<'a, R: Read + 'a>(reader: R) -> BoxSource<'a> {
    Box::new(TagErrors::new(reader, SaveVaultError::Io))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing(io::ErrorKind);

    impl Read for Failing {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    #[test]
    fn untagged_errors_get_the_stage_tag() {
        let mut reader = TagErrors::new(Failing(io::ErrorKind::InvalidData), |e| {
            SaveVaultError::Decompression(e.to_string())
        });
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        assert!(matches!(
            SaveVaultError::from_io(err),
            SaveVaultError::Decompression(_)
        ));
    }

    #[test]
    fn bottom_source_tags_file_errors_as_io() {
        let mut reader = source(Failing(io::ErrorKind::PermissionDenied));
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        match SaveVaultError::from_io(err) {
            SaveVaultError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn already_tagged_errors_pass_through() {
        struct Tagged;
        impl Read for Tagged {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(SaveVaultError::Cryptographic("bad padding".into()).into_io())
            }
        }

        let mut reader = TagErrors::new(Tagged, |e| SaveVaultError::Decompression(e.to_string()));
        let err = reader.read(&mut [0u8; 4]).unwrap_err();
        assert!(matches!(
            SaveVaultError::from_io(err),
            SaveVaultError::Cryptographic(_)
        ));
    }

    #[test]
    fn closing_a_borrowed_vec_keeps_its_bytes() {
        let mut buf = Vec::new();
        {
            let mut sink: BoxSink<'_> = Box::new(&mut buf);
            sink.write_all(b"abc").unwrap();
            sink.close().unwrap();
        }
        assert_eq!(buf, b"abc");
    }
}
