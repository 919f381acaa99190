//! Composition of an encoding and a list of byte stages.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::compression::Gzip;
use super::encoding::{Encoding, Json};
use super::stage::{self, BoxSink, BoxSource, ByteStage};
use crate::config::Settings;
use crate::crypto::context::EncryptionContext;
use crate::crypto::stream::CipherStage;
use crate::errors::{Result, SaveVaultError};

/// An encoding followed by byte stages, listed in write order.
///
/// On write the value is encoded into the first stage, whose output feeds
/// the second, and so on down to the sink.  On read the same stages are
/// stacked over the source, so the last stage undoes its work first.
pub struct Pipeline<E = Json> {
    encoding: E,
    stages: Vec<Box<dyn ByteStage>>,
}

impl Pipeline<Json> {
    /// JSON, then gzip, then AES with `context`.
    pub fn standard(context: EncryptionContext) -> Self {
        Self::new(Json)
            .stage(Gzip::default())
            .stage(CipherStage::new(context))
    }

    /// The standard chain with mode, padding, profile and compression
    /// level taken from `settings`.
    pub fn from_settings(settings: &Settings, password: &[u8], salt: &[u8]) -> Result<Self> {
        let context = EncryptionContext::derive(password, salt, settings.profile)?
            .with_mode(settings.cipher_mode)
            .with_padding(settings.padding);

        Ok(Self::new(Json)
            .stage(Gzip::new(settings.compression()?))
            .stage(CipherStage::new(context)))
    }
}

impl<E: Encoding> Pipeline<E> {
    /// A pipeline with no byte stages: the encoding goes straight to the sink.
    pub fn new(encoding: E) -> Self {
        Self {
            encoding,
            stages: Vec::new(),
        }
    }

    /// Append a stage; it runs after every stage added before it on write.
    pub fn stage(mut self, stage: impl ByteStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the byte stages in write order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Encode `value` through every stage into `sink`, then close the chain.
    pub fn write_to<'a, T>(&self, value: &T, sink: BoxSink<'a>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let mut chain = sink;
        for stage in self.stages.iter().rev() {
            chain = stage.wrap_sink(chain)?;
        }
        tracing::trace!(stages = ?self.stage_names(), "write chain assembled");

        self.encoding.encode_stream(value, &mut chain)?;
        chain.close()
    }

    /// Undo every stage over `source` and decode the result.
    pub fn read_from<'a, T>(&self, source: impl Read + 'a) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut chain: BoxSource<'a> = stage::source(source);
        for stage in self.stages.iter().rev() {
            chain = stage.wrap_source(chain)?;
        }
        tracing::trace!(stages = ?self.stage_names(), "read chain assembled");

        self.encoding.decode_stream(&mut chain)
    }

    /// Run the write chain into memory.
    pub fn to_bytes<T>(&self, value: &T) -> Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let mut out = Vec::new();
        self.write_to(value, Box::new(&mut out))?;
        Ok(out)
    }

    /// Run the read chain over an in-memory buffer.
    pub fn from_bytes<T>(&self, bytes: &[u8]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.read_from(bytes)
    }

    /// Raw bytes through the byte stages only, skipping the encoding.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut chain: BoxSink<'_> = Box::new(&mut out);
            for stage in self.stages.iter().rev() {
                chain = stage.wrap_sink(chain)?;
            }
            chain
                .write_all(plaintext)
                .map_err(SaveVaultError::from_io)?;
            chain.close()?;
        }
        Ok(out)
    }

    /// Inverse of [`Pipeline::seal`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let mut chain: BoxSource<'_> = stage::source(sealed);
        for stage in self.stages.iter().rev() {
            chain = stage.wrap_source(chain)?;
        }
        let mut plaintext = Vec::new();
        chain
            .read_to_end(&mut plaintext)
            .map_err(SaveVaultError::from_io)?;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::context::CipherMode;

    fn context() -> EncryptionContext {
        EncryptionContext::new([0x11; 32], [0x22; 16])
    }

    #[test]
    fn standard_chain_is_gzip_then_cipher() {
        assert_eq!(
            Pipeline::standard(context()).stage_names(),
            vec!["gzip", "aes-256-cbc"]
        );
    }

    #[test]
    fn in_memory_roundtrip() {
        let pipeline = Pipeline::standard(context());
        let bytes = pipeline.to_bytes(&vec![1.5f64, -2.25, 1e-300]).unwrap();
        assert_eq!(bytes.len() % 16, 0);

        let back: Option<Vec<f64>> = pipeline.from_bytes(&bytes).unwrap();
        assert_eq!(back, Some(vec![1.5, -2.25, 1e-300]));
    }

    #[test]
    fn encoding_only_pipeline_writes_plain_json() {
        let pipeline = Pipeline::new(Json);
        assert_eq!(pipeline.to_bytes(&[1, 2, 3]).unwrap(), b"[1,2,3]");
    }

    #[test]
    fn seal_and_open_cover_raw_bytes() {
        let pipeline = Pipeline::standard(context().with_mode(CipherMode::Ecb));
        let sealed = pipeline.seal(b"").unwrap();
        assert_eq!(pipeline.open(&sealed).unwrap(), b"");

        let sealed = pipeline.seal(b"raw bytes").unwrap();
        assert_eq!(pipeline.open(&sealed).unwrap(), b"raw bytes");
    }

    #[test]
    fn empty_body_reads_back_as_absent() {
        // Byte stages only: an empty plaintext still yields a valid stream.
        let pipeline = Pipeline::standard(context());
        let sealed = pipeline.seal(b"").unwrap();
        let value: Option<String> = pipeline.from_bytes(&sealed).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn stages_undo_in_reverse_order() {
        // Swapping stage order on read must not decode.
        let writer = Pipeline::new(Json)
            .stage(Gzip::default())
            .stage(CipherStage::new(context()));
        let reader = Pipeline::new(Json)
            .stage(CipherStage::new(context()))
            .stage(Gzip::default());

        let bytes = writer.to_bytes("payload").unwrap();
        assert!(reader.from_bytes::<String>(&bytes).is_err());
    }
}
