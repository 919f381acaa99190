//! Gzip compression stage.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::stage::{BoxSink, BoxSource, ByteStage, Sink, TagErrors};
use crate::errors::{Result, SaveVaultError};

/// Gzip with a configurable level (default 6).
#[derive(Debug, Clone, Copy, Default)]
pub struct Gzip {
    level: Compression,
}

impl Gzip {
    pub fn new(level: Compression) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Compression {
        self.level
    }
}

struct GzipSink<'a> {
    encoder: GzEncoder<BoxSink<'a>>,
}

impl Write for GzipSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encoder.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

impl Sink for GzipSink<'_> {
    fn close(self: Box<Self>) -> Result<()> {
        let inner = self.encoder.finish()?;
        inner.close()
    }
}

struct GzipSource<'a> {
    decoder: TagErrors<GzDecoder<BoxSource<'a>>>,
    drained: bool,
}

impl<'a> GzipSource<'a> {
    fn new(inner: BoxSource<'a>) -> Self {
        Self {
            decoder: TagErrors::new(GzDecoder::new(inner), decompression_error),
            drained: false,
        }
    }
}

fn decompression_error(err: io::Error) -> SaveVaultError {
    SaveVaultError::Decompression(err.to_string())
}

impl Read for GzipSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.decoder.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.drained {
            // The gzip member is complete; pull the rest of the stream so
            // the layers beneath still run their end-of-stream checks.
            self.drained = true;
            io::copy(self.decoder.inner_mut().get_mut(), &mut io::sink())?;
        }
        Ok(n)
    }
}

impl ByteStage for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn wrap_sink<'a>(&self, inner: BoxSink<'a>) -> Result<BoxSink<'a>> {
        tracing::trace!(level = self.level().level(), "gzip sink");
        Ok(Box::new(GzipSink {
            encoder: GzEncoder::new(inner, self.level()),
        }))
    }

    fn wrap_source<'a>(&self, inner: BoxSource<'a>) -> Result<BoxSource<'a>> {
        Ok(Box::new(GzipSource::new(inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::source;

    fn compress(gzip: &Gzip, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut sink = gzip.wrap_sink(Box::new(&mut out)).unwrap();
        sink.write_all(data).unwrap();
        sink.close().unwrap();
        out
    }

    fn decompress(gzip: &Gzip, data: &[u8]) -> Result<Vec<u8>> {
        let mut reader = gzip.wrap_source(source(data))?;
        let mut out = Vec::new();
        reader
            .read_to_end(&mut out)
            .map_err(SaveVaultError::from_io)?;
        Ok(out)
    }

    #[test]
    fn default_level_is_six() {
        assert_eq!(Gzip::default().level(), Compression::new(6));
        assert_eq!(Gzip::new(Compression::fast()).level().level(), 1);
    }

    #[test]
    fn level_changes_output_not_content() {
        let data = "the quick brown fox ".repeat(500).into_bytes();
        let fast = Gzip::new(Compression::fast());
        let best = Gzip::new(Compression::best());

        let fast_out = compress(&fast, &data);
        let best_out = compress(&best, &data);
        assert!(best_out.len() <= fast_out.len());
        assert_eq!(decompress(&fast, &best_out).unwrap(), data);
    }

    #[test]
    fn output_starts_with_gzip_magic() {
        let out = compress(&Gzip::default(), b"hello");
        assert_eq!(&out[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn roundtrip_repetitive_data_shrinks() {
        let data = "abcdefgh".repeat(1_000).into_bytes();
        let gzip = Gzip::new(Compression::best());
        let packed = compress(&gzip, &data);
        assert!(packed.len() < data.len() / 10);
        assert_eq!(decompress(&gzip, &packed).unwrap(), data);
    }

    #[test]
    fn garbage_is_a_decompression_error() {
        let err = decompress(&Gzip::default(), b"definitely not gzip").unwrap_err();
        assert!(matches!(err, SaveVaultError::Decompression(_)));
    }

    #[test]
    fn truncated_stream_is_a_decompression_error() {
        let packed = compress(&Gzip::default(), &[42u8; 4096]);
        let err = decompress(&Gzip::default(), &packed[..packed.len() - 6]).unwrap_err();
        assert!(matches!(err, SaveVaultError::Decompression(_)));
    }
}
