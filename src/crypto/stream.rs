//! Streaming AES-256 encryption and decryption.
//!
//! `EncryptWriter` encrypts every complete 16-byte block as soon as it
//! has been written and pads the tail into one last block on `close`.
//! `DecryptReader` decrypts as it reads but always holds back the most
//! recent block: only once the source is exhausted do we know which block
//! is final, check its padding and strip it.
//!
//! There is no authentication tag.  A wrong key usually shows up as bad
//! padding here or as a corrupt stream in a later stage, but nothing
//! guarantees it.

use std::io::{self, Read, Write};

use aes::Aes256;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};

use super::context::{Block, CipherMode, EncryptionContext, PaddingScheme};
use crate::errors::{Result, SaveVaultError};
use crate::pipeline::stage::{BoxSink, BoxSource, ByteStage, Sink};

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// How much ciphertext `DecryptReader` pulls from its source at a time.
const READ_CHUNK: usize = 8 * 1024;

enum Encryptor {
    Cbc(cbc::Encryptor<Aes256>),
    Ecb(ecb::Encryptor<Aes256>),
}

impl Encryptor {
    fn new(context: &EncryptionContext) -> Result<Self> {
        let cipher = match context.mode() {
            CipherMode::Cbc => {
                cbc::Encryptor::<Aes256>::new_from_slices(context.key(), context.iv()).map(Encryptor::Cbc)
            }
            CipherMode::Ecb => {
                ecb::Encryptor::<Aes256>::new_from_slice(context.key()).map(Encryptor::Ecb)
            }
        };
        cipher
            .map_err(|e| SaveVaultError::Cryptographic(format!("invalid key or iv length: {e}")))
    }

    fn encrypt(&mut self, block: &mut Block) {
        match self {
            Encryptor::Cbc(c) => c.encrypt_block_mut(block),
            Encryptor::Ecb(c) => c.encrypt_block_mut(block),
        }
    }
}

enum Decryptor {
    Cbc(cbc::Decryptor<Aes256>),
    Ecb(ecb::Decryptor<Aes256>),
}

impl Decryptor {
    fn new(context: &EncryptionContext) -> Result<Self> {
        let cipher = match context.mode() {
            CipherMode::Cbc => {
                cbc::Decryptor::<Aes256>::new_from_slices(context.key(), context.iv()).map(Decryptor::Cbc)
            }
            CipherMode::Ecb => {
                ecb::Decryptor::<Aes256>::new_from_slice(context.key()).map(Decryptor::Ecb)
            }
        };
        cipher
            .map_err(|e| SaveVaultError::Cryptographic(format!("invalid key or iv length: {e}")))
    }

    fn decrypt(&mut self, block: &mut Block) {
        match self {
            Decryptor::Cbc(c) => c.decrypt_block_mut(block),
            Decryptor::Ecb(c) => c.decrypt_block_mut(block),
        }
    }
}

/// Sink that encrypts everything written to it.
pub struct EncryptWriter<'a> {
    inner: BoxSink<'a>,
    cipher: Encryptor,
    padding: PaddingScheme,
    /// Plaintext not yet forming a whole block.
    pending: Vec<u8>,
    /// Scratch space for ciphertext on its way to `inner`.
    out: Vec<u8>,
}

impl<'a> EncryptWriter<'a> {
    pub fn new(inner: BoxSink<'a>, context: &EncryptionContext) -> Result<Self> {
        Ok(Self {
            inner,
            cipher: Encryptor::new(context)?,
            padding: context.padding(),
            pending: Vec::with_capacity(BLOCK_LEN),
            out: Vec::new(),
        })
    }
}

impl Write for EncryptWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        let whole = self.pending.len() - self.pending.len() % BLOCK_LEN;
        if whole == 0 {
            return Ok(buf.len());
        }

        self.out.clear();
        for chunk in self.pending[..whole].chunks_exact(BLOCK_LEN) {
            let mut block = Block::clone_from_slice(chunk);
            self.cipher.encrypt(&mut block);
            self.out.extend_from_slice(&block);
        }
        self.pending.drain(..whole);

        self.inner.write_all(&self.out)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Sink for EncryptWriter<'_> {
    fn close(self: Box<Self>) -> Result<()> {
        let mut this = *self;

        // Always emit a final block, even for block-aligned input, so the
        // reader can tell where the data ends.
        let mut block = Block::default();
        block[..this.pending.len()].copy_from_slice(&this.pending);
        this.padding.pad(&mut block, this.pending.len());
        this.cipher.encrypt(&mut block);
        this.pending.clear();

        this.inner.write_all(&block)?;
        this.inner.close()
    }
}

/// Reader that decrypts a ciphertext source and strips its padding.
pub struct DecryptReader<'a> {
    inner: BoxSource<'a>,
    cipher: Decryptor,
    padding: PaddingScheme,
    /// Ciphertext not yet forming a whole block.
    pending: Vec<u8>,
    /// Last decrypted block, withheld until we know whether it is final.
    held: Option<Block>,
    /// Plaintext ready to hand out.
    out: Vec<u8>,
    out_pos: usize,
    done: bool,
}

impl<'a> DecryptReader<'a> {
    pub fn new(inner: BoxSource<'a>, context: &EncryptionContext) -> Result<Self> {
        Ok(Self {
            inner,
            cipher: Decryptor::new(context)?,
            padding: context.padding(),
            pending: Vec::with_capacity(READ_CHUNK + BLOCK_LEN),
            held: None,
            out: Vec::with_capacity(READ_CHUNK),
            out_pos: 0,
            done: false,
        })
    }

    /// Refill `out` until it has data or the stream is finished.
    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        while self.out_pos == self.out.len() && !self.done {
            self.out.clear();
            self.out_pos = 0;

            let n = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                return self.finish();
            }

            self.pending.extend_from_slice(&chunk[..n]);
            let whole = self.pending.len() - self.pending.len() % BLOCK_LEN;
            for ct in self.pending[..whole].chunks_exact(BLOCK_LEN) {
                let mut block = Block::clone_from_slice(ct);
                self.cipher.decrypt(&mut block);
                if let Some(previous) = self.held.replace(block) {
                    self.out.extend_from_slice(&previous);
                }
            }
            self.pending.drain(..whole);
        }
        Ok(())
    }

    /// The source is exhausted: validate and strip the final block.
    fn finish(&mut self) -> io::Result<()> {
        self.done = true;

        if !self.pending.is_empty() {
            return Err(SaveVaultError::Cryptographic(format!(
                "ciphertext length is not a multiple of {BLOCK_LEN} bytes"
            ))
            .into_io());
        }

        let last = self.held.take().ok_or_else(|| {
            SaveVaultError::Cryptographic("ciphertext is empty".into()).into_io()
        })?;
        let data = self.padding.unpad(&last).map_err(|_| {
            SaveVaultError::Cryptographic("invalid padding: wrong key or corrupted data".into())
                .into_io()
        })?;
        self.out.extend_from_slice(data);
        Ok(())
    }
}

impl Read for DecryptReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.fill()?;

        let available = &self.out[self.out_pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.out_pos += n;
        Ok(n)
    }
}

/// The cipher as a pluggable chain stage.
pub struct CipherStage {
    context: EncryptionContext,
}

impl CipherStage {
    pub fn new(context: EncryptionContext) -> Self {
        Self { context }
    }
}

impl ByteStage for CipherStage {
    fn name(&self) -> &'static str {
        match self.context.mode() {
            CipherMode::Cbc => "aes-256-cbc",
            CipherMode::Ecb => "aes-256-ecb",
        }
    }

    fn wrap_sink<'a>(&self, inner: BoxSink<'a>) -> Result<BoxSink<'a>> {
        Ok(Box::new(EncryptWriter::new(inner, &self.context)?))
    }

    fn wrap_source<'a>(&self, inner: BoxSource<'a>) -> Result<BoxSource<'a>> {
        Ok(Box::new(DecryptReader::new(inner, &self.context)?))
    }
}
