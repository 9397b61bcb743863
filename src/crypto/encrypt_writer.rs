//! `EncryptWriter<W>`: encrypts a plaintext payload with AES-256-CBC as it's
//! written, storing the IV as the first 16 plaintext bytes of the PNG slot
//! so [`super::decrypt_reader::DecryptReader`] can recover it mid-stream
//! from any preceding ciphertext block.

use aes::Aes256;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use log::debug;
use rand::RngCore;

use crate::error::{PngBinError, Result};
use crate::png::PngWriter;

use super::{BLOCK_LEN, KEY_LEN};

type Encryptor = cbc::Encryptor<Aes256>;

/// Wraps a [`PngWriter`], encrypting plaintext given to [`EncryptWriter::write`]
/// before it reaches the PNG payload. The first 16 bytes of the slot are the
/// IV itself, stored unencrypted — the anchor every `DecryptReader` IV
/// recovery walks back to.
pub struct EncryptWriter<W: std::io::Write> {
    inner: PngWriter<W>,
    encryptor: Option<Encryptor>,
    key: [u8; KEY_LEN],
    iv: [u8; BLOCK_LEN],
    /// Buffered plaintext shorter than one AES block, held until a full
    /// block (or `finish`) arrives.
    pending: Vec<u8>,
    finished: bool,
}

impl<W: std::io::Write> EncryptWriter<W> {
    /// Generates a random key and IV, writes the IV as the first 16 payload
    /// bytes unencrypted, and returns a writer ready to encrypt everything
    /// after. `key()`/`iv()` expose the generated material so the caller can
    /// persist it — this is the only place either is ever generated, never
    /// discarded silently.
    pub fn generate(inner: PngWriter<W>) -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(inner, key)
    }

    /// Generates a random IV for the given `key`, writes it as the first 16
    /// payload bytes unencrypted, and returns a writer ready to encrypt
    /// everything after.
    pub fn new(inner: PngWriter<W>, key: [u8; KEY_LEN]) -> Result<Self> {
        let mut iv = [0u8; BLOCK_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        Self::with_iv(inner, key, iv)
    }

    /// Same as [`EncryptWriter::new`] but with a caller-supplied IV, for
    /// reproducible tests and callers that manage their own IV generation.
    pub fn with_iv(mut inner: PngWriter<W>, key: [u8; KEY_LEN], iv: [u8; BLOCK_LEN]) -> Result<Self> {
        if inner.position() != 0 {
            return Err(PngBinError::invalid_argument(
                "EncryptWriter requires a freshly-opened PngWriter",
            ));
        }
        debug!("EncryptWriter::with_iv capacity={}", inner.remaining());
        inner.write_payload(&iv)?;
        let encryptor = Encryptor::new(
            GenericArray::from_slice(&key),
            GenericArray::from_slice(&iv),
        );
        Ok(Self {
            inner,
            encryptor: Some(encryptor),
            key,
            iv,
            pending: Vec::with_capacity(BLOCK_LEN),
            finished: false,
        })
    }

    /// The 256-bit key this writer encrypts under, whether caller-supplied
    /// or generated by [`EncryptWriter::new`]/[`EncryptWriter::generate`].
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// The 128-bit IV stored as the first 16 plaintext bytes of the slot.
    pub fn iv(&self) -> &[u8; BLOCK_LEN] {
        &self.iv
    }

    pub fn remaining(&self) -> u64 {
        self.inner.remaining()
    }

    /// Encrypts and writes `buf`. Plaintext shorter than one AES block is
    /// buffered until enough arrives to fill a block.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if self.finished {
            return Err(PngBinError::AlreadyFinished);
        }
        self.pending.extend_from_slice(buf);
        let whole_blocks = self.pending.len() / BLOCK_LEN;
        if whole_blocks == 0 {
            return Ok(());
        }
        let split_at = whole_blocks * BLOCK_LEN;
        let mut ciphertext = std::mem::take(&mut self.pending);
        self.pending = ciphertext.split_off(split_at);
        self.encrypt_in_place(&mut ciphertext)?;
        self.inner.write_payload(&ciphertext)
    }

    fn encrypt_in_place(&mut self, blocks: &mut [u8]) -> Result<()> {
        let encryptor = self
            .encryptor
            .as_mut()
            .ok_or(PngBinError::AlreadyFinished)?;
        for block in blocks.chunks_exact_mut(BLOCK_LEN) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }

    /// Zero-pads any buffered partial block, encrypts and writes it, then
    /// finishes the underlying [`PngWriter`] (which zero-fills the rest of
    /// the slot's capacity). Consumes `self`.
    pub fn finish(mut self) -> Result<W> {
        if self.finished {
            return Err(PngBinError::AlreadyFinished);
        }
        if !self.pending.is_empty() {
            let mut block = self.pending.clone();
            block.resize(BLOCK_LEN, 0);
            self.encrypt_in_place(&mut block)?;
            self.inner.write_payload(&block)?;
            self.pending.clear();
        }
        self.finished = true;
        self.inner.finish()
    }
}
