//! `DecryptReader`: serves decrypted byte ranges out of an AES-256-CBC
//! encrypted PNG payload without decrypting the whole slot, by recovering
//! the IV for any requested range from the ciphertext block immediately
//! preceding it — a standard property of CBC mode.

use std::io::{Read, Seek};

use aes::Aes256;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use log::debug;

use crate::error::{PngBinError, Result};
use crate::png::PngReader;
use crate::png::layout;

use super::{BLOCK_LEN, KEY_LEN};

type Decryptor = cbc::Decryptor<Aes256>;

/// Wraps a [`PngReader`] and a key; `read_range` returns plaintext for any
/// `[offset, offset+len)` window of the logical payload, `offset` measured
/// in the same data-offset coordinate space `PngReader` uses.
///
/// The first 16 bytes of the slot (`[0, 16)`) are the literal IV, not
/// plaintext data — `read_range` requires `offset >= 16`, matching the
/// writer's layout where ciphertext starts immediately after the IV.
pub struct DecryptReader<R> {
    inner: PngReader<R>,
    key: [u8; KEY_LEN],
}

impl<R: Read + Seek> DecryptReader<R> {
    pub fn new(inner: PngReader<R>, key: [u8; KEY_LEN]) -> Self {
        Self { inner, key }
    }

    pub fn capacity(&self) -> u64 {
        self.inner.capacity()
    }

    /// Decrypts and returns `len` plaintext bytes starting at `offset`.
    ///
    /// Recovers the IV for the first touched block from the 16 ciphertext
    /// bytes immediately before it (the stored IV itself, when `offset`
    /// lands in the first data block), decrypts every whole AES block the
    /// range touches, and slices out exactly the requested bytes.
    pub fn read_range(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if offset < BLOCK_LEN as u64 {
            return Err(PngBinError::invalid_argument(
                "offset must be at or past the first data block (>=16)",
            ));
        }
        if offset + len as u64 > self.capacity() {
            return Err(PngBinError::invalid_argument(
                "read past end of decrypted payload",
            ));
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let rem = offset % BLOCK_LEN as u64;
        let block_start = offset - rem;
        let inner_offset = block_start - BLOCK_LEN as u64;
        let blocks_needed = layout::ceil_div(rem + len as u64, BLOCK_LEN as u64);
        let inner_len = BLOCK_LEN as u64 + blocks_needed * BLOCK_LEN as u64;

        debug!(
            "DecryptReader::read_range offset={offset} len={len} inner_offset={inner_offset} inner_len={inner_len}"
        );

        let mut ciphertext = vec![0u8; inner_len as usize];
        self.inner.read_at(inner_offset, &mut ciphertext)?;

        let iv = &ciphertext[..BLOCK_LEN];
        let mut decryptor = Decryptor::new(
            GenericArray::from_slice(&self.key),
            GenericArray::from_slice(iv),
        );

        let mut plaintext = ciphertext[BLOCK_LEN..].to_vec();
        for block in plaintext.chunks_exact_mut(BLOCK_LEN) {
            decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        let start = rem as usize;
        Ok(plaintext[start..start + len].to_vec())
    }
}
