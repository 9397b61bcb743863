//! Multi-PNG chaining: treats a sequence of PNG slots as one logical
//! append-only (write) or random-access (read) byte stream. Works uniformly
//! over plain [`crate::png::PngWriter`]/[`crate::png::PngReader`] or their
//! AES-256-CBC-wrapped counterparts via the [`PngSlotWriter`]/
//! [`PngSlotReader`] traits below, so encryption composes by choosing which
//! concrete type the caller's factory closure returns.

use std::io::{Read, Seek, Write};

use crate::crypto::{DecryptReader, EncryptWriter};
use crate::error::Result;
use crate::png::{PngReader, PngWriter};

pub mod reader;
pub mod writer;

pub use reader::ChainReader;
pub use writer::ChainWriter;

/// A single PNG slot's write side: accepts payload bytes up to its capacity
/// and, once full, is closed out in exchange for its underlying sink.
pub trait PngSlotWriter: Sized {
    type Sink;

    fn remaining(&self) -> u64;
    fn write_payload(&mut self, buf: &[u8]) -> Result<()>;
    fn finish(self) -> Result<Self::Sink>;

    /// `Some((key, iv))` for an encrypted slot writer, so the chain layer can
    /// hand generated crypto material back to the caller via
    /// `ChainWriter`'s `on_writer_created` callback. `None` for plain slots.
    fn crypto_material(&self) -> Option<([u8; 32], [u8; 16])> {
        None
    }
}

impl<W: Write> PngSlotWriter for PngWriter<W> {
    type Sink = W;

    fn remaining(&self) -> u64 {
        PngWriter::remaining(self)
    }

    fn write_payload(&mut self, buf: &[u8]) -> Result<()> {
        PngWriter::write_payload(self, buf)
    }

    fn finish(self) -> Result<W> {
        PngWriter::finish(self)
    }
}

impl<W: Write> PngSlotWriter for EncryptWriter<W> {
    type Sink = W;

    fn remaining(&self) -> u64 {
        EncryptWriter::remaining(self)
    }

    fn write_payload(&mut self, buf: &[u8]) -> Result<()> {
        EncryptWriter::write(self, buf)
    }

    fn finish(self) -> Result<W> {
        EncryptWriter::finish(self)
    }

    fn crypto_material(&self) -> Option<([u8; 32], [u8; 16])> {
        Some((*self.key(), *self.iv()))
    }
}

/// A single PNG slot's read side: answers payload reads at a local,
/// per-slot data-offset.
pub trait PngSlotReader {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;
}

impl<R: Read + Seek> PngSlotReader for PngReader<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        PngReader::read_at(self, offset, buf)
    }
}

impl<R: Read + Seek> PngSlotReader for DecryptReader<R> {
    /// `offset` here is in the chain's post-IV logical coordinate space (0 =
    /// first plaintext byte after the stored IV), matching the reduced
    /// per-slot capacity `ChainReader::with_slot_capacity` is configured
    /// with for encrypted chains. Shift it back by the 16-byte IV region
    /// before handing it to `DecryptReader::read_range`, which addresses the
    /// slot's full data-offset space and requires `offset >= 16`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let data = self.read_range(offset + crate::crypto::BLOCK_LEN as u64, buf.len())?;
        buf.copy_from_slice(&data);
        Ok(())
    }
}
