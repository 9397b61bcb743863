use log::{error, info};

use crate::descriptor::PngSlot;
use crate::error::{PngBinError, Result};

use super::PngSlotWriter;

/// No-op default for `on_created` when the caller doesn't need to observe
/// generated crypto material (plain, unencrypted chains).
fn ignore_created(_index: usize, _material: Option<([u8; 32], [u8; 16])>) {}

/// Writes a logical byte stream across a sequence of PNG slots, opening each
/// slot lazily from a caller-supplied factory as the previous one fills.
///
/// The descriptor iterator and the factory are pull-based, mirroring the
/// generator the original Python `ChainWriter` consumed: nothing downstream
/// of the next slot is touched until the current one is full.
pub struct ChainWriter<S, D, F, C = fn(usize, Option<([u8; 32], [u8; 16])>)>
where
    S: PngSlotWriter,
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
    C: FnMut(usize, Option<([u8; 32], [u8; 16])>),
{
    descriptors: D,
    open_slot: F,
    on_created: C,
    current: Option<S>,
    slot_index: usize,
}

impl<S, D, F> ChainWriter<S, D, F, fn(usize, Option<([u8; 32], [u8; 16])>)>
where
    S: PngSlotWriter,
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
{
    /// Opens the first slot from `descriptors` via `open_slot` and returns a
    /// writer ready for `write()`. Equivalent to
    /// [`ChainWriter::with_on_created`] with a no-op callback, for callers
    /// that don't need to record per-slot `key`/`iv`.
    pub fn new(descriptors: D, open_slot: F) -> Result<Self> {
        Self::with_on_created(descriptors, open_slot, ignore_created)
    }
}

impl<S, D, F, C> ChainWriter<S, D, F, C>
where
    S: PngSlotWriter,
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
    C: FnMut(usize, Option<([u8; 32], [u8; 16])>),
{
    /// Like [`ChainWriter::new`], but `on_created(slot_index, crypto_material)`
    /// fires every time a new slot writer is constructed — the hook
    /// `spec.md` §4.5 calls for so a caller can persist the `key`/`iv` an
    /// [`crate::crypto::EncryptWriter`] generates for each slot before the
    /// chain moves on to the next one.
    pub fn with_on_created(mut descriptors: D, mut open_slot: F, mut on_created: C) -> Result<Self> {
        let first = descriptors.next().ok_or_else(|| {
            error!("ChainWriter::with_on_created: descriptor iterator exhausted before first slot");
            PngBinError::EndOfStream
        })?;
        info!("ChainWriter opening slot 0 ({}x{})", first.width, first.height);
        let current = open_slot(0, first)?;
        on_created(0, current.crypto_material());
        Ok(Self {
            descriptors,
            open_slot,
            on_created,
            current: Some(current),
            slot_index: 1,
        })
    }

    fn advance_slot(&mut self) -> Result<()> {
        let slot = self.descriptors.next().ok_or_else(|| {
            error!(
                "ChainWriter::advance_slot: descriptor iterator exhausted after slot {}",
                self.slot_index - 1
            );
            PngBinError::EndOfStream
        })?;
        info!(
            "ChainWriter advancing to slot {} ({}x{})",
            self.slot_index, slot.width, slot.height
        );
        let writer = (self.open_slot)(self.slot_index, slot)?;
        (self.on_created)(self.slot_index, writer.crypto_material());
        self.current = Some(writer);
        self.slot_index += 1;
        Ok(())
    }

    /// Writes `buf` across as many slots as needed, opening new ones from
    /// the descriptor source as each fills. Returns [`PngBinError::EndOfStream`]
    /// if the descriptor source runs out before `buf` is fully written.
    pub fn write(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            if self.current.as_ref().map(|c| c.remaining()) == Some(0) {
                let finished = self.current.take().unwrap();
                finished.finish()?;
                self.advance_slot()?;
            }
            let current = self.current.as_mut().expect("slot opened above");
            let step = (buf.len() as u64).min(current.remaining()) as usize;
            current.write_payload(&buf[..step])?;
            buf = &buf[step..];
        }
        Ok(())
    }

    /// Closes out the currently open slot. Any slots named by the
    /// descriptor source but never written to are left untouched.
    pub fn finish(mut self) -> Result<()> {
        if let Some(current) = self.current.take() {
            current.finish()?;
        }
        Ok(())
    }

    /// Releases the currently open slot writer without finalizing it —
    /// abandons the chain early (e.g. after an upstream error) without
    /// padding the last slot out to capacity. Prefer [`ChainWriter::finish`]
    /// when the chain completed normally; this is the `close()` half of the
    /// "`finish()` flushes, `close()` releases" resource-lifecycle split.
    pub fn close(mut self) {
        if self.current.take().is_some() {
            info!("ChainWriter::close releasing slot {} without finalizing", self.slot_index - 1);
        }
    }
}
