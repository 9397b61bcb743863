use log::{debug, error};

use crate::descriptor::PngSlot;
use crate::error::{PngBinError, Result};

use super::PngSlotReader;

/// `PngSlot::capacity()` as-is — the default per-slot logical capacity for
/// plain (unencrypted) chains.
fn raw_capacity(slot: PngSlot) -> u64 {
    slot.capacity()
}

/// Serves random-access reads over a logical byte stream spread across a
/// sequence of PNG slots, opening and caching readers from a caller-supplied
/// factory as requested offsets touch new slots.
///
/// Slot boundaries are only known as far as the descriptor iterator has been
/// pulled; a read past the materialized frontier pulls further descriptors
/// on demand, same pull discipline as [`super::ChainWriter`].
///
/// `G` computes each slot's *logical* capacity from its dimensions alone,
/// without opening a reader — needed because an encrypted slot's usable
/// payload is 16 bytes shorter than `PngSlot::capacity()` (the IV occupies
/// the first block), and the chain needs every slot boundary before it can
/// route a random-access read, long before any reader for that slot exists.
/// Defaults to `PngSlot::capacity` for plain chains; encrypted chains should
/// use [`ChainReader::with_slot_capacity`] with `|slot| slot.capacity() - 16`.
pub struct ChainReader<S, D, F, G = fn(PngSlot) -> u64>
where
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
    G: Fn(PngSlot) -> u64,
{
    descriptors: D,
    open_slot: F,
    slot_capacity: G,
    /// `(slot, cumulative_start_offset)` for every descriptor pulled so far.
    slots: Vec<(PngSlot, u64)>,
    total_known: u64,
    exhausted: bool,
    cache: Option<(usize, S)>,
    /// When true (the default), retiring a slot as the chain advances past
    /// it drops its reader immediately. When false, retired readers are
    /// held in `retired` until the caller releases them via
    /// [`ChainReader::close`] — matching `spec.md` §4.6/§5's `auto_close`
    /// flag and its "callers are still responsible for calling `close()`
    /// once" contract.
    auto_close: bool,
    retired: Vec<S>,
}

impl<S, D, F> ChainReader<S, D, F, fn(PngSlot) -> u64>
where
    S: PngSlotReader,
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
{
    /// For plain (unencrypted) chains: each slot's logical capacity is its
    /// full `width*height*4`. Retired slot readers are closed automatically
    /// as the chain advances (`auto_close = true`); see
    /// [`ChainReader::with_auto_close`] to opt out.
    pub fn new(descriptors: D, open_slot: F) -> Self {
        Self::with_slot_capacity(descriptors, open_slot, raw_capacity)
    }
}

impl<S, D, F, G> ChainReader<S, D, F, G>
where
    S: PngSlotReader,
    D: Iterator<Item = PngSlot>,
    F: FnMut(usize, PngSlot) -> Result<S>,
    G: Fn(PngSlot) -> u64,
{
    /// For encrypted chains, pass `slot_capacity = |slot| slot.capacity() - 16`
    /// so chain-level offsets are counted in the same post-IV coordinate
    /// space `DecryptReader` uses (see the `PngSlotReader for DecryptReader`
    /// impl in `super::mod`, which adds the 16-byte IV offset back before
    /// calling `DecryptReader::read_range`).
    pub fn with_slot_capacity(descriptors: D, open_slot: F, slot_capacity: G) -> Self {
        Self::with_auto_close(descriptors, open_slot, slot_capacity, true)
    }

    /// Most general constructor: `auto_close` selects whether a retired
    /// slot's reader is dropped as soon as the chain advances past it
    /// (`true`) or held open in `retired` until [`ChainReader::close`] is
    /// called (`false`), for callers that want to manage the retired
    /// readers' lifetime themselves (e.g. to keep a file descriptor warm
    /// for a subsequent backward seek).
    pub fn with_auto_close(descriptors: D, open_slot: F, slot_capacity: G, auto_close: bool) -> Self {
        Self {
            descriptors,
            open_slot,
            slot_capacity,
            slots: Vec::new(),
            total_known: 0,
            exhausted: false,
            cache: None,
            auto_close,
            retired: Vec::new(),
        }
    }

    /// Pulls descriptors until the materialized frontier reaches at least
    /// `through`, or the descriptor source is exhausted.
    fn ensure_frontier(&mut self, through: u64) -> Result<()> {
        while self.total_known < through && !self.exhausted {
            match self.descriptors.next() {
                Some(slot) => {
                    self.slots.push((slot, self.total_known));
                    self.total_known += (self.slot_capacity)(slot);
                }
                None => self.exhausted = true,
            }
        }
        Ok(())
    }

    fn slot_for(&self, offset: u64) -> Option<usize> {
        self.slots.iter().position(|(slot, start)| {
            offset >= *start && offset < *start + (self.slot_capacity)(*slot)
        })
    }

    fn reader_for(&mut self, index: usize) -> Result<&mut S> {
        if self.cache.as_ref().map(|(i, _)| *i) != Some(index) {
            if let Some((old_index, old_reader)) = self.cache.take() {
                if self.auto_close {
                    debug!("ChainReader closing slot {old_index}");
                    drop(old_reader);
                } else {
                    self.retired.push(old_reader);
                }
            }
            let slot = self.slots[index].0;
            debug!("ChainReader opening slot {index} ({}x{})", slot.width, slot.height);
            let reader = (self.open_slot)(index, slot)?;
            self.cache = Some((index, reader));
        }
        Ok(&mut self.cache.as_mut().unwrap().1)
    }

    /// Releases the currently cached inner reader, and any readers retired
    /// while `auto_close` is `false`. Idempotent. Per `spec.md` §5, callers
    /// must call this once to release the current reader on early exit,
    /// regardless of `auto_close` — that flag only governs closing as the
    /// chain *advances*, not abandonment mid-read.
    pub fn close(&mut self) {
        self.cache.take();
        self.retired.clear();
    }

    /// Reads `buf.len()` bytes starting at logical offset `offset` into the
    /// chained stream, spanning slot boundaries transparently.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut got = 0usize;
        let mut cursor = offset;
        while got < buf.len() {
            self.ensure_frontier(cursor + 1)?;
            let index = self.slot_for(cursor).ok_or_else(|| {
                error!("ChainReader::read_at: read past end of chain at offset {cursor}");
                PngBinError::invalid_argument("read past end of chain")
            })?;
            let (slot, start) = self.slots[index];
            let local_offset = cursor - start;
            let local_room = ((self.slot_capacity)(slot) - local_offset) as usize;
            let step = (buf.len() - got).min(local_room);

            let reader = self.reader_for(index)?;
            reader.read_at(local_offset, &mut buf[got..got + step])?;

            got += step;
            cursor += step as u64;
        }
        Ok(())
    }
}
