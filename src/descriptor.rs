//! The PNG slot descriptor and the pull-based iterator contract the chain
//! layer consumes. The original Python chain classes took a generator
//! (`Iterator[PngSlot]`); Rust has no bare coroutines for this, so the
//! contract here is just `Iterator<Item = PngSlot>` plus a caller-supplied
//! factory closure — the same "pull iterator, not coroutine" translation
//! `spec.md` calls for.

/// One PNG slot's shape and identity within a chain: how many payload bytes
/// it holds and the `(width, height)` it was (or will be) built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngSlot {
    pub width: u32,
    pub height: u32,
}

impl PngSlot {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn capacity(&self) -> u64 {
        crate::png::layout::capacity(self.width, self.height)
    }
}

/// A caller-supplied factory for the descriptor sequence a `ChainWriter` or
/// `ChainReader` walks. Boxed so callers can close over whatever catalog or
/// counter state they like without the chain layer needing to know its type.
pub type DescriptorSource = Box<dyn Iterator<Item = PngSlot>>;
