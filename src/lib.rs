//! PngBin: a codec that stores arbitrary binary payloads as the pixel data
//! of fixed-layout PNG files, optionally AES-256-CBC encrypted and chained
//! across multiple PNG slots for random-access reads larger than one image.
//!
//! Three layers, each usable on its own:
//! - [`png`]: the PNG envelope itself — [`png::PngWriter`]/[`png::PngReader`].
//! - [`crypto`]: AES-256-CBC streaming on top of a PNG slot —
//!   [`crypto::EncryptWriter`]/[`crypto::DecryptReader`].
//! - [`chain`]: multi-slot chaining — [`chain::ChainWriter`]/[`chain::ChainReader`].
//!
//! [`range`] supplies the HTTP range-fetcher contract a [`chain::ChainReader`]
//! needs when its slots live behind a plain image host instead of local disk.

pub mod chain;
pub mod crypto;
pub mod descriptor;
pub mod error;
pub mod png;
pub mod range;

pub use descriptor::{DescriptorSource, PngSlot};
pub use error::{PngBinError, Result};
