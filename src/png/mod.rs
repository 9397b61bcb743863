//! Fixed-layout PNG envelope codec: turns arbitrary payload bytes into the
//! pixel data of a single-IDAT PNG and back.

pub mod layout;
pub mod reader;
pub mod writer;

pub use reader::{PngReader, Source};
pub use writer::PngWriter;
