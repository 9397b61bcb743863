//! `PngReader`: validates a fixed-layout PNG envelope and answers random-access
//! reads into its payload by translating data-offsets to PNG byte offsets.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, error};

use crate::error::{PngBinError, Result};

use super::layout;

/// Tagged union over the byte sources this reader can pull the PNG bytes
/// from. Rust has no duck-typed file object the way the original Python
/// `Reader` accepted any object with `.read`/`.seek`; a small closed enum
/// over the shapes this crate needs (an in-memory slice, an arbitrary
/// `Read + Seek`, or a one-shot range-fetched stream) does the same job
/// without dynamic dispatch unless the caller actually needs it.
pub enum Source<R = std::fs::File> {
    /// A fully-buffered PNG, e.g. one fetched whole over HTTP.
    Memory(Vec<u8>),
    /// Any seekable reader: a file handle, a cursor, a range-fetched stream.
    Stream(R),
    /// A single-use, forward-only reader over exactly the byte range a
    /// [`crate::range::RangeFetcher`]-style factory returned for
    /// `(p_first, p_last)`. `pos` is the absolute PNG-file offset of the
    /// next unread byte; reads must arrive in ascending, contiguous order —
    /// the same constraint `spec.md` §5 puts on a range-fetching source.
    Ranged { reader: Box<dyn Read>, pos: u64 },
}

impl<R: Read + Seek> Source<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        match self {
            Source::Memory(data) => {
                let start = offset as usize;
                let end = start + buf.len();
                if end > data.len() {
                    return Err(PngBinError::IncompleteRead {
                        expected: buf.len(),
                        got: data.len().saturating_sub(start),
                    });
                }
                buf.copy_from_slice(&data[start..end]);
                Ok(())
            }
            Source::Stream(r) => {
                r.seek(SeekFrom::Start(offset))?;
                r.read_exact(buf)
                    .map_err(|e| PngBinError::from_short_read(e, buf.len(), 0))
            }
            Source::Ranged { reader, pos } => {
                if offset != *pos {
                    return Err(PngBinError::invalid_argument(
                        "ranged PNG source must be read sequentially in ascending order",
                    ));
                }
                reader
                    .read_exact(buf)
                    .map_err(|e| PngBinError::from_short_read(e, buf.len(), 0))?;
                *pos += buf.len() as u64;
                Ok(())
            }
        }
    }

    fn len(&mut self) -> Result<u64> {
        match self {
            Source::Memory(data) => Ok(data.len() as u64),
            Source::Stream(r) => {
                let len = r.seek(SeekFrom::End(0))?;
                Ok(len)
            }
            Source::Ranged { .. } => Err(PngBinError::invalid_argument(
                "a ranged PNG source has no whole-file length",
            )),
        }
    }
}

/// Validates a PNG's structural envelope (signature, IHDR fields, IDAT
/// length) against the fixed layout this crate writes, then serves
/// random-access reads into its payload.
pub struct PngReader<R = std::fs::File> {
    source: Source<R>,
    width: u32,
    height: u32,
}

impl<R: Read + Seek> PngReader<R> {
    /// Parses and validates the signature/IHDR/IDAT-prefix, returning a
    /// reader positioned to serve payload reads. Does not validate every
    /// filter byte and stored-block header eagerly — those are checked as
    /// `read_at` crosses them, same tradeoff the teacher's `blob.rs` header
    /// reader makes (validate the fixed header up front, trust the rest
    /// until touched).
    pub fn open(mut source: Source<R>) -> Result<Self> {
        let mut sig = [0u8; 8];
        source.read_at(0, &mut sig)?;
        if sig != layout::PNG_SIGNATURE {
            error!("PngReader::open: bad PNG signature");
            return Err(PngBinError::invalid_png("bad PNG signature"));
        }

        let mut ihdr_len = [0u8; 4];
        source.read_at(8, &mut ihdr_len)?;
        if u32::from_be_bytes(ihdr_len) != 13 {
            error!("PngReader::open: unexpected IHDR length");
            return Err(PngBinError::invalid_png("unexpected IHDR length"));
        }
        let mut ihdr = [0u8; 4 + 13];
        source.read_at(12, &mut ihdr)?;
        if &ihdr[0..4] != b"IHDR" {
            error!("PngReader::open: missing IHDR chunk");
            return Err(PngBinError::invalid_png("missing IHDR chunk"));
        }
        let width = u32::from_be_bytes(ihdr[4..8].try_into().unwrap());
        let height = u32::from_be_bytes(ihdr[8..12].try_into().unwrap());
        let bit_depth = ihdr[12];
        let color_type = ihdr[13];
        let interlace = ihdr[16];
        if bit_depth != 8 || color_type != 6 || interlace != 0 {
            error!("PngReader::open: expected 8-bit RGBA, non-interlaced PNG, got bit_depth={bit_depth} color_type={color_type} interlace={interlace}");
            return Err(PngBinError::invalid_png(
                "expected 8-bit RGBA, non-interlaced PNG",
            ));
        }
        layout::validate_dimensions(width, height)?;

        let mut idat_len_bytes = [0u8; 4];
        source.read_at(layout::PREFIX_LEN - 8, &mut idat_len_bytes)?;
        let idat_len = u32::from_be_bytes(idat_len_bytes) as u64;
        if idat_len != layout::idat_len(width, height) {
            error!("PngReader::open: IDAT length {idat_len} does not match fixed-layout envelope for {width}x{height}");
            return Err(PngBinError::invalid_png(
                "IDAT length does not match fixed-layout envelope",
            ));
        }
        let mut idat_tag = [0u8; 4];
        source.read_at(layout::PREFIX_LEN - 4, &mut idat_tag)?;
        if &idat_tag != b"IDAT" {
            error!("PngReader::open: missing IDAT chunk");
            return Err(PngBinError::invalid_png("missing IDAT chunk"));
        }
        let mut zlib_header = [0u8; 2];
        source.read_at(layout::PREFIX_LEN, &mut zlib_header)?;
        if zlib_header != layout::ZLIB_HEADER {
            error!("PngReader::open: unexpected zlib header {zlib_header:?}");
            return Err(PngBinError::invalid_png("unexpected zlib header"));
        }

        let expected_len = layout::total_file_len(width, height);
        let actual_len = source.len()?;
        if actual_len != expected_len {
            error!("PngReader::open: file length {actual_len} does not match expected {expected_len}");
            return Err(PngBinError::invalid_png(
                "file length does not match fixed-layout envelope",
            ));
        }

        debug!("PngReader::open width={width} height={height}");
        Ok(Self {
            source,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn capacity(&self) -> u64 {
        layout::capacity(self.width, self.height)
    }

    /// Reads `buf.len()` payload bytes starting at data-offset `d`, walking
    /// the inflated byte stream exactly as it was written: payload bytes are
    /// copied straight through, but whenever the cursor crosses a stored-block
    /// boundary the 5-byte deflate header is read and validated (first byte
    /// in `{0, 1}`, `LEN + NLEN == 0xFFFF`), and whenever it crosses a row
    /// boundary the filter byte is read and validated to be `0x00` — a
    /// corrupted or non-conforming PNG fails `InvalidPng` right where the
    /// malformed byte sits, rather than being silently skipped over.
    pub fn read_at(&mut self, d: u64, buf: &mut [u8]) -> Result<()> {
        if d + buf.len() as u64 > self.capacity() {
            return Err(PngBinError::invalid_argument(
                "read past end of PNG payload",
            ));
        }
        if buf.is_empty() {
            return Ok(());
        }

        let row_len = layout::row_len(self.width);
        let mut p = layout::png_offset(self.width, d);
        let (mut nf, mut nz) = layout::next_counters(self.width, d);
        let mut got = 0usize;

        while got < buf.len() {
            let step = (buf.len() - got).min(nf as usize).min(nz as usize);
            if step > 0 {
                self.source.read_at(p, &mut buf[got..got + step])?;
                got += step;
                p += step as u64;
                nf -= step as u64;
                nz -= step as u64;
            }

            if nz == 0 {
                let mut header = [0u8; 5];
                self.source.read_at(p, &mut header)?;
                let bfinal = header[0];
                let len = u16::from_le_bytes([header[1], header[2]]);
                let nlen = u16::from_le_bytes([header[3], header[4]]);
                if (bfinal != 0 && bfinal != 1) || len.wrapping_add(nlen) != 0xFFFF {
                    error!("PngReader::read_at: malformed stored-block header {header:?} at png-offset {p}");
                    return Err(PngBinError::invalid_png(
                        "malformed deflate stored-block header",
                    ));
                }
                p += 5;
                nf -= 5;
                nz = layout::STORED_BLOCK_MAX;
            }

            if nf == 0 {
                let mut filter = [0u8; 1];
                self.source.read_at(p, &mut filter)?;
                if filter[0] != 0x00 {
                    error!("PngReader::read_at: non-zero row filter byte {} at png-offset {p}", filter[0]);
                    return Err(PngBinError::invalid_png(
                        "row filter byte must be 0x00 (filter type None)",
                    ));
                }
                p += 1;
                nz -= 1;
                nf = row_len;
                if nf >= nz {
                    nf += 5 * layout::ceil_div(nf, layout::STORED_BLOCK_MAX);
                }
            }
        }
        Ok(())
    }
}

impl PngReader<std::fs::File> {
    /// Opens a reader over a range-fetched PNG byte span rather than a whole
    /// file. `width`/`height` come from the caller's descriptor catalog
    /// (there is no local IHDR to read), and `factory(p_first, p_last)` is
    /// called exactly once to materialize the PNG bytes covering data-offset
    /// range `[d_offset, d_offset + length)` — nothing outside that span is
    /// ever requested, which is the whole point of the factory path over
    /// [`PngReader::open`]: a remote caller never downloads the whole image.
    /// `Source::Ranged` never actually holds an `R`, so this is written
    /// against the struct's default `R = std::fs::File` rather than a fresh
    /// generic parameter that inference could never pin down.
    ///
    /// Skips the structural validation `open` performs (signature, IHDR,
    /// IDAT length) since the factory never sees those bytes for a
    /// mid-file range; `read_at` still validates every stored-block header
    /// and filter byte it crosses.
    pub fn open_ranged<Fac>(
        width: u32,
        height: u32,
        d_offset: u64,
        length: u64,
        factory: Fac,
    ) -> Result<Self>
    where
        Fac: FnOnce(u64, u64) -> Result<Box<dyn Read>>,
    {
        layout::validate_dimensions(width, height)?;
        if length == 0 {
            return Err(PngBinError::invalid_argument(
                "open_ranged requires a non-zero length",
            ));
        }
        let capacity = layout::capacity(width, height);
        if d_offset + length > capacity {
            error!(
                "PngReader::open_ranged: requested range [{d_offset}, {}) exceeds capacity {capacity}",
                d_offset + length
            );
            return Err(PngBinError::invalid_argument(
                "requested range exceeds PNG payload capacity",
            ));
        }

        let p_first = layout::png_offset(width, d_offset);
        let p_last = layout::png_offset(width, d_offset + length - 1);
        debug!(
            "PngReader::open_ranged width={width} height={height} p_first={p_first} p_last={p_last}"
        );
        let reader = factory(p_first, p_last)?;
        Ok(Self {
            source: Source::Ranged {
                reader,
                pos: p_first,
            },
            width,
            height,
        })
    }
}
