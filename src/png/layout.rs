//! Fixed-layout PNG byte accounting: offsets, deflate framing sizes, and the
//! data-offset <-> png-offset coordinate mapping from the envelope format.
//!
//! Everything here is pure arithmetic over `u64` so callers can validate
//! against the `2^32` ceilings themselves before committing to I/O.

use crate::error::{PngBinError, Result};

/// Bytes before the zlib header that are fixed regardless of dimensions:
/// 8-byte signature + 25-byte IHDR chunk + 4-byte IDAT length + 4-byte "IDAT".
pub const PREFIX_LEN: u64 = 8 + 25 + 4 + 4;

/// Trailing bytes after the IDAT data: 4-byte IDAT CRC + 12-byte IEND.
pub const SUFFIX_LEN: u64 = 4 + 12;

pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x01];

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub const STORED_BLOCK_MAX: u64 = 0xFFFF;

/// `W*4`: bytes of RGBA payload per scanline.
pub fn row_len(width: u32) -> u64 {
    width as u64 * 4
}

/// `W*H*4`: total payload capacity of one PNG slot.
pub fn capacity(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * 4
}

/// `2 + 5*ceil((W*H*4+H)/65535) + W*H*4 + H + 4`, the length encoded in the
/// IDAT chunk's length field (data after the 4-byte "IDAT" tag, before the
/// chunk's trailing CRC).
pub fn idat_len(width: u32, height: u32) -> u64 {
    let inflated = capacity(width, height) + height as u64;
    2 + 5 * ceil_div(inflated, STORED_BLOCK_MAX) + capacity(width, height) + height as u64 + 4
}

/// Validates `(width, height)` against the invariants in the data model:
/// both strictly positive, `W*H*4 < 2^32` so the IDAT length fits 32 bits.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PngBinError::invalid_argument(
            "width and height must be non-zero",
        ));
    }
    if capacity(width, height) >= 1u64 << 32 {
        return Err(PngBinError::invalid_argument(
            "width*height*4 must fit in a 32-bit length",
        ));
    }
    if idat_len(width, height) >= 1u64 << 32 {
        return Err(PngBinError::invalid_argument(
            "computed IDAT length does not fit in a 32-bit length",
        ));
    }
    Ok(())
}

/// Total size of the PNG file produced by `PngWriter::finish`.
pub fn total_file_len(width: u32, height: u32) -> u64 {
    PREFIX_LEN + idat_len(width, height) + SUFFIX_LEN
}

/// Maps a data-offset `d` (index into the logical `W*H*4`-byte payload) to
/// its byte index `p` within the PNG file.
pub fn png_offset(width: u32, d: u64) -> u64 {
    let r = row_len(width);
    let f = d / r + 1; // filter bytes before d
    let o = d + f;
    let c = 5 * (o / STORED_BLOCK_MAX + 1); // deflate stored-block headers before d
    PREFIX_LEN + 2 + c + o
}

/// Next-event counters from data-offset `d`: `nf` = bytes until the next
/// filter byte, `nz` = bytes until the next stored-block header.
pub fn next_counters(width: u32, d: u64) -> (u64, u64) {
    let r = row_len(width);
    let f = d / r + 1;
    let o = d + f;
    let mut nf = r - d % r;
    let nz = STORED_BLOCK_MAX - o % STORED_BLOCK_MAX;
    if nf >= nz {
        nf += 5 * ceil_div(nf, STORED_BLOCK_MAX);
    }
    (nf, nz)
}

pub fn ceil_div(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idat_len_small_image() {
        // W=2,H=2: inflated = 16 + 2 = 18 bytes, one stored block.
        assert_eq!(idat_len(2, 2), 2 + 5 + 16 + 2 + 4);
    }

    #[test]
    fn total_file_len_small_image() {
        assert_eq!(total_file_len(2, 2), 41 + idat_len(2, 2) + 16);
    }

    #[test]
    fn png_offset_first_byte() {
        // d=0: f=1, o=1, c=5*(0+1)=5, p=41+2+5+1=49
        assert_eq!(png_offset(2, 0), 49);
    }

    #[test]
    fn next_counters_first_byte() {
        // W=2: r=8, nf=8-0=8, o=1, nz=65535-1=65534; nf<nz so no correction.
        let (nf, nz) = next_counters(2, 0);
        assert_eq!(nf, 8);
        assert_eq!(nz, 65534);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(validate_dimensions(0, 10).is_err());
        assert!(validate_dimensions(10, 0).is_err());
    }

    #[test]
    fn rejects_oversized_capacity() {
        assert!(validate_dimensions(1 << 20, 1 << 20).is_err());
    }
}
