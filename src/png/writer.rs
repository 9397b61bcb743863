//! `PngWriter<W>`: streams a payload into the pixel data of a fixed-layout,
//! single-IDAT PNG as it arrives, without buffering the whole image.

use std::io::Write;

use log::debug;

use crate::error::{PngBinError, Result};

use super::layout::{self, PNG_SIGNATURE, STORED_BLOCK_MAX, ZLIB_HEADER};

/// Writes a PNG envelope around an arbitrary byte stream, one `write()` call
/// at a time, emitting per-row filter bytes and deflate stored-block framing
/// as the inflated offset crosses their boundaries.
///
/// Must be finished with [`PngWriter::close`]/[`PngWriter::finish`] —
/// dropping an unfinished writer leaves a truncated, invalid PNG behind,
/// same as leaving a teacher `Writer` unflushed.
pub struct PngWriter<W: Write> {
    sink: W,
    width: u32,
    height: u32,
    capacity: u64,
    inflated_total: u64,
    /// Data-offset (payload-space) of the next byte expected via `write_payload`.
    d: u64,
    /// Bytes already written into the current row, i.e. `d % row_len`, kept
    /// separately so the filter byte can be emitted exactly at row starts.
    row_pos: u64,
    /// Total inflated bytes emitted so far (filter bytes + payload bytes),
    /// used to track stored-block boundaries.
    inflated_pos: u64,
    adler: simd_adler32::Adler32,
    idat_crc: crc32fast::Hasher,
    finished: bool,
}

impl<W: Write> PngWriter<W> {
    /// Writes the signature, IHDR, and IDAT length+tag+zlib-header prefix,
    /// then returns a writer positioned at data-offset 0.
    pub fn new(mut sink: W, width: u32, height: u32) -> Result<Self> {
        layout::validate_dimensions(width, height)?;
        debug!("PngWriter::new width={width} height={height}");

        sink.write_all(&PNG_SIGNATURE)?;

        write_chunk(&mut sink, b"IHDR", &ihdr_data(width, height))?;

        let idat_len = layout::idat_len(width, height);
        sink.write_all(&(idat_len as u32).to_be_bytes())?;
        sink.write_all(b"IDAT")?;

        let mut idat_crc = crc32fast::Hasher::new();
        idat_crc.update(b"IDAT");
        sink.write_all(&ZLIB_HEADER)?;
        idat_crc.update(&ZLIB_HEADER);

        Ok(Self {
            sink,
            width,
            height,
            capacity: layout::capacity(width, height),
            inflated_total: layout::capacity(width, height) + height as u64,
            d: 0,
            row_pos: 0,
            inflated_pos: 0,
            adler: simd_adler32::Adler32::new(),
            idat_crc,
            finished: false,
        })
    }

    /// Remaining capacity (in data-offset bytes) before this slot is full.
    pub fn remaining(&self) -> u64 {
        self.capacity - self.d
    }

    pub fn position(&self) -> u64 {
        self.d
    }

    /// Appends `buf` to the payload, emitting filter bytes and stored-block
    /// headers as needed. `buf` must not exceed `remaining()`.
    pub fn write_payload(&mut self, buf: &[u8]) -> Result<()> {
        if self.finished {
            return Err(PngBinError::AlreadyFinished);
        }
        if buf.len() as u64 > self.remaining() {
            return Err(PngBinError::invalid_argument(
                "write exceeds PNG slot capacity",
            ));
        }

        let row_len = layout::row_len(self.width);
        let mut pos = 0usize;
        while pos < buf.len() {
            if self.row_pos == 0 {
                self.emit_inflated(&[0u8])?; // filter byte: None
            }
            let room_in_row = (row_len - self.row_pos) as usize;
            let step = (buf.len() - pos).min(room_in_row);
            self.emit_inflated(&buf[pos..pos + step])?;
            pos += step;
            self.d += step as u64;
            self.row_pos += step as u64;
            if self.row_pos == row_len {
                self.row_pos = 0;
            }
        }
        Ok(())
    }

    /// Pushes raw inflated bytes (filter byte or payload) through the
    /// Adler32 running checksum and the active stored-block, opening a new
    /// stored-block header whenever `inflated_pos` lands on a 65535-byte
    /// boundary.
    fn emit_inflated(&mut self, bytes: &[u8]) -> Result<()> {
        let mut pos = 0usize;
        while pos < bytes.len() {
            if self.inflated_pos % STORED_BLOCK_MAX == 0 {
                self.open_stored_block()?;
            }
            let room_in_block = (STORED_BLOCK_MAX - self.inflated_pos % STORED_BLOCK_MAX) as usize;
            let step = (bytes.len() - pos).min(room_in_block);
            self.sink.write_all(&bytes[pos..pos + step])?;
            self.idat_crc.update(&bytes[pos..pos + step]);
            self.adler.write(&bytes[pos..pos + step]);
            pos += step;
            self.inflated_pos += step as u64;
        }
        Ok(())
    }

    fn open_stored_block(&mut self) -> Result<()> {
        let remaining_inflated = self.inflated_total - self.inflated_pos;
        let block_len = remaining_inflated.min(STORED_BLOCK_MAX);
        let bfinal = if block_len == remaining_inflated { 1u8 } else { 0u8 };
        let header = stored_block_header(bfinal, block_len as u16);
        self.sink.write_all(&header)?;
        self.idat_crc.update(&header);
        Ok(())
    }

    /// Writes zero padding to fill the slot to capacity, closes the final
    /// stored block, writes the Adler32 trailer and the IDAT/IEND chunk
    /// framing. Consumes `self`; the underlying sink is returned so the
    /// caller can do whatever it likes with it next (mirrors the teacher's
    /// consuming `Writer::close`).
    pub fn finish(mut self) -> Result<W> {
        if self.finished {
            return Err(PngBinError::AlreadyFinished);
        }
        let pad_len = self.remaining();
        if pad_len > 0 {
            const CHUNK: usize = 64 * 1024;
            let zeros = [0u8; CHUNK];
            let mut left = pad_len;
            while left > 0 {
                let step = left.min(CHUNK as u64) as usize;
                self.write_payload(&zeros[..step])?;
                left -= step as u64;
            }
        }
        self.finished = true;

        debug_assert_eq!(self.inflated_pos, self.inflated_total);

        let adler = std::mem::replace(&mut self.adler, simd_adler32::Adler32::new()).finish();
        self.sink.write_all(&adler.to_be_bytes())?;
        self.idat_crc.update(&adler.to_be_bytes());

        let crc = std::mem::replace(&mut self.idat_crc, crc32fast::Hasher::new()).finalize();
        self.sink.write_all(&crc.to_be_bytes())?;

        write_chunk(&mut self.sink, b"IEND", &[])?;
        Ok(self.sink)
    }

    /// Alias for [`PngWriter::finish`] matching the teacher's `close` naming.
    pub fn close(self) -> Result<W> {
        self.finish()
    }
}

fn ihdr_data(width: u32, height: u32) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = 6; // color type: RGBA
    data[10] = 0; // compression method
    data[11] = 0; // filter method
    data[12] = 0; // interlace method
    data
}

fn stored_block_header(bfinal: u8, len: u16) -> [u8; 5] {
    let mut header = [0u8; 5];
    header[0] = bfinal;
    header[1..3].copy_from_slice(&len.to_le_bytes());
    header[3..5].copy_from_slice(&(!len).to_le_bytes());
    header
}

fn write_chunk<W: Write>(sink: &mut W, tag: &[u8; 4], data: &[u8]) -> Result<()> {
    sink.write_all(&(data.len() as u32).to_be_bytes())?;
    sink.write_all(tag)?;
    sink.write_all(data)?;
    let mut crc = crc32fast::Hasher::new();
    crc.update(tag);
    crc.update(data);
    sink.write_all(&crc.finalize().to_be_bytes())?;
    Ok(())
}
