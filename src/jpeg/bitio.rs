// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Bit-level I/O over JPEG entropy-coded data.
//!
//! MSB-first in both directions. [`BitReader`] undoes byte-stuffing
//! (0xFF 0x00 -> 0xFF) and flags markers found mid-stream; [`BitWriter`]
//! re-applies stuffing and pads the final byte with 1-bits.

use super::error::{JpegError, Result};

/// Reader over entropy-coded scan bytes.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Accumulator; valid bits occupy the low `bits_left` positions' window.
    buf: u32,
    bits_left: u8,
    /// Marker byte hit while refilling (0xFF followed by non-zero).
    marker_found: Option<u8>,
}

impl<'a> BitReader<'a> {
    /// `pos` is the offset of the first entropy-coded byte (just past the
    /// SOS header).
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            bits_left: 0,
            marker_found: None,
        }
    }

    /// Read `count` bits (1-16), right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count >= 1 && count <= 16);
        while self.bits_left < count {
            self.fill_byte()?;
        }
        self.bits_left -= count;
        let val = (self.buf >> self.bits_left) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Look at the next `count` bits without consuming them.
    pub fn peek_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count >= 1 && count <= 16);
        while self.bits_left < count {
            self.fill_byte()?;
        }
        let val = (self.buf >> (self.bits_left - count)) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Consume bits previously peeked.
    pub fn skip_bits(&mut self, count: u8) {
        debug_assert!(count <= self.bits_left);
        self.bits_left -= count;
    }

    /// Drop partial-byte state, resuming at the next byte boundary.
    pub fn byte_align(&mut self) {
        self.bits_left = 0;
        self.buf = 0;
    }

    /// Byte offset of the next unread input byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Marker byte encountered during reading, if any.
    pub fn marker_found(&self) -> Option<u8> {
        self.marker_found
    }

    /// Consume a restart marker (0xFFD0-0xFFD7) at the current boundary,
    /// returning its low nibble. A RST already swallowed by `fill_byte`
    /// during Huffman decoding counts too. Fill 0xFF bytes before the
    /// marker are skipped.
    pub fn check_restart_marker(&mut self) -> Result<Option<u8>> {
        self.byte_align();

        if let Some(m) = self.marker_found {
            if (m & 0xF8) == 0xD0 {
                self.marker_found = None;
                return Ok(Some(m & 0x07));
            }
        }

        while self.pos + 1 < self.data.len() && self.data[self.pos] == 0xFF {
            let next = self.data[self.pos + 1];
            if next == 0xFF {
                self.pos += 1;
                continue;
            }
            if (next & 0xF8) == 0xD0 {
                let rst = next & 0x07;
                self.pos += 2;
                return Ok(Some(rst));
            }
            break;
        }

        Ok(None)
    }

    fn fill_byte(&mut self) -> Result<()> {
        if self.pos >= self.data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;

        if byte == 0xFF {
            if self.pos >= self.data.len() {
                return Err(JpegError::UnexpectedEof);
            }
            let next = self.data[self.pos];
            if next == 0x00 {
                // Stuffed data byte
                self.pos += 1;
            } else {
                // Marker. Record it and feed 1-fill so in-flight decodes
                // terminate, matching the JPEG padding convention.
                self.marker_found = Some(next);
                self.pos += 1;
                self.buf = (self.buf << 8) | 0xFF;
                self.bits_left += 8;
                return Ok(());
            }
        }

        self.buf = (self.buf << 8) | (byte as u32);
        self.bits_left += 8;
        Ok(())
    }
}

/// Writer producing entropy-coded scan bytes.
pub struct BitWriter {
    output: Vec<u8>,
    buf: u8,
    bits_used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            buf: 0,
            bits_used: 0,
        }
    }

    /// Append `count` bits (1-16) taken from the low bits of `value`.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count >= 1 && count <= 16);
        for i in (0..count).rev() {
            let bit = (value >> i) & 1;
            self.buf = (self.buf << 1) | (bit as u8);
            self.bits_used += 1;
            if self.bits_used == 8 {
                self.emit_byte(self.buf);
                self.buf = 0;
                self.bits_used = 0;
            }
        }
    }

    /// Pad the trailing partial byte with 1-bits and return the stream.
    pub fn flush(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let remaining = 8 - self.bits_used;
            self.buf = (self.buf << remaining) | ((1u8 << remaining) - 1);
            self.emit_byte(self.buf);
        }
        self.output
    }

    fn emit_byte(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == 0xFF {
            self.output.push(0x00);
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_within_and_across_bytes() {
        let data = [0xA5, 0x3C]; // 1010_0101 0011_1100
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(4).unwrap(), 0b1010);
        assert_eq!(r.read_bits(6).unwrap(), 0b0101_00);
        assert_eq!(r.read_bits(6).unwrap(), 0b11_1100);
    }

    #[test]
    fn destuffing() {
        // 0xFF 0x00 decodes to the single data byte 0xFF
        let data = [0xFF, 0x00, 0x80];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert_eq!(r.read_bits(8).unwrap(), 0x80);
        assert!(r.marker_found().is_none());
    }

    #[test]
    fn marker_flagged_not_decoded() {
        let data = [0xAB, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(8).unwrap(), 0xAB);
        let _ = r.read_bits(8);
        assert_eq!(r.marker_found(), Some(0xD9));
    }

    #[test]
    fn restart_marker_at_boundary() {
        let data = [0xFF, 0xD3, 0x00];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.check_restart_marker().unwrap(), Some(3));
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn write_then_read_back() {
        let mut w = BitWriter::new();
        w.write_bits(0b1010, 4);
        w.write_bits(0b0101, 4);
        assert_eq!(w.flush(), vec![0xA5]);
    }

    #[test]
    fn write_stuffs_ff() {
        let mut w = BitWriter::new();
        w.write_bits(0xFF, 8);
        assert_eq!(w.flush(), vec![0xFF, 0x00]);
    }

    #[test]
    fn flush_pads_with_ones() {
        let mut w = BitWriter::new();
        w.write_bits(0b110, 3);
        // 110_11111
        assert_eq!(w.flush(), vec![0xDF]);
    }

    #[test]
    fn peek_does_not_consume() {
        let data = [0xA5];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.peek_bits(4).unwrap(), 0b1010);
        assert_eq!(r.peek_bits(4).unwrap(), 0b1010);
        r.skip_bits(4);
        assert_eq!(r.read_bits(4).unwrap(), 0b0101);
    }

    #[test]
    fn eof_reported() {
        let data = [0xA5];
        let mut r = BitReader::new(&data, 0);
        assert_eq!(r.read_bits(8).unwrap(), 0xA5);
        assert!(matches!(r.read_bits(1), Err(JpegError::UnexpectedEof)));
    }
}
