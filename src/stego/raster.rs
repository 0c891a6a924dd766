// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Raster to bitstream codec.
//!
//! A QR symbol travels through the DCT channel as a packed bitstream, not
//! as pixels. Packing is row-major, MSB-first: module bit `i` lands in
//! byte `i / 8` at bit position `7 - (i % 8)`. Ink (dark modules) is 1.

/// A square grayscale raster, one byte per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub size: u16,
    pub pixels: Vec<u8>,
}

impl Raster {
    /// An all-white raster of the given side length.
    pub fn blank(size: u16) -> Self {
        Self {
            size,
            pixels: vec![0xFF; (size as usize) * (size as usize)],
        }
    }
}

/// Pack a raster into bits: luminance strictly below 128 is ink (bit 1).
/// Output length is `ceil(size^2 / 8)`; trailing pad bits are 0.
pub fn raster_to_bits(raster: &Raster) -> Vec<u8> {
    let total = (raster.size as usize) * (raster.size as usize);
    let mut out = vec![0u8; total.div_ceil(8)];

    for (i, &px) in raster.pixels.iter().take(total).enumerate() {
        if px < 128 {
            out[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    out
}

/// Unpack bits into a raster: bit 1 renders black (0x00), bit 0 white
/// (0xFF). Bits beyond `size^2` are ignored; missing bits render white.
pub fn bits_to_raster(bits: &[u8], size: u16) -> Raster {
    let total = (size as usize) * (size as usize);
    let mut pixels = vec![0xFFu8; total];

    for (i, px) in pixels.iter_mut().enumerate() {
        let byte = i / 8;
        if byte >= bits.len() {
            break;
        }
        if bits[byte] & (1 << (7 - (i % 8))) != 0 {
            *px = 0x00;
        }
    }

    Raster { size, pixels }
}
