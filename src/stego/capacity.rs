// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Capacity model: how many bits the DCT channel holds and how many bytes
//! a QR raster of a given size and ECC level can carry.
//!
//! The QR byte capacities are a wire contract shared with every decoder:
//! conservative fixed values, deliberately below the theoretical QR maxima,
//! never computed from QR version tables at runtime.

use super::strategy::EmbeddingStrategy;

/// QR error correction level. The system never encodes below `High` —
/// LSB channels are noisy and the ECC budget is the recovery margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrEccLevel {
    /// ~30% codeword recovery. Tried first by the planner.
    Highest,
    /// ~25% codeword recovery. The floor.
    High,
}

impl QrEccLevel {
    /// Wire name used in metadata documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "highest" => Some(Self::Highest),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Permitted raster sizes and their payload byte capacities as
/// (size, capacity at Highest, capacity at High).
const QR_CAPACITY: [(u16, u32, u32); 15] = [
    (64, 15, 30),
    (96, 40, 80),
    (128, 75, 150),
    (160, 125, 250),
    (192, 175, 350),
    (224, 250, 500),
    (256, 350, 700),
    (288, 450, 900),
    (320, 600, 1200),
    (352, 750, 1500),
    (384, 900, 1800),
    (416, 1100, 2200),
    (448, 1300, 2600),
    (480, 1500, 3000),
    (512, 1750, 3500),
];

/// Smallest permitted raster size.
pub const MIN_RASTER_SIZE: u16 = 64;
/// Largest permitted raster size.
pub const MAX_RASTER_SIZE: u16 = 512;
/// Largest payload any raster can carry (512 at High).
pub const MAX_PAYLOAD_BYTES: usize = 3500;

/// Raster sizes the planner may choose, ascending.
pub fn raster_sizes() -> impl Iterator<Item = u16> {
    QR_CAPACITY.iter().map(|&(size, _, _)| size)
}

/// Payload bytes a QR raster of `raster_size` can carry at `ecc`.
/// `None` for sizes outside the permitted set.
pub fn qr_byte_capacity(raster_size: u16, ecc: QrEccLevel) -> Option<u32> {
    QR_CAPACITY
        .iter()
        .find(|&&(size, _, _)| size == raster_size)
        .map(|&(_, highest, high)| match ecc {
            QrEccLevel::Highest => highest,
            QrEccLevel::High => high,
        })
}

/// Total payload bits the luminance DCT channel of a `width` x `height`
/// image holds under `strategy`. Partial edge blocks count: JPEG pads
/// them to full 8x8 blocks.
pub fn block_capacity(width: u32, height: u32, strategy: EmbeddingStrategy) -> u64 {
    let blocks_wide = (width as u64).div_ceil(8);
    let blocks_tall = (height as u64).div_ceil(8);
    blocks_wide * blocks_tall * strategy.bits_per_block()
}
