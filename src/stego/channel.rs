// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! LSB embedding into quantized luminance DCT coefficients.
//!
//! Blocks are traversed in raster order; within each block the strategy's
//! coefficient indices carry one payload bit each in their LSB. Embedding
//! stops at the last payload bit, so every coefficient past it, and every
//! coefficient the strategy never selects, stays byte-identical.
//!
//! The channel works on bare [`DctGrid`]s. JPEG parsing, raster packing,
//! and file handling all live elsewhere, which keeps this codec testable
//! against synthetic in-memory grids.

use crate::jpeg::dct::DctGrid;

use super::error::StegoError;
use super::strategy::EmbeddingStrategy;

/// What an embed actually did; the decoder needs this to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedResult {
    /// Side length of the embedded raster.
    pub actual_raster_size: u16,
    /// Strategy the bits were embedded with.
    pub strategy: EmbeddingStrategy,
    /// Payload bytes inside the raster's data area.
    pub data_area_bytes: u32,
}

/// Payload bits the grid can hold under `strategy`.
pub fn grid_capacity_bits(grid: &DctGrid, strategy: EmbeddingStrategy) -> u64 {
    (grid.total_blocks() as u64) * strategy.bits_per_block()
}

/// Embed `bits` into the grid's coefficient LSBs.
///
/// Fails with [`StegoError::CapacityExceeded`] before touching any
/// coefficient if the bitstream does not fit.
pub fn embed_bits(
    grid: &mut DctGrid,
    bits: &[u8],
    strategy: EmbeddingStrategy,
) -> Result<(), StegoError> {
    let required_bits = (bits.len() as u64) * 8;
    let available_bits = grid_capacity_bits(grid, strategy);
    if required_bits > available_bits {
        return Err(StegoError::CapacityExceeded {
            required_bits,
            available_bits,
        });
    }

    let total_bits = bits.len() * 8;
    let mut bit_index = 0usize;

    'outer: for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            for &ci in strategy.coefficient_indices() {
                if bit_index >= total_bits {
                    break 'outer;
                }
                let bit = (bits[bit_index / 8] >> (7 - (bit_index % 8))) & 1;
                let coeff = grid.coeff(br, bc, ci);
                grid.set_coeff(br, bc, ci, (coeff & !1) | bit as i16);
                bit_index += 1;
            }
        }
    }

    Ok(())
}

/// Read `byte_count` bytes back out of the grid's coefficient LSBs.
///
/// Mirrors the traversal of [`embed_bits`]. Bit errors are not detected
/// here; integrity is the caller's checksum problem. Asking for more bytes
/// than the grid holds yields zero bits for the missing tail.
pub fn extract_bits(grid: &DctGrid, byte_count: usize, strategy: EmbeddingStrategy) -> Vec<u8> {
    let mut out = vec![0u8; byte_count];
    let total_bits = byte_count * 8;
    let mut bit_index = 0usize;

    'outer: for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            for &ci in strategy.coefficient_indices() {
                if bit_index >= total_bits {
                    break 'outer;
                }
                if grid.coeff(br, bc, ci) & 1 != 0 {
                    out[bit_index / 8] |= 1 << (7 - (bit_index % 8));
                }
                bit_index += 1;
            }
        }
    }

    out
}
