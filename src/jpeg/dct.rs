// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Quantized DCT coefficient storage.
//!
//! [`DctGrid`] holds one component's coefficients in block-raster order,
//! 64 natural-order values per 8x8 block. This is the surface the
//! steganographic channel codec reads and writes: the embedding layer never
//! sees entropy-coded bytes, only grids.

/// Quantization table: 64 values in natural (row-major) order.
#[derive(Debug, Clone)]
pub struct QuantTable {
    /// Quantization divisors, indexed by row * 8 + col.
    pub values: [u16; 64],
}

impl QuantTable {
    pub fn new(values: [u16; 64]) -> Self {
        Self { values }
    }
}

/// Grid of quantized DCT coefficients for one image component.
///
/// Storage is flat: `blocks_tall * blocks_wide * 64` values in block-raster
/// order. Within a block, index = frequency row * 8 + frequency col, so
/// index 0 is the DC term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DctGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    coeffs: Vec<i16>,
}

impl DctGrid {
    /// Create a zero-filled grid.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            coeffs: vec![0i16; blocks_wide * blocks_tall * 64],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Total number of 8x8 blocks.
    pub fn total_blocks(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    /// Read the coefficient at natural index `ci` of block (`br`, `bc`).
    pub fn coeff(&self, br: usize, bc: usize, ci: usize) -> i16 {
        self.coeffs[self.index(br, bc, ci)]
    }

    /// Overwrite the coefficient at natural index `ci` of block (`br`, `bc`).
    pub fn set_coeff(&mut self, br: usize, bc: usize, ci: usize, val: i16) {
        let idx = self.index(br, bc, ci);
        self.coeffs[idx] = val;
    }

    /// The 64-coefficient block at (`br`, `bc`).
    pub fn block(&self, br: usize, bc: usize) -> &[i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &self.coeffs[start..start + 64]
    }

    /// Mutable view of the block at (`br`, `bc`).
    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &mut self.coeffs[start..start + 64]
    }

    fn index(&self, br: usize, bc: usize, ci: usize) -> usize {
        debug_assert!(br < self.blocks_tall, "block row {br} >= {}", self.blocks_tall);
        debug_assert!(bc < self.blocks_wide, "block col {bc} >= {}", self.blocks_wide);
        debug_assert!(ci < 64);
        (br * self.blocks_wide + bc) * 64 + ci
    }
}
