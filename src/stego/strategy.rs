// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Embedding strategy selection.
//!
//! A strategy names which AC coefficients of each luminance block carry
//! payload bits. Both sides of the channel must agree on the strategy;
//! it is part of the wire contract, not a tuning knob.

/// Which quantized AC coefficients of each 8x8 block carry payload bits.
///
/// Coefficient indices address the natural-order block slice (0-63).
/// Index 0 is the DC coefficient and is never modified by any strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingStrategy {
    /// One bit per block in the lowest AC coefficient. Most robust against
    /// recompression, lowest capacity.
    SingleCoefficient,
    /// Four bits per block in mid-frequency coefficients. Four times the
    /// capacity, more fragile.
    MultiCoefficient,
}

impl EmbeddingStrategy {
    /// Natural-order coefficient indices used by this strategy, in
    /// traversal order.
    pub fn coefficient_indices(self) -> &'static [usize] {
        match self {
            Self::SingleCoefficient => &[1],
            Self::MultiCoefficient => &[4, 5, 6, 7],
        }
    }

    /// Payload bits carried per 8x8 block.
    pub fn bits_per_block(self) -> u64 {
        self.coefficient_indices().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dc_coefficient_never_selected() {
        for strategy in [
            EmbeddingStrategy::SingleCoefficient,
            EmbeddingStrategy::MultiCoefficient,
        ] {
            assert!(!strategy.coefficient_indices().contains(&0));
        }
    }

    #[test]
    fn bits_per_block_matches_indices() {
        assert_eq!(EmbeddingStrategy::SingleCoefficient.bits_per_block(), 1);
        assert_eq!(EmbeddingStrategy::MultiCoefficient.bits_per_block(), 4);
    }

    #[test]
    fn multi_uses_mid_frequency_band() {
        assert_eq!(
            EmbeddingStrategy::MultiCoefficient.coefficient_indices(),
            &[4, 5, 6, 7]
        );
    }
}
