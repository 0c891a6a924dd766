// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Zigzag scan order, as defined by ITU-T T.81.
//!
//! Entropy-coded blocks store their 64 coefficients in zigzag order;
//! everything else in this crate addresses coefficients in natural
//! (row-major) order. These two tables convert between the orders.

/// Zigzag index (0-63) to natural row-major index (row * 8 + col).
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Natural row-major index to zigzag index. Inverse of [`ZIGZAG_TO_NATURAL`].
pub const NATURAL_TO_ZIGZAG: [usize; 64] = {
    let mut table = [0usize; 64];
    let mut zi = 0;
    while zi < 64 {
        table[ZIGZAG_TO_NATURAL[zi]] = zi;
        zi += 1;
    }
    table
};
