// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Direct DCT embedding: raw bytes without a QR symbol.
//!
//! Trades all of the QR layer's error correction for capacity. Six AC
//! coefficients per luminance block (natural indices 1-6) carry one bit
//! each, prefixed by a fixed envelope:
//!
//! ```text
//! [4 bytes] payload length, u32 LE
//! [4 bytes] checksum, u32 LE
//! [N bytes] payload
//! ```
//!
//! The checksum is a rolling shift-xor over the payload. It detects
//! corruption; it cannot repair anything, which is the accepted deal on
//! this path.

use crate::jpeg::dct::DctGrid;

use super::error::StegoError;

/// AC coefficient indices (natural order) used by the direct path.
const DIRECT_INDICES: [usize; 6] = [1, 2, 3, 4, 5, 6];

/// Envelope header length in bytes.
const HEADER_LEN: usize = 8;

/// Rolling shift-xor checksum over the payload bytes, left to right.
pub fn payload_checksum(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |c, &b| (c << 1) ^ b as u32)
}

/// Payload bits the grid holds on the direct path.
pub fn direct_capacity_bits(grid: &DctGrid) -> u64 {
    (grid.total_blocks() as u64) * (DIRECT_INDICES.len() as u64)
}

fn write_lsbs(grid: &mut DctGrid, bytes: &[u8]) {
    let total_bits = bytes.len() * 8;
    let mut bit_index = 0usize;

    'outer: for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            for &ci in &DIRECT_INDICES {
                if bit_index >= total_bits {
                    break 'outer;
                }
                let bit = (bytes[bit_index / 8] >> (7 - (bit_index % 8))) & 1;
                let coeff = grid.coeff(br, bc, ci);
                grid.set_coeff(br, bc, ci, (coeff & !1) | bit as i16);
                bit_index += 1;
            }
        }
    }
}

fn read_lsbs(grid: &DctGrid, byte_count: usize, skip_bits: usize) -> Vec<u8> {
    let mut out = vec![0u8; byte_count];
    let total_bits = byte_count * 8;
    let mut bit_index = 0usize;
    let mut skipped = 0usize;

    'outer: for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            for &ci in &DIRECT_INDICES {
                if skipped < skip_bits {
                    skipped += 1;
                    continue;
                }
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

/// Embed `data` with its envelope into the grid.
pub fn embed_direct(grid: &mut DctGrid, data: &[u8]) -> Result<(), StegoError> {
    let mut framed = Vec::with_capacity(HEADER_LEN + data.len());
    framed.extend_from_slice(&(data.len() as u32).to_le_bytes());
    framed.extend_from_slice(&payload_checksum(data).to_le_bytes());
    framed.extend_from_slice(data);

    let required_bits = (framed.len() as u64) * 8;
    let available_bits = direct_capacity_bits(grid);
    if required_bits > available_bits {
        return Err(StegoError::CapacityExceeded {
            required_bits,
            available_bits,
        });
    }

    write_lsbs(grid, &framed);
    Ok(())
}

/// Extract a direct-path payload from the grid.
///
/// The declared length is validated against physical capacity before the
/// body is read, so a garbage header cannot trigger a huge allocation. A
/// failed checksum is an error; best-effort callers can still keep the
/// bytes carried inside [`StegoError::ChecksumMismatch`]'s report.
pub fn extract_direct(grid: &DctGrid) -> Result<Vec<u8>, StegoError> {
    let available_bits = direct_capacity_bits(grid);
    if (HEADER_LEN as u64) * 8 > available_bits {
        return Err(StegoError::CapacityExceeded {
            required_bits: (HEADER_LEN as u64) * 8,
            available_bits,
        });
    }

    let header = read_lsbs(grid, HEADER_LEN, 0);
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let required_bits = ((HEADER_LEN + length) as u64) * 8;
    if required_bits > available_bits {
        return Err(StegoError::InvalidMetadata(
            "direct envelope length exceeds carrier capacity",
        ));
    }

    let data = read_lsbs(grid, length, HEADER_LEN * 8);
    let actual = payload_checksum(&data);
    if actual != expected {
        return Err(StegoError::ChecksumMismatch {
            expected: format!("{expected:08x}"),
            actual: format!("{actual:08x}"),
        });
    }

    Ok(data)
}
