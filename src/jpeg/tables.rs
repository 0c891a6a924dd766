// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! DQT and DHT marker segment parsing.
//!
//! A single segment of either kind may define several tables back to back.
//! Quantization values arrive in zigzag order and are stored in natural
//! order, matching [`DctGrid`](super::dct::DctGrid) block layout.

use super::dct::QuantTable;
use super::error::{JpegError, Result};
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Parse a DQT body. Returns (table_id, table) for each table in the segment.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        pos += 1;
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;

        if table_id > 3 {
            return Err(JpegError::InvalidQuantTableId(table_id));
        }

        let mut values = [0u16; 64];
        match precision {
            0 => {
                if pos + 64 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for zi in 0..64 {
                    values[ZIGZAG_TO_NATURAL[zi]] = data[pos + zi] as u16;
                }
                pos += 64;
            }
            1 => {
                if pos + 128 > data.len() {
                    return Err(JpegError::UnexpectedEof);
                }
                for zi in 0..64 {
                    values[ZIGZAG_TO_NATURAL[zi]] =
                        u16::from_be_bytes([data[pos + zi * 2], data[pos + zi * 2 + 1]]);
                }
                pos += 128;
            }
            _ => return Err(JpegError::InvalidMarkerData("invalid DQT precision")),
        }

        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// A Huffman table as declared by DHT.
#[derive(Debug, Clone)]
pub struct HuffmanSpec {
    /// 0 = DC, 1 = AC.
    pub class: u8,
    /// Table ID (0-3).
    pub id: u8,
    /// Number of codes of each length 1-16.
    pub bits: [u8; 16],
    /// Symbols in order of increasing code length.
    pub huffval: Vec<u8>,
}

impl HuffmanSpec {
    /// Serialize in DHT body layout: Tc/Th byte, 16 counts, symbols.
    pub fn to_dht_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 16 + self.huffval.len());
        out.push((self.class << 4) | (self.id & 0x0F));
        out.extend_from_slice(&self.bits);
        out.extend_from_slice(&self.huffval);
        out
    }
}

/// Parse a DHT body. Returns every table the segment defines.
pub fn parse_dht(data: &[u8]) -> Result<Vec<HuffmanSpec>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;

        if class > 1 || id > 3 {
            return Err(JpegError::InvalidHuffmanTableId(tc_th));
        }

        if pos + 16 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if pos + total > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let huffval = data[pos..pos + total].to_vec();
        pos += total;

        specs.push(HuffmanSpec {
            class,
            id,
            bits,
            huffval,
        });
    }

    Ok(specs)
}
