// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Baseline scan data decode and re-encode.
//!
//! [`decode_scan`] turns the entropy-coded bytes into one [`DctGrid`] per
//! scan component; [`encode_scan`] does the reverse after coefficients have
//! been modified. Interleaved MCU order, restart markers, and DC prediction
//! are handled on both paths, so an unmodified decode/encode pair reproduces
//! the coefficient stream exactly.

use super::bitio::{BitReader, BitWriter};
use super::dct::DctGrid;
use super::error::{JpegError, Result};
use super::frame::FrameInfo;
use super::huffman::{encode_value, extend_sign, HuffmanDecodeTable, HuffmanEncodeTable};
use super::tables::HuffmanSpec;
use super::zigzag::{NATURAL_TO_ZIGZAG, ZIGZAG_TO_NATURAL};

/// Component selector for one scan component.
#[derive(Clone)]
pub struct ScanComponent {
    /// Index into `FrameInfo::components`.
    pub comp_idx: usize,
    /// DC Huffman table ID.
    pub dc_table: usize,
    /// AC Huffman table ID.
    pub ac_table: usize,
}

fn build_decode_tables(
    scan_components: &[ScanComponent],
    dc_specs: &[Option<HuffmanSpec>; 4],
    ac_specs: &[Option<HuffmanSpec>; 4],
) -> Result<(
    [Option<HuffmanDecodeTable>; 4],
    [Option<HuffmanDecodeTable>; 4],
)> {
    let mut dc_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];

    for sc in scan_components {
        if dc_tables[sc.dc_table].is_none() {
            let spec = dc_specs[sc.dc_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.dc_table as u8))?;
            dc_tables[sc.dc_table] = Some(HuffmanDecodeTable::build(&spec.bits, &spec.huffval)?);
        }
        if ac_tables[sc.ac_table].is_none() {
            let spec = ac_specs[sc.ac_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.ac_table as u8))?;
            ac_tables[sc.ac_table] = Some(HuffmanDecodeTable::build(&spec.bits, &spec.huffval)?);
        }
    }

    Ok((dc_tables, ac_tables))
}

/// Decode one block's worth of entropy data into a zigzag buffer.
/// `dc_pred` accumulates the DC prediction for the component.
fn decode_block(
    reader: &mut BitReader,
    dc_tab: &HuffmanDecodeTable,
    ac_tab: &HuffmanDecodeTable,
    dc_pred: &mut i32,
    zz: &mut [i16; 64],
) -> Result<()> {
    let dc_size = dc_tab.decode(reader)?;
    if dc_size > 0 {
        let dc_bits = reader.read_bits(dc_size)?;
        *dc_pred += extend_sign(dc_bits, dc_size) as i32;
    }
    zz[0] = (*dc_pred).clamp(i16::MIN as i32, i16::MAX as i32) as i16;

    let mut k = 1;
    while k < 64 {
        let rs = ac_tab.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;

        if size == 0 {
            if run == 15 {
                // ZRL: sixteen zeros
                k += 16;
                continue;
            }
            // EOB (or reserved symbol treated the same way)
            break;
        }

        k += run;
        if k >= 64 {
            return Err(JpegError::HuffmanDecode);
        }
        let ac_bits = reader.read_bits(size)?;
        zz[k] = extend_sign(ac_bits, size);
        k += 1;
    }

    Ok(())
}

/// Decode the entropy-coded scan into one grid per scan component.
///
/// `scan_start` is the offset of the first entropy-coded byte (right after
/// the SOS header); `restart_interval` comes from DRI (0 = none). Returns
/// the grids and the offset just past the last scan byte consumed.
pub fn decode_scan(
    data: &[u8],
    scan_start: usize,
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    dc_specs: &[Option<HuffmanSpec>; 4],
    ac_specs: &[Option<HuffmanSpec>; 4],
    restart_interval: u16,
) -> Result<(Vec<DctGrid>, usize)> {
    let (dc_tables, ac_tables) = build_decode_tables(scan_components, dc_specs, ac_specs)?;

    let mut grids: Vec<DctGrid> = scan_components
        .iter()
        .map(|sc| DctGrid::new(frame.blocks_wide(sc.comp_idx), frame.blocks_tall(sc.comp_idx)))
        .collect();

    // i32 predictors: accumulated differences can leave i16 range mid-stream
    let mut dc_pred = vec![0i32; scan_components.len()];

    let mut reader = BitReader::new(data, scan_start);
    let mut mcu_count = 0usize;

    for mcu_row in 0..frame.mcus_tall as usize {
        for mcu_col in 0..frame.mcus_wide as usize {
            if restart_interval > 0 && mcu_count > 0 && mcu_count % (restart_interval as usize) == 0
            {
                reader.byte_align();
                // Accept any RST without sequence checking, as libjpeg does
                let _rst = reader.check_restart_marker()?;
                for pred in &mut dc_pred {
                    *pred = 0;
                }
            }

            for (sci, sc) in scan_components.iter().enumerate() {
                let comp = &frame.components[sc.comp_idx];
                let dc_tab = dc_tables[sc.dc_table]
                    .as_ref()
                    .ok_or(JpegError::InvalidHuffmanTableId(sc.dc_table as u8))?;
                let ac_tab = ac_tables[sc.ac_table]
                    .as_ref()
                    .ok_or(JpegError::InvalidHuffmanTableId(sc.ac_table as u8))?;

                for v in 0..comp.v_sampling as usize {
                    for h in 0..comp.h_sampling as usize {
                        let block_row = mcu_row * (comp.v_sampling as usize) + v;
                        let block_col = mcu_col * (comp.h_sampling as usize) + h;

                        let mut zz = [0i16; 64];
                        decode_block(&mut reader, dc_tab, ac_tab, &mut dc_pred[sci], &mut zz)?;

                        // Blocks past the padded grid edge (malformed files)
                        // are decoded to keep the stream in sync, then dropped.
                        if block_row >= grids[sci].blocks_tall()
                            || block_col >= grids[sci].blocks_wide()
                        {
                            continue;
                        }

                        let block = grids[sci].block_mut(block_row, block_col);
                        for zi in 0..64 {
                            block[ZIGZAG_TO_NATURAL[zi]] = zz[zi];
                        }
                    }
                }
            }

            mcu_count += 1;
        }
    }

    Ok((grids, reader.position()))
}

/// Re-encode modified grids to entropy-coded scan bytes.
///
/// The output carries restart markers if `restart_interval > 0` but no SOS
/// header; the caller frames it.
pub fn encode_scan(
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    grids: &[DctGrid],
    dc_specs: &[Option<HuffmanSpec>; 4],
    ac_specs: &[Option<HuffmanSpec>; 4],
    restart_interval: u16,
) -> Result<Vec<u8>> {
    let mut dc_tables: [Option<HuffmanEncodeTable>; 4] = [None, None, None, None];
    let mut ac_tables: [Option<HuffmanEncodeTable>; 4] = [None, None, None, None];

    for sc in scan_components {
        if dc_tables[sc.dc_table].is_none() {
            let spec = dc_specs[sc.dc_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.dc_table as u8))?;
            dc_tables[sc.dc_table] = Some(HuffmanEncodeTable::build(&spec.bits, &spec.huffval));
        }
        if ac_tables[sc.ac_table].is_none() {
            let spec = ac_specs[sc.ac_table]
                .as_ref()
                .ok_or(JpegError::InvalidHuffmanTableId(sc.ac_table as u8))?;
            ac_tables[sc.ac_table] = Some(HuffmanEncodeTable::build(&spec.bits, &spec.huffval));
        }
    }

    // Byte accumulator so restart markers land between bit-flushed segments
    let mut output = Vec::new();
    let mut writer = BitWriter::new();
    let mut dc_pred = vec![0i32; scan_components.len()];
    let mut mcu_count = 0usize;
    let mut restart_count = 0u16;

    for mcu_row in 0..frame.mcus_tall as usize {
        for mcu_col in 0..frame.mcus_wide as usize {
            if restart_interval > 0 && mcu_count > 0 && mcu_count % (restart_interval as usize) == 0
            {
                let segment = std::mem::replace(&mut writer, BitWriter::new()).flush();
                output.extend_from_slice(&segment);

                // Markers sit outside entropy data, no stuffing
                output.push(0xFF);
                output.push(0xD0 + (restart_count % 8) as u8);
                restart_count += 1;

                for pred in &mut dc_pred {
                    *pred = 0;
                }
            }

            for (sci, sc) in scan_components.iter().enumerate() {
                let comp = &frame.components[sc.comp_idx];
                let dc_tab = dc_tables[sc.dc_table]
                    .as_ref()
                    .ok_or(JpegError::InvalidHuffmanTableId(sc.dc_table as u8))?;
                let ac_tab = ac_tables[sc.ac_table]
                    .as_ref()
                    .ok_or(JpegError::InvalidHuffmanTableId(sc.ac_table as u8))?;

                for v in 0..comp.v_sampling as usize {
                    for h in 0..comp.h_sampling as usize {
                        let block_row = mcu_row * (comp.v_sampling as usize) + v;
                        let block_col = mcu_col * (comp.h_sampling as usize) + h;

                        let block = grids[sci].block(block_row, block_col);
                        let mut zz = [0i16; 64];
                        for ni in 0..64 {
                            zz[NATURAL_TO_ZIGZAG[ni]] = block[ni];
                        }

                        // DC difference
                        let dc_diff = (zz[0] as i32 - dc_pred[sci]) as i16;
                        dc_pred[sci] = zz[0] as i32;
                        let (dc_bits, dc_size) = encode_value(dc_diff);
                        let (dc_code, dc_code_len) = dc_tab.encode(dc_size)?;
                        writer.write_bits(dc_code, dc_code_len);
                        if dc_size > 0 {
                            writer.write_bits(dc_bits, dc_size);
                        }

                        // AC run-length coding
                        let mut k = 1;
                        while k < 64 {
                            let mut run = 0usize;
                            while k + run < 64 && zz[k + run] == 0 {
                                run += 1;
                            }

                            if k + run >= 64 {
                                let (eob_code, eob_len) = ac_tab.encode(0x00)?;
                                writer.write_bits(eob_code, eob_len);
                                break;
                            }

                            while run >= 16 {
                                let (zrl_code, zrl_len) = ac_tab.encode(0xF0)?;
                                writer.write_bits(zrl_code, zrl_len);
                                run -= 16;
                                k += 16;
                            }

                            k += run;
                            let (ac_bits, ac_size) = encode_value(zz[k]);
                            let rs = ((run as u8) << 4) | ac_size;
                            let (ac_code, ac_code_len) = ac_tab.encode(rs)?;
                            writer.write_bits(ac_code, ac_code_len);
                            if ac_size > 0 {
                                writer.write_bits(ac_bits, ac_size);
                            }
                            k += 1;
                        }
                    }
                }
            }

            mcu_count += 1;
        }
    }

    output.extend_from_slice(&writer.flush());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::frame::parse_sof;

    fn std_dc_spec() -> HuffmanSpec {
        HuffmanSpec {
            class: 0,
            id: 0,
            bits: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            huffval: (0..12).collect(),
        }
    }

    // Standard luminance AC table, ITU-T T.81 Table K.5; covers every
    // (run, size) symbol plus EOB and ZRL.
    fn full_ac_spec() -> HuffmanSpec {
        let mut bits = [0u8; 16];
        let mut huffval = Vec::new();
        bits.copy_from_slice(&[0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125]);
        let standard: [u8; 162] = [
            0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51,
            0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08, 0x23, 0x42, 0xB1, 0xC1,
            0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16, 0x17, 0x18,
            0x19, 0x1A, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
            0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57,
            0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
            0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92,
            0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7,
            0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3,
            0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8,
            0xD9, 0xDA, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2,
            0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
        ];
        huffval.extend_from_slice(&standard);
        HuffmanSpec {
            class: 1,
            id: 0,
            bits,
            huffval,
        }
    }

    fn grayscale_frame(w: u8, h: u8) -> FrameInfo {
        let data = [8, 0, h, 0, w, 1, 1, 0x11, 0];
        parse_sof(&data).unwrap()
    }

    #[test]
    fn encode_decode_roundtrip_single_component() {
        let frame = grayscale_frame(16, 16); // 2x2 blocks
        let scan = vec![ScanComponent {
            comp_idx: 0,
            dc_table: 0,
            ac_table: 0,
        }];
        let dc_specs = [Some(std_dc_spec()), None, None, None];
        let ac_specs = [Some(full_ac_spec()), None, None, None];

        let mut grid = DctGrid::new(2, 2);
        grid.set_coeff(0, 0, 0, 37); // DC
        grid.set_coeff(0, 0, 1, -3);
        grid.set_coeff(0, 1, 0, 35);
        grid.set_coeff(1, 0, 5, 7);
        grid.set_coeff(1, 1, 63, -1);

        let bytes =
            encode_scan(&frame, &scan, &[grid.clone()], &dc_specs, &ac_specs, 0).unwrap();
        let (grids, _end) =
            decode_scan(&bytes, 0, &frame, &scan, &dc_specs, &ac_specs, 0).unwrap();
        assert_eq!(grids[0], grid);
    }

    #[test]
    fn roundtrip_with_restart_markers() {
        let frame = grayscale_frame(32, 8); // 4x1 blocks, 4 MCUs
        let scan = vec![ScanComponent {
            comp_idx: 0,
            dc_table: 0,
            ac_table: 0,
        }];
        let dc_specs = [Some(std_dc_spec()), None, None, None];
        let ac_specs = [Some(full_ac_spec()), None, None, None];

        let mut grid = DctGrid::new(4, 1);
        for bc in 0..4 {
            grid.set_coeff(0, bc, 0, 10 * (bc as i16 + 1));
            grid.set_coeff(0, bc, 4, 1);
        }

        let bytes =
            encode_scan(&frame, &scan, &[grid.clone()], &dc_specs, &ac_specs, 2).unwrap();
        // One restart marker expected between MCU 1 and 2
        assert!(bytes.windows(2).any(|w| w[0] == 0xFF && (w[1] & 0xF8) == 0xD0));

        let (grids, _end) =
            decode_scan(&bytes, 0, &frame, &scan, &dc_specs, &ac_specs, 2).unwrap();
        assert_eq!(grids[0], grid);
    }

    #[test]
    fn missing_huffman_table_rejected() {
        let frame = grayscale_frame(8, 8);
        let scan = vec![ScanComponent {
            comp_idx: 0,
            dc_table: 1, // never defined
            ac_table: 0,
        }];
        let dc_specs = [Some(std_dc_spec()), None, None, None];
        let ac_specs = [Some(full_ac_spec()), None, None, None];
        let result = decode_scan(&[0u8; 16], 0, &frame, &scan, &dc_specs, &ac_specs, 0);
        assert!(matches!(result, Err(JpegError::InvalidHuffmanTableId(1))));
    }
}
