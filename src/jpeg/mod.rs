// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Pure-Rust baseline JPEG coefficient codec (std only).
//!
//! Parses a baseline sequential JPEG into quantized DCT coefficient grids,
//! lets callers modify coefficients in place, and re-encodes the result.
//! There is no pixel-domain processing anywhere: the steganographic channel
//! works entirely on quantized coefficients, so a decode/modify/encode cycle
//! is lossless except for the deliberately flipped bits.
//!
//! Supports 8-bit baseline (SOF0) with arbitrary component counts and chroma
//! subsampling, restart markers, and optimal Huffman table rebuild after
//! coefficient modification. Progressive, arithmetic-coded, lossless, and
//! 12-bit files are rejected at parse time.

pub mod bitio;
pub mod dct;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod marker;
pub mod scan;
pub mod tables;
pub mod zigzag;

use dct::DctGrid;
use error::{JpegError, Result};
use frame::FrameInfo;
use huffman::encode_value;
use marker::{iterate_markers, parse_dri, parse_sos, MarkerSegment};
use scan::ScanComponent;
use tables::{parse_dht, parse_dqt, HuffmanSpec};
use zigzag::NATURAL_TO_ZIGZAG;

/// A decoded baseline JPEG exposing its quantized DCT coefficients.
///
/// Parse with [`JpegImage::from_bytes`], mutate grids through
/// [`JpegImage::dct_grid_mut`], then serialize with [`JpegImage::to_bytes`].
/// If the mutation may have introduced DC/AC symbols absent from the
/// original entropy tables, call [`JpegImage::rebuild_huffman_tables`]
/// before serializing.
#[derive(Clone)]
pub struct JpegImage {
    frame: FrameInfo,
    /// One grid per scan component, in scan order (0 = luminance).
    grids: Vec<DctGrid>,
    quant_tables: [Option<dct::QuantTable>; 4],
    dc_huff_specs: [Option<HuffmanSpec>; 4],
    ac_huff_specs: [Option<HuffmanSpec>; 4],
    scan_components: Vec<ScanComponent>,
    restart_interval: u16,
    /// Header segments between SOI and SOS, preserved verbatim and in order.
    raw_segments: Vec<MarkerSegment>,
    /// SOS header body, for exact reconstruction.
    sos_data: Vec<u8>,
}

impl JpegImage {
    /// Parse a baseline JPEG from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (entries, scan_start) = iterate_markers(data)?;

        let mut frame_info: Option<FrameInfo> = None;
        let mut quant_tables: [Option<dct::QuantTable>; 4] = [None, None, None, None];
        let mut dc_huff_specs: [Option<HuffmanSpec>; 4] = [None, None, None, None];
        let mut ac_huff_specs: [Option<HuffmanSpec>; 4] = [None, None, None, None];
        let mut restart_interval: u16 = 0;
        let mut raw_segments = Vec::new();
        let mut sos_data = Vec::new();
        let mut scan_components = Vec::new();

        for entry in &entries {
            match entry.marker {
                marker::SOI | marker::EOI => {}
                marker::DQT => {
                    raw_segments.push(MarkerSegment {
                        marker: entry.marker,
                        data: entry.data.clone(),
                    });
                    for (id, qt) in parse_dqt(&entry.data)? {
                        quant_tables[id as usize] = Some(qt);
                    }
                }
                marker::DHT => {
                    raw_segments.push(MarkerSegment {
                        marker: entry.marker,
                        data: entry.data.clone(),
                    });
                    for spec in parse_dht(&entry.data)? {
                        let id = spec.id as usize;
                        if spec.class == 0 {
                            dc_huff_specs[id] = Some(spec);
                        } else {
                            ac_huff_specs[id] = Some(spec);
                        }
                    }
                }
                marker::SOF0 => {
                    raw_segments.push(MarkerSegment {
                        marker: entry.marker,
                        data: entry.data.clone(),
                    });
                    frame_info = Some(frame::parse_sof(&entry.data)?);
                }
                marker::DRI => {
                    raw_segments.push(MarkerSegment {
                        marker: entry.marker,
                        data: entry.data.clone(),
                    });
                    restart_interval = parse_dri(&entry.data)?;
                }
                marker::SOS => {
                    sos_data = entry.data.clone();
                    let fi = frame_info
                        .as_ref()
                        .ok_or(JpegError::InvalidMarkerData("SOS before SOF"))?;

                    for (comp_id, dc_id, ac_id) in parse_sos(&entry.data)? {
                        let comp_idx = fi
                            .components
                            .iter()
                            .position(|c| c.id == comp_id)
                            .ok_or(JpegError::UnknownComponentId(comp_id))?;
                        scan_components.push(ScanComponent {
                            comp_idx,
                            dc_table: dc_id as usize,
                            ac_table: ac_id as usize,
                        });
                    }
                }
                _ => {
                    // APPn, COM, and anything else: keep verbatim
                    raw_segments.push(MarkerSegment {
                        marker: entry.marker,
                        data: entry.data.clone(),
                    });
                }
            }
        }

        let fi = frame_info.ok_or(JpegError::InvalidMarkerData("no SOF marker found"))?;

        let (grids, _end_pos) = scan::decode_scan(
            data,
            scan_start,
            &fi,
            &scan_components,
            &dc_huff_specs,
            &ac_huff_specs,
            restart_interval,
        )?;

        Ok(Self {
            frame: fi,
            grids,
            quant_tables,
            dc_huff_specs,
            ac_huff_specs,
            scan_components,
            restart_interval,
            raw_segments,
            sos_data,
        })
    }

    /// Serialize back to JPEG bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        out.push(0xFF);
        out.push(marker::SOI);

        for seg in &self.raw_segments {
            out.push(0xFF);
            out.push(seg.marker);
            let length = (seg.data.len() + 2) as u16;
            out.extend_from_slice(&length.to_be_bytes());
            out.extend_from_slice(&seg.data);
        }

        out.push(0xFF);
        out.push(marker::SOS);
        let sos_length = (self.sos_data.len() + 2) as u16;
        out.extend_from_slice(&sos_length.to_be_bytes());
        out.extend_from_slice(&self.sos_data);

        let scan_bytes = scan::encode_scan(
            &self.frame,
            &self.scan_components,
            &self.grids,
            &self.dc_huff_specs,
            &self.ac_huff_specs,
            self.restart_interval,
        )?;
        out.extend_from_slice(&scan_bytes);

        out.push(0xFF);
        out.push(marker::EOI);

        Ok(out)
    }

    /// Coefficient grid of a scan component (0 = luminance by convention).
    pub fn dct_grid(&self, component: usize) -> &DctGrid {
        &self.grids[component]
    }

    /// Mutable coefficient grid of a scan component.
    pub fn dct_grid_mut(&mut self, component: usize) -> &mut DctGrid {
        &mut self.grids[component]
    }

    pub fn frame_info(&self) -> &FrameInfo {
        &self.frame
    }

    pub fn quant_table(&self, id: usize) -> Option<&dct::QuantTable> {
        self.quant_tables[id].as_ref()
    }

    /// Number of components in the scan.
    pub fn num_components(&self) -> usize {
        self.grids.len()
    }

    /// Rebuild optimal Huffman tables from the current coefficient data.
    ///
    /// After LSB modification a block may need a DC/AC symbol the carrier's
    /// optimized tables never defined. This recounts symbol frequencies by
    /// simulating the encode pass (including DC predictor resets at restart
    /// boundaries, which must match `encode_scan` exactly), builds fresh
    /// specs, and replaces the DHT segments in the preserved header.
    pub fn rebuild_huffman_tables(&mut self) {
        let mut dc_freq: [Vec<u32>; 4] = [vec![], vec![], vec![], vec![]];
        let mut ac_freq: [Vec<u32>; 4] = [vec![], vec![], vec![], vec![]];

        for sc in &self.scan_components {
            if dc_freq[sc.dc_table].is_empty() {
                dc_freq[sc.dc_table] = vec![0u32; 256];
            }
            if ac_freq[sc.ac_table].is_empty() {
                ac_freq[sc.ac_table] = vec![0u32; 256];
            }
        }

        let mut dc_pred = vec![0i32; self.scan_components.len()];
        let mut mcu_count = 0usize;

        for mcu_row in 0..self.frame.mcus_tall as usize {
            for mcu_col in 0..self.frame.mcus_wide as usize {
                if self.restart_interval > 0
                    && mcu_count > 0
                    && mcu_count % (self.restart_interval as usize) == 0
                {
                    for pred in &mut dc_pred {
                        *pred = 0;
                    }
                }

                for (sci, sc) in self.scan_components.iter().enumerate() {
                    let comp = &self.frame.components[sc.comp_idx];
                    for v in 0..comp.v_sampling as usize {
                        for h in 0..comp.h_sampling as usize {
                            let br = mcu_row * comp.v_sampling as usize + v;
                            let bc = mcu_col * comp.h_sampling as usize + h;
                            let block = self.grids[sci].block(br, bc);
                            let mut zz = [0i16; 64];
                            for ni in 0..64 {
                                zz[NATURAL_TO_ZIGZAG[ni]] = block[ni];
                            }

                            let dc_diff = (zz[0] as i32 - dc_pred[sci]) as i16;
                            dc_pred[sci] = zz[0] as i32;
                            let (_, dc_size) = encode_value(dc_diff);
                            dc_freq[sc.dc_table][dc_size as usize] += 1;

                            let mut k = 1;
                            while k < 64 {
                                let mut run = 0usize;
                                while k + run < 64 && zz[k + run] == 0 {
                                    run += 1;
                                }
                                if k + run >= 64 {
                                    ac_freq[sc.ac_table][0x00] += 1; // EOB
                                    break;
                                }
                                while run >= 16 {
                                    ac_freq[sc.ac_table][0xF0] += 1; // ZRL
                                    run -= 16;
                                    k += 16;
                                }
                                k += run;
                                let (_, ac_size) = encode_value(zz[k]);
                                let rs = ((run as u8) << 4) | ac_size;
                                ac_freq[sc.ac_table][rs as usize] += 1;
                                k += 1;
                            }
                        }
                    }
                }

                mcu_count += 1;
            }
        }

        for (id, freq) in dc_freq.iter().enumerate() {
            if !freq.is_empty() {
                self.dc_huff_specs[id] = Some(build_huffman_spec(0, id as u8, freq));
            }
        }
        for (id, freq) in ac_freq.iter().enumerate() {
            if !freq.is_empty() {
                self.ac_huff_specs[id] = Some(build_huffman_spec(1, id as u8, freq));
            }
        }

        // One fresh DHT segment holding every table, inserted before SOF0
        self.raw_segments.retain(|s| s.marker != marker::DHT);
        let sof_pos = self
            .raw_segments
            .iter()
            .position(|s| s.marker == marker::SOF0)
            .unwrap_or(self.raw_segments.len());

        let mut dht_data = Vec::new();
        for specs in [&self.dc_huff_specs, &self.ac_huff_specs] {
            for spec in specs.iter().flatten() {
                dht_data.extend_from_slice(&spec.to_dht_bytes());
            }
        }

        self.raw_segments.insert(
            sof_pos,
            MarkerSegment {
                marker: marker::DHT,
                data: dht_data,
            },
        );
    }
}

/// Build an optimal Huffman spec from symbol frequencies.
///
/// JPEG Annex K (Figures K.1-K.4) with the libjpeg pseudo-symbol trick: a
/// dummy symbol 256 with frequency 1 joins tree construction so no real
/// symbol receives the all-ones codeword and the Kraft inequality stays
/// strict after code-length limiting.
fn build_huffman_spec(class: u8, id: u8, freq: &[u32]) -> HuffmanSpec {
    use std::collections::VecDeque;

    // u16 symbols so the pseudo-symbol 256 fits
    let mut symbols: Vec<(u16, u32)> = freq
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f > 0)
        .map(|(sym, &f)| (sym as u16, f))
        .collect();

    if symbols.is_empty() {
        // Symbol 0 is EOB for AC tables and size-0 for DC tables
        symbols.push((0, 1));
    }

    if symbols.len() == 1 {
        // A lone symbol still needs a real 1-bit code
        let sym = symbols[0].0 as u8;
        return HuffmanSpec {
            class,
            id,
            bits: [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            huffval: vec![sym],
        };
    }

    symbols.push((256, 1));
    let n = symbols.len();

    // Ties broken by symbol number: 256 sorts after real freq-1 symbols and
    // therefore takes the longest code.
    symbols.sort_by_key(|&(sym, f)| (f, sym));

    // Two-queue Huffman merge
    let total_nodes = 2 * n - 1;
    let mut parent = vec![0usize; total_nodes];
    let mut next_internal = n;

    let mut q1: VecDeque<(u64, usize)> = symbols
        .iter()
        .enumerate()
        .map(|(idx, &(_, f))| (f as u64, idx))
        .collect();
    let mut q2: VecDeque<(u64, usize)> = VecDeque::new();

    let pick_min = |q1: &mut VecDeque<(u64, usize)>, q2: &mut VecDeque<(u64, usize)>| -> (u64, usize) {
        match (q1.front(), q2.front()) {
            (Some(&a), Some(&b)) => {
                if a.0 <= b.0 {
                    q1.pop_front().unwrap()
                } else {
                    q2.pop_front().unwrap()
                }
            }
            (Some(_), None) => q1.pop_front().unwrap(),
            (None, Some(_)) => q2.pop_front().unwrap(),
            (None, None) => unreachable!(),
        }
    };

    for _ in 0..(n - 1) {
        let (f1, idx1) = pick_min(&mut q1, &mut q2);
        let (f2, idx2) = pick_min(&mut q1, &mut q2);
        parent[idx1] = next_internal;
        parent[idx2] = next_internal;
        q2.push_back((f1 + f2, next_internal));
        next_internal += 1;
    }

    // Code length = leaf depth
    let root = total_nodes - 1;
    let mut code_lengths = vec![0u8; n];
    for (i, len) in code_lengths.iter_mut().enumerate() {
        let mut depth = 0u8;
        let mut node = i;
        while node != root {
            node = parent[node];
            depth += 1;
        }
        *len = depth;
    }

    // Annex K.3 Adjust_BITS: squeeze lengths above 16 down
    let max_len = code_lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut bits_count = vec![0u32; max_len + 1];
    for &len in &code_lengths {
        bits_count[len as usize] += 1;
    }

    if max_len > 16 {
        let mut i = max_len;
        while i > 16 {
            while bits_count[i] > 0 {
                let mut j = i - 2;
                while j > 0 && bits_count[j] == 0 {
                    j -= 1;
                }
                debug_assert!(j > 0, "no donor level; pseudo-symbol should prevent this");
                if j == 0 {
                    bits_count[16] += bits_count[i];
                    bits_count[i] = 0;
                    break;
                }
                bits_count[i] -= 2;
                bits_count[i - 1] += 1;
                bits_count[j + 1] += 2;
                bits_count[j] -= 1;
            }
            i -= 1;
        }

        // Longest codes to the least frequent symbols (lowest indices)
        let mut pos = 0;
        for len in (1..=16u8).rev() {
            for _ in 0..bits_count[len as usize] {
                code_lengths[pos] = len;
                pos += 1;
            }
        }
    }

    // Canonical ordering: (length, symbol), pseudo-symbol dropped
    let mut sym_len: Vec<(u16, u8)> = symbols
        .iter()
        .zip(code_lengths.iter())
        .map(|(&(sym, _), &len)| (sym, len))
        .collect();
    sym_len.sort_by_key(|&(sym, len)| (len, sym));

    let mut bits = [0u8; 16];
    let mut huffval = Vec::with_capacity(n);
    for &(sym, len) in &sym_len {
        if sym == 256 {
            continue;
        }
        if len > 0 && len <= 16 {
            bits[(len - 1) as usize] += 1;
            huffval.push(sym as u8);
        }
    }

    HuffmanSpec {
        class,
        id,
        bits,
        huffval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::huffman::HuffmanDecodeTable;

    #[test]
    fn spec_from_skewed_frequencies() {
        let mut freq = vec![0u32; 256];
        freq[0] = 1000;
        freq[1] = 500;
        freq[2] = 10;
        freq[3] = 1;
        let spec = build_huffman_spec(0, 0, &freq);

        // All four symbols present, decodable, and lengths within 16
        assert_eq!(spec.huffval.len(), 4);
        let total: usize = spec.bits.iter().map(|&b| b as usize).sum();
        assert_eq!(total, 4);
        assert!(HuffmanDecodeTable::build(&spec.bits, &spec.huffval).is_ok());
    }

    #[test]
    fn spec_from_single_symbol() {
        let mut freq = vec![0u32; 256];
        freq[0x31] = 42;
        let spec = build_huffman_spec(1, 0, &freq);
        assert_eq!(spec.bits[0], 1);
        assert_eq!(spec.huffval, vec![0x31]);
    }

    #[test]
    fn spec_from_empty_frequencies() {
        let freq = vec![0u32; 256];
        let spec = build_huffman_spec(1, 0, &freq);
        assert_eq!(spec.huffval, vec![0]);
    }

    #[test]
    fn spec_from_uniform_frequencies_stays_within_16_bits() {
        // All 256 symbols equally likely: lengths must still fit JPEG's cap
        let freq = vec![7u32; 256];
        let spec = build_huffman_spec(1, 0, &freq);
        assert_eq!(spec.huffval.len(), 256);
        let total: usize = spec.bits.iter().map(|&b| b as usize).sum();
        assert_eq!(total, 256);
    }
}
