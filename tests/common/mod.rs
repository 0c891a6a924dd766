// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Shared helpers for the integration suites: a synthetic baseline JPEG
//! builder (grayscale, standard Annex K tables, deterministic coefficient
//! noise) and a stub QR codec that frames payloads as `[u16 len][data]`
//! bitstreams instead of real QR symbols.

// Not every suite uses every helper.
#![allow(dead_code)]

use qrstego_core::jpeg::frame::parse_sof;
use qrstego_core::jpeg::scan::{encode_scan, ScanComponent};
use qrstego_core::jpeg::tables::HuffmanSpec;
use qrstego_core::jpeg::dct::DctGrid;
use qrstego_core::stego::capacity::QrEccLevel;
use qrstego_core::stego::raster::{bits_to_raster, raster_to_bits, Raster};
use qrstego_core::stego::service::QrCodec;
use qrstego_core::stego::error::StegoError;

/// Standard luminance DC table (ITU-T T.81 Table K.3).
pub fn std_dc_spec() -> HuffmanSpec {
    HuffmanSpec {
        class: 0,
        id: 0,
        bits: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
        huffval: (0..12).collect(),
    }
}

/// Standard luminance AC table (ITU-T T.81 Table K.5).
pub fn std_ac_spec() -> HuffmanSpec {
    let mut bits = [0u8; 16];
    bits.copy_from_slice(&[0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125]);
    let huffval: [u8; 162] = [
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
    HuffmanSpec {
        class: 1,
        id: 0,
        bits,
        huffval: huffval.to_vec(),
    }
}

fn push_segment(out: &mut Vec<u8>, marker: u8, body: &[u8]) {
    out.push(0xFF);
    out.push(marker);
    out.extend_from_slice(&((body.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(body);
}

/// Build a grayscale baseline JPEG of the given pixel dimensions with
/// deterministic coefficient noise, using the crate's own scan encoder.
pub fn synthetic_carrier(width: u16, height: u16) -> Vec<u8> {
    let sof_body = [
        8,
        (height >> 8) as u8,
        height as u8,
        (width >> 8) as u8,
        width as u8,
        1,    // one component
        1,    // component id
        0x11, // 1x1 sampling
        0,    // quant table 0
    ];
    let frame = parse_sof(&sof_body).expect("valid synthetic SOF");

    let mut grid = DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0));
    for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            grid.set_coeff(br, bc, 0, 40 + ((br * 3 + bc) % 17) as i16);
            // Sparse AC noise so blocks look like real photographic content
            for ci in 1..16 {
                let v = ((br * 31 + bc * 13 + ci * 7) % 11) as i16 - 5;
                grid.set_coeff(br, bc, ci, v);
            }
        }
    }

    let dc_specs = [Some(std_dc_spec()), None, None, None];
    let ac_specs = [Some(std_ac_spec()), None, None, None];
    let scan_components = vec![ScanComponent {
        comp_idx: 0,
        dc_table: 0,
        ac_table: 0,
    }];
    let scan_bytes = encode_scan(&frame, &scan_components, &[grid], &dc_specs, &ac_specs, 0)
        .expect("synthetic scan encodes");

    let mut out = vec![0xFF, 0xD8];

    let mut dqt_body = vec![0x00u8];
    dqt_body.extend(std::iter::repeat(16u8).take(64));
    push_segment(&mut out, 0xDB, &dqt_body);

    push_segment(&mut out, 0xC0, &sof_body);

    let mut dht_body = std_dc_spec().to_dht_bytes();
    dht_body.extend_from_slice(&std_ac_spec().to_dht_bytes());
    push_segment(&mut out, 0xC4, &dht_body);

    push_segment(&mut out, 0xDA, &[1, 1, 0x00, 0, 63, 0]);
    out.extend_from_slice(&scan_bytes);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Stand-in for a real QR library. Frames the payload as
/// `[u16 BE length][payload]` packed MSB-first into the raster, without
/// any error correction. Good enough to exercise the channel end to end.
pub struct StubQrCodec;

impl QrCodec for StubQrCodec {
    fn encode(&self, data: &[u8], size: u16, _ecc: QrEccLevel) -> Result<Raster, StegoError> {
        let capacity_bits = (size as usize) * (size as usize);
        let needed_bits = (2 + data.len()) * 8;
        if needed_bits > capacity_bits {
            return Err(StegoError::PayloadTooLarge {
                payload: data.len(),
                max: capacity_bits / 8 - 2,
            });
        }
        let mut framed = Vec::with_capacity(2 + data.len());
        framed.extend_from_slice(&(data.len() as u16).to_be_bytes());
        framed.extend_from_slice(data);
        Ok(bits_to_raster(&framed, size))
    }

    fn decode(&self, raster: &Raster) -> Result<Vec<u8>, StegoError> {
        let bits = raster_to_bits(raster);
        if bits.len() < 2 {
            return Err(StegoError::InvalidMetadata("raster too small to decode"));
        }
        let len = u16::from_be_bytes([bits[0], bits[1]]) as usize;
        if 2 + len > bits.len() {
            return Err(StegoError::InvalidMetadata("framed length out of range"));
        }
        Ok(bits[2..2 + len].to_vec())
    }
}
