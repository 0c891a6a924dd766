// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! The codec invariant everything else rests on: parsing a baseline JPEG
//! and re-encoding it without touching any coefficient reproduces the
//! original file byte for byte.

mod common;

use common::synthetic_carrier;
use qrstego_core::jpeg::error::JpegError;
use qrstego_core::JpegImage;

#[test]
fn unmodified_image_roundtrips_byte_exact() {
    for (w, h) in [(64u16, 64u16), (96, 64), (200, 120)] {
        let original = synthetic_carrier(w, h);
        let image = JpegImage::from_bytes(&original).unwrap();
        let reencoded = image.to_bytes().unwrap();
        assert_eq!(reencoded, original, "{w}x{h}");
    }
}

#[test]
fn coefficients_survive_a_parse_cycle() {
    let original = synthetic_carrier(128, 128);
    let image = JpegImage::from_bytes(&original).unwrap();
    let reparsed = JpegImage::from_bytes(&image.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.dct_grid(0), image.dct_grid(0));
}

#[test]
fn modified_coefficient_survives_table_rebuild() {
    let original = synthetic_carrier(64, 64);
    let mut image = JpegImage::from_bytes(&original).unwrap();

    // Push a coefficient to a magnitude the original tables likely never
    // coded; the rebuild must produce tables that can carry it.
    image.dct_grid_mut(0).set_coeff(3, 3, 1, 1023);
    image.rebuild_huffman_tables();

    let reparsed = JpegImage::from_bytes(&image.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.dct_grid(0).coeff(3, 3, 1), 1023);
    assert_eq!(reparsed.dct_grid(0), image.dct_grid(0));
}

#[test]
fn non_block_aligned_dimensions() {
    let original = synthetic_carrier(100, 52);
    let image = JpegImage::from_bytes(&original).unwrap();
    assert_eq!(image.frame_info().width, 100);
    assert_eq!(image.frame_info().height, 52);
    // Grids pad to whole blocks
    assert_eq!(image.dct_grid(0).blocks_wide(), 13);
    assert_eq!(image.dct_grid(0).blocks_tall(), 7);
    assert_eq!(image.to_bytes().unwrap(), original);
}

#[test]
fn progressive_carrier_rejected() {
    let mut data = synthetic_carrier(64, 64);
    // Rewrite the SOF0 marker into SOF2
    let sof_pos = data
        .windows(2)
        .position(|w| w == [0xFF, 0xC0])
        .expect("SOF0 present");
    data[sof_pos + 1] = 0xC2;

    let err = JpegImage::from_bytes(&data).err().expect("progressive must fail");
    assert!(matches!(err, JpegError::UnsupportedMarker(0xC2)));
}

#[test]
fn truncated_file_rejected() {
    let data = synthetic_carrier(64, 64);
    assert!(JpegImage::from_bytes(&data[..data.len() / 2]).is_err());
    assert!(JpegImage::from_bytes(&[]).is_err());
}
