// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end single-carrier flows: QR path, encrypted QR path, and the
//! direct DCT path, all against synthetic carriers and the stub codec.

mod common;

use common::{synthetic_carrier, StubQrCodec};
use qrstego_core::stego::service::{
    embed_direct, embed_payload, embed_payload_encrypted, extract_direct, extract_payload,
    extract_payload_encrypted,
};
use qrstego_core::{EmbeddingStrategy, JpegImage, StegoError};

#[test]
fn hello_world_roundtrip_at_floor_size() {
    let carrier = synthetic_carrier(560, 560);
    let payload = b"Hello, World!";

    let (stego, result) = embed_payload(
        &carrier,
        payload,
        EmbeddingStrategy::SingleCoefficient,
        &StubQrCodec,
    )
    .unwrap();
    assert_eq!(result.actual_raster_size, 64);
    assert_eq!(result.data_area_bytes, 13);

    let recovered = extract_payload(&stego, &result, &StubQrCodec).unwrap();
    assert_eq!(recovered, payload);
}

#[test]
fn multi_coefficient_roundtrip() {
    let carrier = synthetic_carrier(320, 320);
    let payload: Vec<u8> = (0u8..=29).collect(); // 30 bytes, still size 64

    let (stego, result) = embed_payload(
        &carrier,
        &payload,
        EmbeddingStrategy::MultiCoefficient,
        &StubQrCodec,
    )
    .unwrap();
    assert_eq!(result.actual_raster_size, 64);

    let recovered = extract_payload(&stego, &result, &StubQrCodec).unwrap();
    assert_eq!(recovered, payload);
}

#[test]
fn untouched_coefficients_stay_byte_identical() {
    let carrier = synthetic_carrier(560, 560);
    let (stego, _) = embed_payload(
        &carrier,
        b"probe",
        EmbeddingStrategy::SingleCoefficient,
        &StubQrCodec,
    )
    .unwrap();

    let before = JpegImage::from_bytes(&carrier).unwrap();
    let after = JpegImage::from_bytes(&stego).unwrap();
    let (bg, ag) = (before.dct_grid(0), after.dct_grid(0));

    for br in 0..bg.blocks_tall() {
        for bc in 0..bg.blocks_wide() {
            for ci in 0..64 {
                let (b, a) = (bg.coeff(br, bc, ci), ag.coeff(br, bc, ci));
                if ci == 1 {
                    // The carrying coefficient may differ in its LSB only
                    assert_eq!(b & !1, a & !1, "block ({br},{bc}) coeff {ci}");
                } else {
                    assert_eq!(b, a, "block ({br},{bc}) coeff {ci}");
                }
            }
        }
    }
}

#[test]
fn oversized_payload_rejected_before_embedding() {
    let carrier = synthetic_carrier(64, 64);
    let payload = vec![0xAB; 5000];
    let err = embed_payload(
        &carrier,
        &payload,
        EmbeddingStrategy::MultiCoefficient,
        &StubQrCodec,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        StegoError::PayloadTooLarge { payload: 5000, max: 3500 }
    ));
}

#[test]
fn tiny_carrier_fails_with_capacity_exceeded() {
    // Planner clamps to raster 64, but a 100x100 carrier holds only
    // 13x13 = 169 payload bits under Single
    let carrier = synthetic_carrier(100, 100);
    let err = embed_payload(
        &carrier,
        b"Hello, World!",
        EmbeddingStrategy::SingleCoefficient,
        &StubQrCodec,
    )
    .unwrap_err();
    assert!(matches!(err, StegoError::CapacityExceeded { .. }));
}

#[test]
fn encrypted_roundtrip() {
    // 14-byte payload plus the 44-byte crypto envelope plans raster 96
    let carrier = synthetic_carrier(416, 416);
    let payload = b"hidden payload";

    let (stego, result) = embed_payload_encrypted(
        &carrier,
        payload,
        "passphrase",
        EmbeddingStrategy::MultiCoefficient,
        &StubQrCodec,
    )
    .unwrap();

    let recovered =
        extract_payload_encrypted(&stego, &result, "passphrase", &StubQrCodec).unwrap();
    assert_eq!(recovered, payload);

    assert!(matches!(
        extract_payload_encrypted(&stego, &result, "wrong", &StubQrCodec),
        Err(StegoError::DecryptionFailed)
    ));
}

#[test]
fn direct_path_roundtrip() {
    let carrier = synthetic_carrier(64, 64); // 64 blocks, 48 byte budget
    let payload = b"direct, no qr layer";

    let stego = embed_direct(&carrier, payload).unwrap();
    assert_eq!(extract_direct(&stego).unwrap(), payload);
}

#[test]
fn direct_path_over_capacity() {
    let carrier = synthetic_carrier(64, 64);
    let err = embed_direct(&carrier, &[0u8; 100]).unwrap_err();
    assert!(matches!(err, StegoError::CapacityExceeded { .. }));
}

#[test]
fn direct_path_detects_corruption() {
    let carrier = synthetic_carrier(64, 64);
    let stego = embed_direct(&carrier, b"fragile payload").unwrap();

    // Flip a payload-carrying coefficient LSB and re-encode
    let mut image = JpegImage::from_bytes(&stego).unwrap();
    let c = image.dct_grid(0).coeff(3, 0, 2);
    image.dct_grid_mut(0).set_coeff(3, 0, 2, c ^ 1);
    image.rebuild_huffman_tables();
    let tampered = image.to_bytes().unwrap();

    assert!(matches!(
        extract_direct(&tampered),
        Err(StegoError::ChecksumMismatch { .. })
    ));
}
