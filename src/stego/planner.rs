// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Raster size planning.
//!
//! Picks the smallest permitted QR raster that holds the payload, then
//! constrains it by what the carrier's DCT channel and pixel dimensions
//! can physically accommodate. ECC never degrades below [`QrEccLevel::High`]:
//! if the constrained raster cannot hold the payload at `High`, planning
//! fails instead of silently weakening error correction.

use log::debug;

use super::capacity::{
    block_capacity, qr_byte_capacity, raster_sizes, QrEccLevel, MAX_PAYLOAD_BYTES,
    MAX_RASTER_SIZE, MIN_RASTER_SIZE,
};
use super::error::StegoError;
use super::strategy::EmbeddingStrategy;

/// A planned raster: the size to render at and the ECC level to encode with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterPlan {
    pub size: u16,
    pub ecc: QrEccLevel,
}

/// Plan the raster for a payload of `payload_bytes` on a carrier of
/// `width` x `height` pixels under `strategy`.
///
/// The smallest size whose capacity covers the payload wins, trying
/// `Highest` ECC before `High` at each size. That size is then capped by
/// the DCT channel capacity (with 10% headroom for coefficient positions
/// a QR decoder cannot use) and by 80% of the smaller pixel dimension,
/// both rounded down to a multiple of 8. A cap below the required size is
/// a hard [`StegoError::PayloadTooLarge`].
pub fn choose_raster_size(
    width: u32,
    height: u32,
    payload_bytes: usize,
    strategy: EmbeddingStrategy,
) -> Result<RasterPlan, StegoError> {
    let mut required: Option<RasterPlan> = None;
    for size in raster_sizes() {
        // qr_byte_capacity is total on the permitted sizes
        let highest = qr_byte_capacity(size, QrEccLevel::Highest).unwrap_or(0) as usize;
        let high = qr_byte_capacity(size, QrEccLevel::High).unwrap_or(0) as usize;
        if payload_bytes <= highest {
            required = Some(RasterPlan {
                size,
                ecc: QrEccLevel::Highest,
            });
            break;
        }
        if payload_bytes <= high {
            required = Some(RasterPlan {
                size,
                ecc: QrEccLevel::High,
            });
            break;
        }
    }

    let required = required.ok_or(StegoError::PayloadTooLarge {
        payload: payload_bytes,
        max: MAX_PAYLOAD_BYTES,
    })?;

    let bits = block_capacity(width, height, strategy);
    let max_from_dct = round_down_to_8(((bits as f64 * 0.9).sqrt()).floor() as u32);
    let max_from_dims = (width.min(height) as f64 * 0.8).floor() as u32;

    let constrained = (required.size as u32)
        .min(max_from_dct)
        .min(max_from_dims);
    let constrained = round_down_to_8(constrained).clamp(MIN_RASTER_SIZE as u32, MAX_RASTER_SIZE as u32) as u16;

    debug!(
        "raster plan: payload={payload_bytes}B required={}@{} dct_cap={max_from_dct} dims_cap={max_from_dims} -> {constrained}",
        required.size,
        required.ecc.as_str()
    );

    if constrained < required.size {
        let max = qr_byte_capacity(constrained, QrEccLevel::High).unwrap_or(0) as usize;
        return Err(StegoError::PayloadTooLarge {
            payload: payload_bytes,
            max,
        });
    }

    Ok(RasterPlan {
        size: constrained,
        ecc: required.ecc,
    })
}

fn round_down_to_8(v: u32) -> u32 {
    v - (v % 8)
}
