// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Steganographic channel and protocol layer.
//!
//! Layering, bottom up: [`strategy`] and [`capacity`] define the channel
//! geometry, [`planner`] picks a raster size, [`raster`] packs symbols to
//! bits, [`channel`] and [`direct`] move bits through DCT coefficients,
//! [`chunk`] splits large payloads across carriers, [`payload`] and
//! [`crypto`] transform payloads before embedding, and [`service`] wires
//! everything together.

pub mod capacity;
pub mod channel;
pub mod chunk;
pub mod crypto;
pub mod direct;
pub mod error;
pub mod payload;
pub mod planner;
pub mod raster;
pub mod service;
pub mod strategy;

pub use capacity::{block_capacity, qr_byte_capacity, QrEccLevel};
pub use channel::{embed_bits, extract_bits, EmbedResult};
pub use chunk::{MultiQrMetadata, ReassemblyMode, ReassemblyReport};
pub use error::StegoError;
pub use planner::{choose_raster_size, RasterPlan};
pub use raster::{bits_to_raster, raster_to_bits, Raster};
pub use service::QrCodec;
pub use strategy::EmbeddingStrategy;
