// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! QR-framed steganography in JPEG DCT coefficients.
//!
//! Payloads are encoded as QR symbols (through a caller-supplied
//! [`QrCodec`]), rastered, packed to bits, and embedded into the least
//! significant bits of quantized luminance DCT coefficients of a baseline
//! JPEG. The QR layer's error correction is what lets the payload survive
//! mild recompression; a direct coefficient path without it exists for
//! high-capacity, fragile embedding. Payloads larger than one carrier can
//! hold are chunked across several stego images, tied together by a
//! content-addressed metadata document.
//!
//! The crate is pure Rust. The bundled [`jpeg`] codec works entirely on
//! quantized coefficients, so embedding never decodes to pixels and never
//! re-runs quantization.
//!
//! ```no_run
//! use qrstego_core::{EmbeddingStrategy, QrCodec};
//! use qrstego_core::stego::service::{embed_payload, extract_payload};
//!
//! fn roundtrip(carrier: &[u8], codec: &dyn QrCodec) -> Result<(), Box<dyn std::error::Error>> {
//!     let (stego, result) =
//!         embed_payload(carrier, b"Hello, World!", EmbeddingStrategy::SingleCoefficient, codec)?;
//!     let payload = extract_payload(&stego, &result, codec)?;
//!     assert_eq!(payload, b"Hello, World!");
//!     Ok(())
//! }
//! ```

pub mod jpeg;
pub mod stego;

pub use jpeg::JpegImage;
pub use stego::{
    EmbedResult, EmbeddingStrategy, MultiQrMetadata, QrCodec, QrEccLevel, Raster, RasterPlan,
    ReassemblyMode, ReassemblyReport, StegoError,
};
