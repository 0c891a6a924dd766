// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the JPEG coefficient codec.

use std::fmt;

/// Errors raised while parsing or re-encoding a carrier JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// Input ended before the structure it promised.
    UnexpectedEof,
    /// No SOI (0xFFD8) at the start of the data.
    InvalidSoi,
    /// Marker for a JPEG flavor this codec does not handle
    /// (progressive, arithmetic, lossless, differential).
    UnsupportedMarker(u8),
    /// A marker segment with an inconsistent length or body.
    InvalidMarkerData(&'static str),
    /// Invalid Huffman code in the entropy-coded scan data.
    HuffmanDecode,
    /// Quantization table ID outside 0-3.
    InvalidQuantTableId(u8),
    /// Huffman table ID outside 0-3 or referenced but never defined.
    InvalidHuffmanTableId(u8),
    /// SOS references a component ID the SOF never declared.
    UnknownComponentId(u8),
    /// Zero dimensions or out-of-range sampling factors.
    InvalidDimensions,
    /// Sample precision other than 8-bit.
    UnsupportedPrecision(u8),
}

impl fmt::Display for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of JPEG data"),
            Self::InvalidSoi => write!(f, "missing SOI marker (not a JPEG)"),
            Self::UnsupportedMarker(m) => write!(f, "unsupported JPEG marker: 0xFF{m:02X}"),
            Self::InvalidMarkerData(msg) => write!(f, "invalid marker data: {msg}"),
            Self::HuffmanDecode => write!(f, "Huffman decode error"),
            Self::InvalidQuantTableId(id) => write!(f, "invalid quantization table ID: {id}"),
            Self::InvalidHuffmanTableId(id) => write!(f, "invalid Huffman table ID: {id}"),
            Self::UnknownComponentId(id) => write!(f, "unknown component ID in SOS: {id}"),
            Self::InvalidDimensions => write!(f, "invalid image dimensions or sampling factors"),
            Self::UnsupportedPrecision(p) => write!(f, "unsupported sample precision: {p}-bit"),
        }
    }
}

impl std::error::Error for JpegError {}

pub type Result<T> = std::result::Result<T, JpegError>;
