// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the steganographic channel and protocol layer.
//!
//! [`StegoError`] covers all failure modes from JPEG parsing through
//! capacity planning, chunk reassembly, and decryption.

use core::fmt;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug)]
pub enum StegoError {
    /// The carrier could not be parsed as a baseline JPEG.
    InvalidJpeg(crate::jpeg::error::JpegError),
    /// The carrier has no luminance component to embed into.
    NoLuminanceChannel,
    /// The bitstream does not fit the carrier's coefficient capacity.
    CapacityExceeded {
        required_bits: u64,
        available_bits: u64,
    },
    /// The payload exceeds what any permitted raster size can hold.
    PayloadTooLarge { payload: usize, max: usize },
    /// A chunk's content hash does not match its declared hash.
    HashMismatch { expected: String, actual: String },
    /// The reassembled payload's checksum does not match the metadata.
    ChecksumMismatch { expected: String, actual: String },
    /// A chunk's size does not match its declared size.
    SizeMismatch { expected: usize, actual: usize },
    /// A chunk hash that the metadata never declared.
    UnknownHash(String),
    /// Strict reassembly aborted with chunks missing or corrupted.
    MissingChunks { recovered: usize, total: usize },
    /// The metadata document is malformed or internally inconsistent.
    InvalidMetadata(&'static str),
    /// AES-GCM-SIV decryption failed (wrong passphrase or corrupted data).
    DecryptionFailed,
    /// Filesystem I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJpeg(e) => write!(f, "invalid JPEG: {e}"),
            Self::NoLuminanceChannel => write!(f, "carrier has no luminance channel"),
            Self::CapacityExceeded {
                required_bits,
                available_bits,
            } => write!(
                f,
                "bitstream needs {required_bits} bits but carrier holds {available_bits}"
            ),
            Self::PayloadTooLarge { payload, max } => {
                write!(f, "payload of {payload} bytes exceeds maximum of {max}")
            }
            Self::HashMismatch { expected, actual } => {
                write!(f, "chunk hash mismatch: expected {expected}, got {actual}")
            }
            Self::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "payload checksum mismatch: expected {expected}, got {actual}"
                )
            }
            Self::SizeMismatch { expected, actual } => {
                write!(f, "chunk size mismatch: expected {expected}, got {actual}")
            }
            Self::UnknownHash(hash) => write!(f, "hash {hash} not present in metadata"),
            Self::MissingChunks { recovered, total } => {
                write!(f, "only {recovered} of {total} chunks recovered")
            }
            Self::InvalidMetadata(msg) => write!(f, "invalid metadata: {msg}"),
            Self::DecryptionFailed => write!(f, "decryption failed (wrong passphrase?)"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for StegoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidJpeg(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::jpeg::error::JpegError> for StegoError {
    fn from(e: crate::jpeg::error::JpegError) -> Self {
        Self::InvalidJpeg(e)
    }
}

impl From<std::io::Error> for StegoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
