// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Optional payload compression.
//!
//! Payloads are Brotli-compressed before chunking only when that actually
//! shrinks them; the chosen method travels in the metadata document's
//! `compression` field, not in the payload itself. Decompression is
//! size-limited against decompression bombs.

use std::io::{Read, Write};

use super::error::StegoError;

/// Wire name for the uncompressed method.
pub const COMPRESSION_NONE: &str = "none";
/// Wire name for Brotli.
pub const COMPRESSION_BROTLI: &str = "brotli";

/// Brotli quality (0-11). Payloads are small; max quality is cheap.
const BROTLI_QUALITY: u32 = 11;
/// Brotli window size exponent; 22 is the library default.
const BROTLI_LG_WINDOW_SIZE: u32 = 22;

/// Decompressed size ceiling.
pub const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// Compress the payload if that makes it smaller.
///
/// Returns the bytes to chunk plus the method name to record in metadata.
pub fn compress(data: &[u8]) -> (Vec<u8>, &'static str) {
    let mut compressed = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(
            &mut compressed,
            4096,
            BROTLI_QUALITY,
            BROTLI_LG_WINDOW_SIZE,
        );
        if writer.write_all(data).is_err() {
            return (data.to_vec(), COMPRESSION_NONE);
        }
    }

    if compressed.len() < data.len() {
        (compressed, COMPRESSION_BROTLI)
    } else {
        (data.to_vec(), COMPRESSION_NONE)
    }
}

/// Undo [`compress`] according to the metadata's `compression` field.
pub fn decompress(data: &[u8], method: &str) -> Result<Vec<u8>, StegoError> {
    match method {
        COMPRESSION_NONE => Ok(data.to_vec()),
        COMPRESSION_BROTLI => {
            let mut out = Vec::new();
            let decompressor = brotli::Decompressor::new(data, 4096);
            decompressor
                .take(MAX_DECOMPRESSED_SIZE as u64 + 1)
                .read_to_end(&mut out)
                .map_err(|_| StegoError::InvalidMetadata("Brotli stream corrupted"))?;
            if out.len() > MAX_DECOMPRESSED_SIZE {
                return Err(StegoError::InvalidMetadata(
                    "decompressed payload exceeds size limit",
                ));
            }
            Ok(out)
        }
        _ => Err(StegoError::InvalidMetadata("unknown compression method")),
    }
}
