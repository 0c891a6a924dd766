// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Multi-carrier chunk protocol.
//!
//! Payloads too large for one carrier are split into fixed-size chunks,
//! each embedded into its own stego image and addressed by the SHA-256 of
//! its content. A JSON metadata document ties the set together: it records
//! every chunk's hash, size, and grid position, plus the hash order needed
//! to concatenate them back, and a whole-payload checksum verified after
//! reassembly.
//!
//! `hash_order` is authoritative for reconstruction. `chunk_hashes` is a
//! map keyed by hash, so identical chunks share one entry; order never
//! depends on hash values.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::capacity::QrEccLevel;
use super::error::StegoError;

/// Metadata format version this build reads and writes.
pub const METADATA_VERSION: u32 = 1;

/// Split a payload into contiguous chunks of `chunk_size` bytes; the last
/// chunk may be shorter. Empty input yields no chunks.
pub fn split(data: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    if chunk_size == 0 {
        return Vec::new();
    }
    data.chunks(chunk_size).collect()
}

/// SHA-256 of a byte slice, lowercase hex.
pub fn chunk_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Deterministic stego file name for a chunk.
pub fn chunk_file_name(index: usize, hash: &str) -> String {
    format!("chunk_{index}_{}.jpg", &hash[..hash.len().min(8)])
}

/// Per-chunk record inside the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub index: usize,
    /// (row, col) in the presentation grid.
    pub position: (usize, usize),
    /// Chunk length in bytes.
    pub size: usize,
    /// SHA-256 hex of the chunk bytes.
    pub hash: String,
    /// File name of the stego image carrying this chunk.
    pub file_name: String,
}

/// The metadata document for a chunked payload.
///
/// Serialized as JSON with these exact field names; they are part of the
/// wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiQrMetadata {
    pub version: u32,
    pub total_chunks: usize,
    /// Presentation grid columns, `ceil(sqrt(total_chunks))`.
    pub grid_size: usize,
    /// Nominal chunk size; the final chunk may be shorter.
    pub chunk_size: usize,
    /// Total payload length before chunking.
    pub total_data_size: usize,
    /// Chunk records keyed by content hash.
    pub chunk_hashes: BTreeMap<String, ChunkInfo>,
    /// Hashes in payload order; authoritative for reassembly.
    pub hash_order: Vec<String>,
    /// QR ECC level the chunks were encoded with ("highest" / "high").
    pub ecc_level: String,
    /// Payload compression before chunking ("none" / "brotli").
    pub compression: String,
    /// SHA-256 hex of the whole payload before chunking.
    pub checksum: String,
    /// Unix seconds at metadata creation.
    pub timestamp: u64,
}

impl MultiQrMetadata {
    /// Build metadata for a payload split into `chunk_size`-byte chunks.
    ///
    /// Deterministic apart from `timestamp`: same payload and parameters
    /// give the same hashes, order, positions, and file names.
    pub fn build(
        data: &[u8],
        chunk_size: usize,
        ecc: QrEccLevel,
        compression: &str,
    ) -> Result<Self, StegoError> {
        if chunk_size == 0 {
            return Err(StegoError::InvalidMetadata("chunk size must be non-zero"));
        }

        let chunks = split(data, chunk_size);
        let total_chunks = chunks.len();
        let grid_size = grid_columns(total_chunks);

        let mut chunk_hashes = BTreeMap::new();
        let mut hash_order = Vec::with_capacity(total_chunks);

        for (index, chunk) in chunks.iter().enumerate() {
            let hash = chunk_hash(chunk);
            hash_order.push(hash.clone());
            // First occurrence wins for duplicate chunk content
            chunk_hashes.entry(hash.clone()).or_insert_with(|| ChunkInfo {
                index,
                position: (index / grid_size, index % grid_size),
                size: chunk.len(),
                file_name: chunk_file_name(index, &hash),
                hash,
            });
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Self {
            version: METADATA_VERSION,
            total_chunks,
            grid_size,
            chunk_size,
            total_data_size: data.len(),
            chunk_hashes,
            hash_order,
            ecc_level: ecc.as_str().to_string(),
            compression: compression.to_string(),
            checksum: chunk_hash(data),
            timestamp,
        })
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, StegoError> {
        serde_json::to_vec(self).map_err(|_| StegoError::InvalidMetadata("serialization failed"))
    }

    /// Parse and sanity-check a JSON metadata document.
    pub fn from_json(data: &[u8]) -> Result<Self, StegoError> {
        let meta: Self = serde_json::from_slice(data)
            .map_err(|_| StegoError::InvalidMetadata("not a metadata document"))?;
        meta.check()?;
        Ok(meta)
    }

    /// Internal consistency checks, applied to anything read off the wire.
    pub fn check(&self) -> Result<(), StegoError> {
        if self.version != METADATA_VERSION {
            return Err(StegoError::InvalidMetadata("unsupported metadata version"));
        }
        if self.hash_order.len() != self.total_chunks {
            return Err(StegoError::InvalidMetadata(
                "hash_order length disagrees with total_chunks",
            ));
        }
        for hash in &self.hash_order {
            if !self.chunk_hashes.contains_key(hash) {
                return Err(StegoError::InvalidMetadata(
                    "hash_order references an undeclared hash",
                ));
            }
        }
        let declared: usize = self.hash_order.iter().map(|h| self.chunk_hashes[h].size).sum();
        if declared != self.total_data_size {
            return Err(StegoError::InvalidMetadata(
                "chunk sizes do not sum to total_data_size",
            ));
        }
        Ok(())
    }

    /// Validate one recovered chunk against the metadata.
    ///
    /// Checks the content hash against `claimed_hash` first, then that the
    /// hash is declared, then the size.
    pub fn validate_chunk(&self, data: &[u8], claimed_hash: &str) -> Result<(), StegoError> {
        let actual = chunk_hash(data);
        if actual != claimed_hash {
            return Err(StegoError::HashMismatch {
                expected: claimed_hash.to_string(),
                actual,
            });
        }
        let info = self
            .chunk_hashes
            .get(claimed_hash)
            .ok_or_else(|| StegoError::UnknownHash(claimed_hash.to_string()))?;
        if data.len() != info.size {
            return Err(StegoError::SizeMismatch {
                expected: info.size,
                actual: data.len(),
            });
        }
        Ok(())
    }
}

fn grid_columns(total_chunks: usize) -> usize {
    ((total_chunks as f64).sqrt().ceil() as usize).max(1)
}

/// What to do when a chunk cannot be recovered or fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyMode {
    /// Any missing or invalid chunk aborts reassembly.
    Strict,
    /// Log a warning, skip the chunk, and keep going.
    BestEffort,
}

/// Outcome of a reassembly pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassemblyReport {
    pub recovered: usize,
    pub total: usize,
}

impl ReassemblyReport {
    pub fn is_complete(&self) -> bool {
        self.recovered == self.total
    }
}

/// Reassemble a payload from chunks fetched through `provider`.
///
/// Chunks are requested by hash in `hash_order` order and concatenated.
/// `provider` returns `None` for chunks it cannot supply. In `Strict`
/// mode the first failure aborts; in `BestEffort` mode failures are
/// logged and skipped, and the payload checksum is only verified when
/// every chunk was recovered.
pub fn reassemble<F>(
    metadata: &MultiQrMetadata,
    mut provider: F,
    mode: ReassemblyMode,
) -> Result<(Vec<u8>, ReassemblyReport), StegoError>
where
    F: FnMut(&str) -> Option<Vec<u8>>,
{
    metadata.check()?;

    let total = metadata.hash_order.len();
    let mut out = Vec::with_capacity(metadata.total_data_size);
    let mut recovered = 0usize;

    for (index, hash) in metadata.hash_order.iter().enumerate() {
        let fetched = provider(hash);

        let chunk = match fetched {
            Some(data) => match metadata.validate_chunk(&data, hash) {
                Ok(()) => Some(data),
                Err(e) => match mode {
                    ReassemblyMode::Strict => return Err(e),
                    ReassemblyMode::BestEffort => {
                        warn!("chunk {index} failed validation, skipping: {e}");
                        None
                    }
                },
            },
            None => match mode {
                ReassemblyMode::Strict => {
                    return Err(StegoError::MissingChunks { recovered, total });
                }
                ReassemblyMode::BestEffort => {
                    warn!("chunk {index} ({hash}) missing, skipping");
                    None
                }
            },
        };

        if let Some(data) = chunk {
            out.extend_from_slice(&data);
            recovered += 1;
        }
    }

    let report = ReassemblyReport { recovered, total };

    if report.is_complete() {
        let actual = chunk_hash(&out);
        if actual != metadata.checksum {
            return Err(StegoError::ChecksumMismatch {
                expected: metadata.checksum.clone(),
                actual,
            });
        }
    }

    Ok((out, report))
}
