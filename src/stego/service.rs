// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! Orchestration: carriers in, stego images out.
//!
//! This is the composition root tying the planner, raster codec, DCT
//! channel, and chunk protocol together, and the only module that touches
//! the filesystem. QR symbol generation and recognition stay behind the
//! [`QrCodec`] trait; the crate never renders or scans a symbol itself.

use std::fs;
use std::path::Path;

use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::jpeg::JpegImage;

use super::capacity::QrEccLevel;
use super::channel::{embed_bits, extract_bits, EmbedResult};
use super::chunk::{
    chunk_file_name, reassemble, split, MultiQrMetadata, ReassemblyMode, ReassemblyReport,
};
use super::direct;
use super::error::StegoError;
use super::payload;
use super::planner::choose_raster_size;
use super::raster::{bits_to_raster, raster_to_bits, Raster};
use super::strategy::EmbeddingStrategy;

/// QR symbol encode/decode collaborator.
///
/// Implementations wrap whatever QR library the application ships;
/// `encode` renders `data` as a symbol rastered at `size` x `size`
/// pixels, `decode` recognizes one raster back into its payload.
pub trait QrCodec {
    fn encode(&self, data: &[u8], size: u16, ecc: QrEccLevel) -> Result<Raster, StegoError>;
    fn decode(&self, raster: &Raster) -> Result<Vec<u8>, StegoError>;
}

/// Conventional metadata file name next to the chunk images.
pub const METADATA_FILE_NAME: &str = "metadata.json";

fn luminance_grid(image: &JpegImage) -> Result<usize, StegoError> {
    if image.num_components() == 0 {
        return Err(StegoError::NoLuminanceChannel);
    }
    Ok(0)
}

/// Embed a payload into a carrier JPEG through the QR path.
///
/// Plans the raster size against the carrier's dimensions, QR-encodes the
/// payload, packs the symbol to bits, embeds them into the luminance
/// coefficients, rebuilds the Huffman tables, and re-encodes. Returns the
/// stego JPEG and the [`EmbedResult`] the extractor needs.
pub fn embed_payload(
    carrier: &[u8],
    payload: &[u8],
    strategy: EmbeddingStrategy,
    codec: &dyn QrCodec,
) -> Result<(Vec<u8>, EmbedResult), StegoError> {
    let mut image = JpegImage::from_bytes(carrier)?;
    let luma = luminance_grid(&image)?;
    let frame = image.frame_info();

    let plan = choose_raster_size(
        frame.width as u32,
        frame.height as u32,
        payload.len(),
        strategy,
    )?;
    debug!(
        "embedding {} bytes at raster size {} ({})",
        payload.len(),
        plan.size,
        plan.ecc.as_str()
    );

    let raster = codec.encode(payload, plan.size, plan.ecc)?;
    let bits = raster_to_bits(&raster);
    embed_bits(image.dct_grid_mut(luma), &bits, strategy)?;
    image.rebuild_huffman_tables();

    let stego = image.to_bytes()?;
    let result = EmbedResult {
        actual_raster_size: plan.size,
        strategy,
        data_area_bytes: payload.len() as u32,
    };
    Ok((stego, result))
}

/// Extract a payload embedded by [`embed_payload`].
pub fn extract_payload(
    stego: &[u8],
    result: &EmbedResult,
    codec: &dyn QrCodec,
) -> Result<Vec<u8>, StegoError> {
    let image = JpegImage::from_bytes(stego)?;
    let luma = luminance_grid(&image)?;

    let size = result.actual_raster_size as usize;
    let byte_count = (size * size).div_ceil(8);
    let bits = extract_bits(image.dct_grid(luma), byte_count, result.strategy);
    let raster = bits_to_raster(&bits, result.actual_raster_size);
    codec.decode(&raster)
}

/// Encrypt with a passphrase, then embed.
pub fn embed_payload_encrypted(
    carrier: &[u8],
    payload: &[u8],
    passphrase: &str,
    strategy: EmbeddingStrategy,
    codec: &dyn QrCodec,
) -> Result<(Vec<u8>, EmbedResult), StegoError> {
    let envelope = super::crypto::encrypt(payload, passphrase);
    embed_payload(carrier, &envelope, strategy, codec)
}

/// Extract, then decrypt with a passphrase.
pub fn extract_payload_encrypted(
    stego: &[u8],
    result: &EmbedResult,
    passphrase: &str,
    codec: &dyn QrCodec,
) -> Result<Vec<u8>, StegoError> {
    let envelope = extract_payload(stego, result, codec)?;
    super::crypto::decrypt(&envelope, passphrase)
}

/// One stego image of a chunked payload.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub file_name: String,
    pub jpeg: Vec<u8>,
}

/// Split a payload into chunks and embed each into its own copy of the
/// same unmodified carrier.
///
/// The payload is Brotli-compressed first when that shrinks it. Output
/// order follows chunk index; with the `parallel` feature the per-chunk
/// embeds run on rayon, which does not change the ordering.
pub fn embed_chunks(
    carrier: &[u8],
    data: &[u8],
    chunk_size: usize,
    strategy: EmbeddingStrategy,
    codec: &(dyn QrCodec + Sync),
) -> Result<(Vec<EmbeddedChunk>, MultiQrMetadata), StegoError> {
    let (packed, compression) = payload::compress(data);
    let chunks = split(&packed, chunk_size);

    // ECC level per metadata: what the planner picks for a full-size chunk
    let image = JpegImage::from_bytes(carrier)?;
    luminance_grid(&image)?;
    let frame = image.frame_info();
    let probe = chunks.first().map_or(0, |c| c.len());
    let ecc = choose_raster_size(frame.width as u32, frame.height as u32, probe, strategy)?.ecc;
    drop(image);

    let metadata = MultiQrMetadata::build(&packed, chunk_size, ecc, compression)?;

    let embed_one = |(index, chunk): (usize, &&[u8])| -> Result<EmbeddedChunk, StegoError> {
        let (jpeg, _) = embed_payload(carrier, chunk, strategy, codec)?;
        let hash = &metadata.hash_order[index];
        Ok(EmbeddedChunk {
            file_name: chunk_file_name(index, hash),
            jpeg,
        })
    };

    #[cfg(feature = "parallel")]
    let embedded: Result<Vec<_>, _> = chunks.par_iter().enumerate().map(embed_one).collect();
    #[cfg(not(feature = "parallel"))]
    let embedded: Result<Vec<_>, _> = chunks.iter().enumerate().map(embed_one).collect();

    Ok((embedded?, metadata))
}

/// Recover a chunked payload from stego images in any order.
///
/// Each image is extracted, hashed, and matched against the metadata;
/// unrecognized or corrupted images are skipped with a warning. The
/// payload is then reassembled under `mode` and decompressed.
pub fn extract_chunks(
    images: &[Vec<u8>],
    metadata: &MultiQrMetadata,
    strategy: EmbeddingStrategy,
    mode: ReassemblyMode,
    codec: &dyn QrCodec,
) -> Result<(Vec<u8>, ReassemblyReport), StegoError> {
    metadata.check()?;

    // Chunks come in at most two sizes: chunk_size and the short tail
    let mut sizes: Vec<usize> = metadata
        .chunk_hashes
        .values()
        .map(|info| info.size)
        .collect();
    sizes.sort_unstable();
    sizes.dedup();

    let mut recovered: std::collections::HashMap<String, Vec<u8>> =
        std::collections::HashMap::new();

    for (img_index, stego) in images.iter().enumerate() {
        let image = match JpegImage::from_bytes(stego) {
            Ok(image) => image,
            Err(e) => {
                warn!("image {img_index} is not a usable carrier: {e}");
                continue;
            }
        };
        let luma = match luminance_grid(&image) {
            Ok(luma) => luma,
            Err(e) => {
                warn!("image {img_index} rejected: {e}");
                continue;
            }
        };
        let frame = image.frame_info();

        let mut matched = false;
        for &size in &sizes {
            let plan = match choose_raster_size(
                frame.width as u32,
                frame.height as u32,
                size,
                strategy,
            ) {
                Ok(plan) => plan,
                Err(_) => continue,
            };
            let raster_bytes = (plan.size as usize * plan.size as usize).div_ceil(8);
            let bits = extract_bits(image.dct_grid(luma), raster_bytes, strategy);
            let raster = bits_to_raster(&bits, plan.size);
            let chunk = match codec.decode(&raster) {
                Ok(chunk) => chunk,
                Err(_) => continue,
            };
            let hash = super::chunk::chunk_hash(&chunk);
            if metadata.chunk_hashes.contains_key(&hash) {
                recovered.insert(hash, chunk);
                matched = true;
                break;
            }
        }
        if !matched {
            warn!("image {img_index} matched no declared chunk");
        }
    }

    let (packed, report) = reassemble(metadata, |hash| recovered.get(hash).cloned(), mode)?;

    // Partial payloads can't be decompressed meaningfully
    if !report.is_complete() {
        return Ok((packed, report));
    }

    let data = payload::decompress(&packed, &metadata.compression)?;
    Ok((data, report))
}

/// Embed raw bytes through the direct DCT path (no QR layer).
pub fn embed_direct(carrier: &[u8], data: &[u8]) -> Result<Vec<u8>, StegoError> {
    let mut image = JpegImage::from_bytes(carrier)?;
    let luma = luminance_grid(&image)?;
    direct::embed_direct(image.dct_grid_mut(luma), data)?;
    image.rebuild_huffman_tables();
    Ok(image.to_bytes()?)
}

/// Extract bytes embedded by [`embed_direct`].
pub fn extract_direct(stego: &[u8]) -> Result<Vec<u8>, StegoError> {
    let image = JpegImage::from_bytes(stego)?;
    let luma = luminance_grid(&image)?;
    direct::extract_direct(image.dct_grid(luma))
}

/// Embed chunks and write the stego images plus `metadata.json` to a
/// directory.
pub fn embed_chunks_to_dir(
    carrier_path: &Path,
    data: &[u8],
    chunk_size: usize,
    strategy: EmbeddingStrategy,
    codec: &(dyn QrCodec + Sync),
    out_dir: &Path,
) -> Result<MultiQrMetadata, StegoError> {
    let carrier = fs::read(carrier_path)?;
    let (embedded, metadata) = embed_chunks(&carrier, data, chunk_size, strategy, codec)?;

    fs::create_dir_all(out_dir)?;
    for chunk in &embedded {
        fs::write(out_dir.join(&chunk.file_name), &chunk.jpeg)?;
    }
    fs::write(out_dir.join(METADATA_FILE_NAME), metadata.to_json()?)?;
    Ok(metadata)
}

/// Read `metadata.json` and every declared chunk image from a directory
/// and recover the payload.
pub fn extract_chunks_from_dir(
    dir: &Path,
    strategy: EmbeddingStrategy,
    mode: ReassemblyMode,
    codec: &dyn QrCodec,
) -> Result<(Vec<u8>, ReassemblyReport), StegoError> {
    let metadata = MultiQrMetadata::from_json(&fs::read(dir.join(METADATA_FILE_NAME))?)?;

    let mut images = Vec::new();
    for info in metadata.chunk_hashes.values() {
        match fs::read(dir.join(&info.file_name)) {
            Ok(bytes) => images.push(bytes),
            Err(e) => warn!("chunk image {} unreadable: {e}", info.file_name),
        }
    }

    extract_chunks(&images, &metadata, strategy, mode, codec)
}
