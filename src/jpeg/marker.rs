// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! JPEG marker iteration.
//!
//! Walks the marker segments of a baseline JPEG from SOI up to and including
//! SOS, preserving unknown segments verbatim so that re-encoding keeps APPn
//! and comment data intact. Non-baseline frame types are rejected here,
//! before any scan decoding starts.

use super::error::{JpegError, Result};

/// Marker bytes (the byte after 0xFF).
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const SOS: u8 = 0xDA;

/// A marker segment kept verbatim for header reconstruction.
#[derive(Debug, Clone)]
pub struct MarkerSegment {
    /// Marker byte without the 0xFF prefix.
    pub marker: u8,
    /// Segment body without the marker or the 2-byte length field.
    pub data: Vec<u8>,
}

/// One marker encountered during iteration.
pub struct MarkerEntry {
    pub marker: u8,
    /// Segment body (empty for standalone markers such as SOI or RST).
    pub data: Vec<u8>,
}

/// Walk the markers of a baseline JPEG.
///
/// Returns the entries in file order plus the offset of the first
/// entropy-coded scan byte. Iteration stops at SOS; the scan decoder owns
/// everything after that.
pub fn iterate_markers(data: &[u8]) -> Result<(Vec<MarkerEntry>, usize)> {
    let mut entries = Vec::new();
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return Err(JpegError::InvalidSoi);
    }
    entries.push(MarkerEntry {
        marker: SOI,
        data: Vec::new(),
    });
    let mut pos = 2;

    loop {
        while pos < data.len() && data[pos] != 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }

        // Collapse fill 0xFF bytes
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            return Err(JpegError::UnexpectedEof);
        }

        let marker = data[pos + 1];
        pos += 2;

        // Stuffed 0xFF00 outside scan data: tolerate and move on
        if marker == 0x00 {
            continue;
        }

        // Standalone markers carry no length field
        if marker == EOI || (marker >= 0xD0 && marker <= 0xD7) {
            entries.push(MarkerEntry {
                marker,
                data: Vec::new(),
            });
            if marker == EOI {
                return Ok((entries, pos));
            }
            continue;
        }

        if is_unsupported(marker) {
            return Err(JpegError::UnsupportedMarker(marker));
        }

        if pos + 2 > data.len() {
            return Err(JpegError::UnexpectedEof);
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 || pos + length > data.len() {
            return Err(JpegError::InvalidMarkerData("invalid segment length"));
        }
        let segment_data = data[pos + 2..pos + length].to_vec();

        entries.push(MarkerEntry {
            marker,
            data: segment_data,
        });

        pos += length;

        if marker == SOS {
            return Ok((entries, pos));
        }
    }
}

/// Frame types this codec refuses: everything except baseline sequential.
fn is_unsupported(marker: u8) -> bool {
    matches!(
        marker,
        0xC1 // SOF1 extended sequential
        | 0xC2 // SOF2 progressive
        | 0xC3 // SOF3 lossless
        | 0xC5..=0xC7 // SOF5-7 differential
        | 0xC9..=0xCB // SOF9-11 arithmetic
        | 0xCD..=0xCF // SOF13-15 differential arithmetic
    )
}

/// Parse an SOS header body.
/// Returns (component_id, dc_table_id, ac_table_id) per scan component.
pub fn parse_sos(data: &[u8]) -> Result<Vec<(u8, u8, u8)>> {
    if data.is_empty() {
        return Err(JpegError::InvalidMarkerData("empty SOS"));
    }
    let num_components = data[0] as usize;
    if data.len() < 1 + num_components * 2 + 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let mut selectors = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 1 + i * 2;
        let comp_id = data[offset];
        let td_ta = data[offset + 1];
        selectors.push((comp_id, td_ta >> 4, td_ta & 0x0F));
    }

    Ok(selectors)
}

/// Parse a DRI (Define Restart Interval) body.
pub fn parse_dri(data: &[u8]) -> Result<u16> {
    if data.len() < 2 {
        return Err(JpegError::UnexpectedEof);
    }
    Ok(u16::from_be_bytes([data[0], data[1]]))
}
