// Copyright (c) 2026 The qrstego developers
// SPDX-License-Identifier: GPL-3.0-only

//! SOF0 frame header parsing: dimensions, components, sampling factors.

use super::error::{JpegError, Result};

/// One image component as declared by SOF0.
#[derive(Debug, Clone)]
pub struct Component {
    /// Component ID (conventionally 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1-4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1-4).
    pub v_sampling: u8,
    /// Quantization table ID (0-3).
    pub quant_table_id: u8,
}

/// Frame geometry parsed from the SOF0 marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Sample precision in bits; always 8 after parsing succeeds.
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Components in declaration order.
    pub components: Vec<Component>,
    /// Largest horizontal sampling factor.
    pub max_h_sampling: u8,
    /// Largest vertical sampling factor.
    pub max_v_sampling: u8,
    /// MCU width in pixels (max_h_sampling * 8).
    pub mcu_width: u16,
    /// MCU height in pixels (max_v_sampling * 8).
    pub mcu_height: u16,
    /// MCU columns.
    pub mcus_wide: u16,
    /// MCU rows.
    pub mcus_tall: u16,
}

impl FrameInfo {
    /// 8x8 block columns for a component, padded to full MCUs.
    pub fn blocks_wide(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_wide as usize) * (comp.h_sampling as usize)
    }

    /// 8x8 block rows for a component, padded to full MCUs.
    pub fn blocks_tall(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_tall as usize) * (comp.v_sampling as usize)
    }
}

/// Parse an SOF0 segment body (after the 2-byte length field).
pub fn parse_sof(data: &[u8]) -> Result<FrameInfo> {
    if data.len() < 6 {
        return Err(JpegError::UnexpectedEof);
    }

    let precision = data[0];
    if precision != 8 {
        return Err(JpegError::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if width == 0 || height == 0 {
        return Err(JpegError::InvalidDimensions);
    }
    if data.len() < 6 + num_components * 3 {
        return Err(JpegError::UnexpectedEof);
    }

    let mut components = Vec::with_capacity(num_components);
    let mut max_h = 0u8;
    let mut max_v = 0u8;

    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let sampling = data[offset + 1];
        let h_sampling = sampling >> 4;
        let v_sampling = sampling & 0x0F;
        let quant_table_id = data[offset + 2];

        if h_sampling == 0 || v_sampling == 0 || h_sampling > 4 || v_sampling > 4 {
            return Err(JpegError::InvalidDimensions);
        }
        if quant_table_id > 3 {
            return Err(JpegError::InvalidQuantTableId(quant_table_id));
        }

        max_h = max_h.max(h_sampling);
        max_v = max_v.max(v_sampling);

        components.push(Component {
            id,
            h_sampling,
            v_sampling,
            quant_table_id,
        });
    }

    let mcu_width = (max_h as u16) * 8;
    let mcu_height = (max_v as u16) * 8;
    let mcus_wide = (width + mcu_width - 1) / mcu_width;
    let mcus_tall = (height + mcu_height - 1) / mcu_height;

    Ok(FrameInfo {
        precision,
        height,
        width,
        components,
        max_h_sampling: max_h,
        max_v_sampling: max_v,
        mcu_width,
        mcu_height,
        mcus_wide,
        mcus_tall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ycbcr_420() {
        let data = [
            8, 1, 0xE0, 2, 0x80, 3, // precision=8, 480x640, 3 components
            1, 0x22, 0, // Y: 2x2, qt=0
            2, 0x11, 1, // Cb: 1x1, qt=1
            3, 0x11, 1, // Cr: 1x1, qt=1
        ];

        let fi = parse_sof(&data).unwrap();
        assert_eq!((fi.width, fi.height), (640, 480));
        assert_eq!(fi.components.len(), 3);
        assert_eq!((fi.mcu_width, fi.mcu_height), (16, 16));
        assert_eq!((fi.mcus_wide, fi.mcus_tall), (40, 30));
        // Luma blocks: 80x60, chroma: 40x30.
        assert_eq!((fi.blocks_wide(0), fi.blocks_tall(0)), (80, 60));
        assert_eq!((fi.blocks_wide(1), fi.blocks_tall(1)), (40, 30));
    }

    #[test]
    fn parse_grayscale() {
        let data = [8, 0, 64, 0, 64, 1, 1, 0x11, 0];
        let fi = parse_sof(&data).unwrap();
        assert_eq!(fi.components.len(), 1);
        assert_eq!((fi.mcus_wide, fi.mcus_tall), (8, 8));
    }

    #[test]
    fn non_mcu_aligned_rounds_up() {
        let data = [8, 0, 10, 0, 10, 1, 1, 0x11, 0];
        let fi = parse_sof(&data).unwrap();
        assert_eq!((fi.mcus_wide, fi.mcus_tall), (2, 2));
    }

    #[test]
    fn reject_non_8bit_precision() {
        let data = [12, 0, 8, 0, 8, 1, 1, 0x11, 0];
        assert!(matches!(
            parse_sof(&data),
            Err(JpegError::UnsupportedPrecision(12))
        ));
    }

    #[test]
    fn reject_zero_dimensions() {
        let data = [8, 0, 0, 0, 8, 1, 1, 0x11, 0];
        assert!(matches!(parse_sof(&data), Err(JpegError::InvalidDimensions)));
    }
}
