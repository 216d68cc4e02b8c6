/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Screen memory decoders producing indexed images.
//!
//! All decoders read a fixed amount of data starting at the given buffer offset and fail
//! with [ImageDecodeError::OutOfRange] if the data doesn't fit in the buffer.
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use snaview_core::reader::region;
use snaview_core::video::{
    color_line_offset, pixel_line_offset, ula_colors,
    ImageDecodeError, IndexedImage, Layer2Mode, Palette, ZxColor,
    LORES_SIZE, PIXELS_SIZE, SCREEN_SIZE, TIMEX_SCREEN_SIZE
};

/// The width of the ULA screen in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// The height of the ULA screen in pixels.
pub const SCREEN_HEIGHT: usize = 192;
/// Returns the ULA palette index of the INK and PAPER colors of `attr`.
#[inline]
fn attr_indices(attr: u8) -> (u8, u8) {
    let bright = (attr & 0x40) >> 3;
    (attr & 7 | bright, (attr >> 3) & 7 | bright)
}

/// Writes 8 pixels of `bits`, most significant first, as `ink` or `paper`.
#[inline]
fn put_byte(pixels: &mut [u8], bits: u8, ink: u8, paper: u8) {
    for (i, pixel) in pixels.iter_mut().take(8).enumerate() {
        *pixel = if bits & (0x80 >> i) != 0 { ink } else { paper };
    }
}

/// Decodes the 256x192 ULA screen: a bitmap followed by 8x8 attributes.
///
/// The image uses the 16 ULA colors indexed by `bright << 3 | color`.
pub fn decode_ula_screen(data: &[u8], offset: usize) -> Result<IndexedImage, ImageDecodeError> {
    let screen = region(data, offset, SCREEN_SIZE)?;
    let mut image = IndexedImage::new(SCREEN_WIDTH, SCREEN_HEIGHT, ula_colors());
    for (y, line) in image.pixels.chunks_exact_mut(SCREEN_WIDTH).enumerate() {
        let bitmap = pixel_line_offset(y);
        let attrs = PIXELS_SIZE + color_line_offset(y);
        for (col, pixels) in line.chunks_exact_mut(8).enumerate() {
            let (ink, paper) = attr_indices(screen[attrs + col]);
            put_byte(pixels, screen[bitmap + col], ink, paper);
        }
    }
    Ok(image)
}

/// Decodes the Timex 512x192 two color screen.
///
/// Columns are interleaved from two bitmaps, the second one [PIXELS_SIZE] bytes after the
/// first. Both colors are bright, the paper being the complement of the `ink`.
pub fn decode_timex_hires(data: &[u8], offset: usize, ink: ZxColor) -> Result<IndexedImage, ImageDecodeError> {
    let screen = region(data, offset, TIMEX_SCREEN_SIZE)?;
    let palette = vec![ink.complement().rgb(true), ink.rgb(true)];
    let mut image = IndexedImage::new(2 * SCREEN_WIDTH, SCREEN_HEIGHT, palette);
    for (y, line) in image.pixels.chunks_exact_mut(2 * SCREEN_WIDTH).enumerate() {
        let bitmap = pixel_line_offset(y);
        for (col, pixels) in line.chunks_exact_mut(16).enumerate() {
            let (left, right) = pixels.split_at_mut(8);
            put_byte(left, screen[bitmap + col], 1, 0);
            put_byte(right, screen[PIXELS_SIZE + bitmap + col], 1, 0);
        }
    }
    Ok(image)
}

/// Decodes the Timex 256x192 hi-color screen: every bitmap byte has its own attribute
/// at the same offset in the second half of the data.
pub fn decode_timex_hicol(data: &[u8], offset: usize) -> Result<IndexedImage, ImageDecodeError> {
    let screen = region(data, offset, TIMEX_SCREEN_SIZE)?;
    let mut image = IndexedImage::new(SCREEN_WIDTH, SCREEN_HEIGHT, ula_colors());
    for (y, line) in image.pixels.chunks_exact_mut(SCREEN_WIDTH).enumerate() {
        let bitmap = pixel_line_offset(y);
        for (col, pixels) in line.chunks_exact_mut(8).enumerate() {
            let (ink, paper) = attr_indices(screen[PIXELS_SIZE + bitmap + col]);
            put_byte(pixels, screen[bitmap + col], ink, paper);
        }
    }
    Ok(image)
}

/// Decodes the Next Layer2 screen in the given `mode` using the 256 colors of `palette`.
pub fn decode_layer2(
        data: &[u8],
        offset: usize,
        mode: Layer2Mode,
        palette: &Palette
    ) -> Result<IndexedImage, ImageDecodeError>
{
    let src = region(data, offset, mode.data_size())?;
    let (width, height) = (mode.width(), mode.height());
    let mut image = IndexedImage::new(width, height, palette.colors().to_vec());
    match mode {
        Layer2Mode::Res256x192 => {
            image.pixels.copy_from_slice(src);
        }
        Layer2Mode::Res320x256 => {
            for (x, column) in src.chunks_exact(height).enumerate() {
                for (y, &index) in column.iter().enumerate() {
                    image.pixels[y * width + x] = index;
                }
            }
        }
        Layer2Mode::Res640x256 => {
            for (x2, column) in src.chunks_exact(height).enumerate() {
                for (y, &pair) in column.iter().enumerate() {
                    let at = y * width + 2 * x2;
                    image.pixels[at] = pair >> 4;
                    image.pixels[at + 1] = pair & 0x0F;
                }
            }
        }
    }
    Ok(image)
}

/// Decodes the Next 128x96 LoRes screen using the 256 colors of `palette`.
pub fn decode_lores(data: &[u8], offset: usize, palette: &Palette) -> Result<IndexedImage, ImageDecodeError> {
    let src = region(data, offset, LORES_SIZE)?;
    let mut image = IndexedImage::new(128, 96, palette.colors().to_vec());
    image.pixels.copy_from_slice(src);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaview_core::reader::OutOfRange;
    use snaview_core::video::Rgb;
    use crate::palette::default_palette;

    #[test]
    fn ula_screen_works() {
        let mut data = vec![0u8; 1 + SCREEN_SIZE];
        // top-left byte: ink on the leftmost pixel, bright red ink on blue paper
        data[1] = 0b1000_0001;
        data[1 + PIXELS_SIZE] = 0b0100_1010;
        // line 1 lives 256 bytes further
        data[1 + 256] = 0xFF;
        // the last attribute: white paper
        data[1 + SCREEN_SIZE - 1] = 0b0011_1000;
        let image = decode_ula_screen(&data, 1).unwrap();
        assert_eq!((image.width, image.height), (256, 192));
        assert_eq!(image.index_at(0, 0), 8 | 2);
        assert_eq!(image.index_at(1, 0), 8 | 1);
        assert_eq!(image.index_at(7, 0), 8 | 2);
        assert_eq!(image.rgb_at(0, 0), Rgb::new(0xFF, 0, 0));
        assert_eq!(image.index_at(3, 1), 8 | 2);
        assert_eq!(image.index_at(8, 0), 0);
        assert_eq!(image.index_at(255, 191), 7);
        assert_eq!(image.rgb_at(255, 191), Rgb::new(0xD7, 0xD7, 0xD7));
        assert_eq!(decode_ula_screen(&data, 2),
                   Err(ImageDecodeError::OutOfRange(OutOfRange { offset: 2, size: SCREEN_SIZE, len: SCREEN_SIZE + 1 })));
    }

    #[test]
    fn timex_hires_works() {
        let mut data = vec![0u8; TIMEX_SCREEN_SIZE];
        data[0] = 0x80;
        data[PIXELS_SIZE] = 0x01;
        data[pixel_line_offset(191usize) + 31] = 0x01;
        let image = decode_timex_hires(&data, 0, ZxColor::Blue).unwrap();
        assert_eq!((image.width, image.height), (512, 192));
        assert_eq!(image.palette, vec![Rgb::new(0xFF, 0xFF, 0), Rgb::new(0, 0, 0xFF)]);
        assert_eq!(image.index_at(0, 0), 1);
        assert_eq!(image.index_at(1, 0), 0);
        assert_eq!(image.index_at(15, 0), 1);
        assert_eq!(image.index_at(16, 0), 0);
        assert_eq!(image.index_at(503, 191), 1);
        assert!(decode_timex_hires(&data[1..], 0, ZxColor::White).is_err());
    }

    #[test]
    fn timex_hicol_works() {
        let mut data = vec![0u8; TIMEX_SCREEN_SIZE];
        data[256] = 0x0F;
        data[PIXELS_SIZE + 256] = 0b0111_0001;
        let image = decode_timex_hicol(&data, 0).unwrap();
        assert_eq!(image.index_at(0, 1), 8 | 6);
        assert_eq!(image.index_at(7, 1), 8 | 1);
        assert_eq!(image.index_at(0, 0), 0);
    }

    #[test]
    fn layer2_works() {
        let palette = default_palette();
        let data: Vec<u8> = (0..Layer2Mode::Res320x256.data_size()).map(|i| i as u8).collect();
        let image = decode_layer2(&data, 0, Layer2Mode::Res256x192, &palette).unwrap();
        assert_eq!(image.index_at(5, 1), 5);
        assert_eq!(image.rgb_at(3, 0), Rgb::new(0, 0, 192));
        let image = decode_layer2(&data, 0, Layer2Mode::Res320x256, &palette).unwrap();
        assert_eq!((image.width, image.height), (320, 256));
        assert_eq!(image.index_at(0, 5), 5);
        assert_eq!(image.index_at(1, 0), 0);
        assert_eq!(image.index_at(1, 1), 1);
        let mut data = vec![0u8; Layer2Mode::Res640x256.data_size()];
        data[0] = 0xAB;
        data[256] = 0xCD;
        let image = decode_layer2(&data, 0, Layer2Mode::Res640x256, &palette).unwrap();
        assert_eq!((image.width, image.height), (640, 256));
        assert_eq!(image.index_at(0, 0), 0x0A);
        assert_eq!(image.index_at(1, 0), 0x0B);
        assert_eq!(image.index_at(2, 0), 0x0C);
        assert_eq!(image.index_at(3, 0), 0x0D);
        assert!(decode_layer2(&data[..1000], 0, Layer2Mode::Res256x192, &palette).is_err());
    }

    #[test]
    fn lores_works() {
        let palette = default_palette();
        let mut data = vec![0u8; LORES_SIZE];
        data[128 + 3] = 0xE0;
        let image = decode_lores(&data, 0, &palette).unwrap();
        assert_eq!((image.width, image.height), (128, 96));
        assert_eq!(image.rgb_at(3, 1), Rgb::new(224, 0, 0));
        assert!(decode_lores(&data, 1, &palette).is_err());
    }
}
