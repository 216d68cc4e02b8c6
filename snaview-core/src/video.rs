/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Video primitives: colors, palettes and indexed images.
use core::convert::TryFrom;
use core::fmt;
use core::ops::{BitAnd, BitOr, Shl, Shr};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

use crate::reader::OutOfRange;

/// The size of the INK/PAPER bitmap of the ULA screen.
pub const PIXELS_SIZE: usize = 6144;
/// The size of the attributes of the ULA screen.
pub const ATTRS_SIZE: usize = 768;
/// The size of the standard ULA screen: bitmap followed by attributes.
pub const SCREEN_SIZE: usize = PIXELS_SIZE + ATTRS_SIZE;
/// The size of the Timex hi-res and hi-color screen data.
pub const TIMEX_SCREEN_SIZE: usize = 2 * PIXELS_SIZE;
/// The size of the LoRes screen data.
pub const LORES_SIZE: usize = 128 * 96;
/// The number of entries in a Next palette.
pub const PALETTE_ENTRIES: usize = 256;
/// The size of the raw Next palette: 2 bytes per entry.
pub const PALETTE_SIZE: usize = 2 * PALETTE_ENTRIES;

/// Returns an offset into INK/PAPER bitmap memory of the given vertical coordinate `y` [0, 192) (0 on top).
#[inline(always)]
pub fn pixel_line_offset<T>(y: T) -> T
    where T: Copy + From<u16> + BitAnd<Output=T> + Shl<u16, Output=T> + BitOr<Output=T>
{
    (y & T::from(0b0000_0111) ) << 8 |
    (y & T::from(0b0011_1000) ) << 2 |
    (y & T::from(0b1100_0000) ) << 5
}

/// Returns an offset into attributes memory of the given vertical coordinate `y` [0, 192) (0 on top).
#[inline(always)]
pub fn color_line_offset<T>(y: T) -> T
    where T: Copy + From<u16> + Shr<u16, Output=T> + Shl<u16, Output=T>
{
    (y >> 3) << 5
}

/// A 24-bit RGB color.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
    /// Returns the color as an HTML-like string, e.g. `#00FF00`.
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb { r, g, b }
    }
}

/// The 8 basic ZX Spectrum colors.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ZxColor {
    Black   = 0,
    Blue    = 1,
    Red     = 2,
    Magenta = 3,
    Green   = 4,
    Cyan    = 5,
    Yellow  = 6,
    White   = 7,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TryFromU8ZxColorError(pub u8);

impl ZxColor {
    /// Returns the color with all color bits inverted.
    pub fn complement(self) -> Self {
        ZxColor::from_bits_truncate(!(self as u8))
    }
    /// Creates a color from bits `b0-b2` of `bits`.
    pub fn from_bits_truncate(bits: u8) -> Self {
        use ZxColor::*;
        match bits & 7 {
            0 => Black,
            1 => Blue,
            2 => Red,
            3 => Magenta,
            4 => Green,
            5 => Cyan,
            6 => Yellow,
            _ => White
        }
    }
    /// Returns the RGB value of this color.
    pub fn rgb(self, bright: bool) -> Rgb {
        let level = if bright { 0xFF } else { 0xD7 };
        let bits = self as u8;
        let component = |mask: u8| if bits & mask != 0 { level } else { 0 };
        Rgb::new(component(2), component(4), component(1))
    }
}

impl Default for ZxColor {
    fn default() -> Self {
        ZxColor::White
    }
}

impl fmt::Display for ZxColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ZxColor::*;
        f.write_str(match self {
            Black   => "BLACK",
            Blue    => "BLUE",
            Red     => "RED",
            Magenta => "MAGENTA",
            Green   => "GREEN",
            Cyan    => "CYAN",
            Yellow  => "YELLOW",
            White   => "WHITE",
        })
    }
}

impl std::error::Error for TryFromU8ZxColorError {}

impl fmt::Display for TryFromU8ZxColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converted integer ({}) out of range for `ZxColor`", self.0)
    }
}

impl TryFrom<u8> for ZxColor {
    type Error = TryFromU8ZxColorError;
    fn try_from(color: u8) -> Result<Self, Self::Error> {
        if color <= 7 {
            Ok(ZxColor::from_bits_truncate(color))
        }
        else {
            Err(TryFromU8ZxColorError(color))
        }
    }
}

impl From<ZxColor> for u8 {
    fn from(color: ZxColor) -> u8 {
        color as u8
    }
}

/// Returns the 16 ULA colors indexed by `bright << 3 | color`.
pub fn ula_colors() -> Vec<Rgb> {
    (0..16u8).map(|index| ZxColor::from_bits_truncate(index).rgb(index & 8 != 0))
             .collect()
}

/// A table of 256 RGB colors.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgb>,
}

impl Palette {
    /// Creates a palette from a function of the entry index.
    pub fn from_fn<F: FnMut(u8) -> Rgb>(mut f: F) -> Self {
        let entries = (0..PALETTE_ENTRIES).map(|index| f(index as u8)).collect();
        Palette { entries }
    }
    /// Returns the color of the entry at `index`.
    #[inline]
    pub fn get(&self, index: u8) -> Rgb {
        self.entries.get(usize::from(index)).copied().unwrap_or_default()
    }
    /// Returns all 256 colors.
    pub fn colors(&self) -> &[Rgb] {
        &self.entries
    }
}

/// An image with one palette index per pixel.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: usize,
    pub height: usize,
    /// Pixel color indices, row after row.
    pub pixels: Vec<u8>,
    pub palette: Vec<Rgb>,
}

impl IndexedImage {
    /// Creates a new image with all pixels set to index `0`.
    pub fn new(width: usize, height: usize, palette: Vec<Rgb>) -> Self {
        IndexedImage { width, height, pixels: vec![0; width * height], palette }
    }
    /// Returns the color index of the pixel at `x`, `y`.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }
    /// Returns the color of the pixel at `x`, `y`. Indices missing from the palette are black.
    pub fn rgb_at(&self, x: usize, y: usize) -> Rgb {
        let index = usize::from(self.index_at(x, y));
        self.palette.get(index).copied().unwrap_or_default()
    }
    /// Returns the image as packed 24-bit RGB data.
    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixels.len() * 3);
        for &index in self.pixels.iter() {
            let Rgb { r, g, b } = self.palette.get(usize::from(index)).copied().unwrap_or_default();
            rgb.extend_from_slice(&[r, g, b]);
        }
        rgb
    }
}

/// Resolutions of the Next Layer2 screen.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer2Mode {
    /// 256x192, 8 bits per pixel, row after row.
    Res256x192,
    /// 320x256, 8 bits per pixel, column after column.
    Res320x256,
    /// 640x256, 4 bits per pixel, column after column.
    Res640x256,
}

impl Layer2Mode {
    pub fn width(self) -> usize {
        match self {
            Layer2Mode::Res256x192 => 256,
            Layer2Mode::Res320x256 => 320,
            Layer2Mode::Res640x256 => 640,
        }
    }

    pub fn height(self) -> usize {
        match self {
            Layer2Mode::Res256x192 => 192,
            _ => 256,
        }
    }
    /// The size in bytes of the screen data.
    pub fn data_size(self) -> usize {
        match self {
            Layer2Mode::Res256x192 => 256 * 192,
            Layer2Mode::Res320x256|Layer2Mode::Res640x256 => 320 * 256,
        }
    }
}

impl fmt::Display for Layer2Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

/// The error returned when a screen or a palette couldn't be reconstructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageDecodeError {
    /// The image data extends past the end of the buffer.
    OutOfRange(OutOfRange),
    /// The palette data has a wrong size.
    PaletteSize(usize),
}

impl std::error::Error for ImageDecodeError {}

impl fmt::Display for ImageDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageDecodeError::OutOfRange(err) => write!(f, "image data incomplete: {}", err),
            ImageDecodeError::PaletteSize(size) => {
                write!(f, "palette data must be {} bytes, got {}", PALETTE_SIZE, size)
            }
        }
    }
}

impl From<OutOfRange> for ImageDecodeError {
    fn from(err: OutOfRange) -> Self {
        ImageDecodeError::OutOfRange(err)
    }
}
