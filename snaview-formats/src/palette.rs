/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! ZX Spectrum Next 9-bit palettes.
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use nom::combinator::{all_consuming, map};
use nom::multi::count;
use nom::number::complete::u8 as byte;
use nom::sequence::tuple;
use nom::IResult;

use snaview_core::node::{bits_string, Node, NodeKind, NodeValue};
use snaview_core::reader::region;
use snaview_core::video::{
    ImageDecodeError, IndexedImage, Palette, Rgb, PALETTE_ENTRIES, PALETTE_SIZE
};

/// A 9-bit palette entry.
///
/// The entry is stored in 2 bytes: `RRRG_GGBB`, `P000_000B`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PaletteEntry {
    /// 3-bit red level.
    pub red: u8,
    /// 3-bit green level.
    pub green: u8,
    /// 3-bit blue level.
    pub blue: u8,
    /// The Layer2 priority bit.
    pub priority: bool,
}

impl PaletteEntry {
    pub fn from_bytes(b0: u8, b1: u8) -> Self {
        PaletteEntry {
            red: b0 >> 5,
            green: (b0 >> 2) & 7,
            blue: ((b0 << 1) & 6) | (b1 & 1),
            priority: b1 & 0x80 != 0,
        }
    }
    /// Returns the entry as the raw 16-bit word: `P000_000B_RRRG_GGBB`.
    pub fn word(self) -> u16 {
        u16::from(self.priority) << 15 |
        u16::from(self.blue & 1) << 8 |
        u16::from(self.red) << 5 |
        u16::from(self.green) << 2 |
        u16::from(self.blue >> 1)
    }
    /// Returns the 24-bit color of the entry, each 3-bit level multiplied by 32.
    pub fn rgb(self) -> Rgb {
        Rgb::new(self.red * 32, self.green * 32, self.blue * 32)
    }
}

fn entry(input: &[u8]) -> IResult<&[u8], PaletteEntry> {
    map(tuple((byte, byte)), |(b0, b1)| PaletteEntry::from_bytes(b0, b1))(input)
}

/// Parses exactly [PALETTE_SIZE] bytes into 256 palette entries.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<PaletteEntry>, ImageDecodeError> {
    all_consuming(count(entry, PALETTE_ENTRIES))(bytes)
        .map(|(_, entries)| entries)
        .map_err(|_| ImageDecodeError::PaletteSize(bytes.len()))
}

/// Decodes a 512 byte Next palette.
pub fn decode_palette(bytes: &[u8]) -> Result<Palette, ImageDecodeError> {
    let entries = parse_entries(bytes)?;
    Ok(Palette::from_fn(|index| entries[usize::from(index)].rgb()))
}

/// Returns the default Next palette: the index itself read as `RRRG_GGBB`.
pub fn default_palette() -> Palette {
    Palette::from_fn(|index| {
        Rgb::new((index >> 5) * 32, ((index >> 2) & 7) * 32, ((index << 1) & 6) * 32)
    })
}

/// Returns the palette with every entry moved from index `i` to `(i + offset) & 0xFF`.
pub fn rotate_palette(palette: &Palette, offset: u8) -> Palette {
    Palette::from_fn(|index| palette.get(index.wrapping_sub(offset)))
}

/// Returns a 16x16 image of the palette, one pixel per entry.
pub fn palette_image(palette: &Palette) -> IndexedImage {
    IndexedImage {
        width: 16,
        height: 16,
        pixels: (0..=255).collect(),
        palette: palette.colors().to_vec()
    }
}

/// Decodes the palette at `offset` as a 16x16 image.
pub fn decode_palette_image(data: &[u8], offset: usize) -> Result<IndexedImage, ImageDecodeError> {
    let palette = decode_palette(region(data, offset, PALETTE_SIZE)?)?;
    Ok(palette_image(&palette))
}

/// Lists the palette entries found at `offset` as presentation nodes.
///
/// Entries are listed as long as they fit in the buffer, an error marker follows if the
/// palette is truncated.
pub fn palette_nodes(data: &[u8], offset: usize) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(PALETTE_ENTRIES);
    for index in 0..PALETTE_ENTRIES {
        let at = offset + 2 * index;
        let (b0, b1) = match region(data, at, 2) {
            Ok(bytes) => (bytes[0], bytes[1]),
            Err(err) => {
                warn!("palette: {}", err);
                nodes.push(Node::error("Error while parsing.", at, PALETTE_SIZE - 2 * index)
                                .with_description(err.to_string()));
                break
            }
        };
        let entry = PaletteEntry::from_bytes(b0, b1);
        let word = 256 * u16::from(b1) + u16::from(b0);
        nodes.push(Node::new(NodeKind::Field, at.to_string(), at, 2)
            .with_value(NodeValue::Text(format!("[{}] 0x{:04X} R={} G={} B={} P={} {}",
                index, word, entry.red, entry.green, entry.blue,
                u8::from(entry.priority), entry.rgb().hex())))
            .with_description(format!("P000_000B_RRRG_GGBB = {}", bits_string(entry.word().into(), 2))));
    }
    nodes
}
