/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Materialization of deferred nodes.
//!
//! A deferred node carries the region and the [View] to decode it with. Expanding the
//! node decodes the region into the node's children, in place. Any failure to decode
//! is reported as an error node among the children.
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use snaview_core::flags::ScreenViews;
use snaview_core::node::{Children, Deferred, Node, NodeKind, PaletteSource, View};
use snaview_core::reader::region;
use snaview_core::video::{
    ImageDecodeError, IndexedImage, Layer2Mode, Palette,
    LORES_SIZE, PALETTE_SIZE, SCREEN_SIZE, TIMEX_SCREEN_SIZE
};

use crate::{copper, memdump, palette, screen};

/// The name of the error node replacing an image that couldn't be decoded.
pub const IMAGE_ERROR: &str = "Error converting image.";

/// Materializes the children of a deferred `node` from `data`.
///
/// Returns `false` if the node is not deferred, so expanding the same node again leaves
/// it unchanged.
pub fn expand(data: &[u8], node: &mut Node) -> bool {
    let deferred = match &node.children {
        Children::Deferred(deferred) => deferred.clone(),
        _ => return false
    };
    debug!("expanding {:?} at {} size {}", node.name, deferred.offset, deferred.size);
    node.children = Children::Loaded(materialize(data, &deferred));
    true
}

/// Decodes the region of the `deferred` token into nodes.
pub fn materialize(data: &[u8], deferred: &Deferred) -> Vec<Node> {
    let Deferred { offset, size, ref view } = *deferred;
    match *view {
        View::MemDump { display_base } => memdump::dump_nodes(data, offset, size, display_base),
        View::Screens { display_base, views, hires_ink } => {
            let mut nodes = Vec::with_capacity(4);
            if views.contains(ScreenViews::ULA) {
                nodes.push(Node::deferred("Screen", offset, SCREEN_SIZE, View::UlaScreen));
            }
            if views.contains(ScreenViews::TIMEX_HI_COL) {
                nodes.push(Node::deferred("Timex HiCol Screen", offset, TIMEX_SCREEN_SIZE, View::TimexHiCol));
            }
            if views.contains(ScreenViews::TIMEX_HI_RES) {
                nodes.push(Node::deferred("Timex HiRes Screen", offset, TIMEX_SCREEN_SIZE,
                                          View::TimexHiRes { ink: hires_ink }));
            }
            nodes.push(Node::deferred("Memory Dump", offset, size, View::MemDump { display_base }));
            nodes
        }
        View::UlaScreen => {
            vec![image_node(offset, size, screen::decode_ula_screen(data, offset))]
        }
        View::TimexHiRes { ink } => {
            vec![image_node(offset, size, screen::decode_timex_hires(data, offset, ink))]
        }
        View::TimexHiCol => {
            vec![image_node(offset, size, screen::decode_timex_hicol(data, offset))]
        }
        View::Layer2 { mode, palette, rotation } => {
            let image = resolve_palette(data, palette, rotation)
                        .and_then(|palette| screen::decode_layer2(data, offset, mode, &palette));
            vec![image_node(offset, size, image)]
        }
        View::LoRes { palette, rotation } => {
            let image = resolve_palette(data, palette, rotation)
                        .and_then(|palette| screen::decode_lores(data, offset, &palette));
            vec![image_node(offset, size, image)]
        }
        View::Palette => palette::palette_nodes(data, offset),
        View::PaletteImage => {
            vec![image_node(offset, size, palette::decode_palette_image(data, offset))]
        }
        View::Copper => copper::copper_nodes(data, offset, size / 2),
    }
}

/// Returns the palette from `source` rotated by `rotation`.
pub fn resolve_palette(data: &[u8], source: PaletteSource, rotation: u8) -> Result<Palette, ImageDecodeError> {
    let palette = match source {
        PaletteSource::Default => palette::default_palette(),
        PaletteSource::Buffer(offset) => palette::decode_palette(region(data, offset, PALETTE_SIZE)?)?
    };
    Ok(match rotation {
        0 => palette,
        offset => palette::rotate_palette(&palette, offset)
    })
}

fn image_node(offset: usize, size: usize, image: Result<IndexedImage, ImageDecodeError>) -> Node {
    match image {
        Ok(image) => {
            trace!("image {}x{} at {}", image.width, image.height, offset);
            let name = format!("{}x{}", image.width, image.height);
            Node::new(NodeKind::Image(image), name, offset, size)
        }
        Err(err) => {
            warn!("image at {}: {}", offset, err);
            Node::error(IMAGE_ERROR, offset, size).with_description(err.to_string())
        }
    }
}

/// Returns a deferred Layer2 screen node.
pub fn layer2_node<S: Into<String>>(
        name: S,
        offset: usize,
        mode: Layer2Mode,
        palette: PaletteSource,
        rotation: u8
    ) -> Node
{
    Node::deferred(name, offset, mode.data_size(), View::Layer2 { mode, palette, rotation })
}

/// Returns a deferred LoRes screen node.
pub fn lores_node<S: Into<String>>(name: S, offset: usize, palette: PaletteSource, rotation: u8) -> Node {
    Node::deferred(name, offset, LORES_SIZE, View::LoRes { palette, rotation })
}

/// Returns a deferred node listing the palette entries.
pub fn palette_node<S: Into<String>>(name: S, offset: usize) -> Node {
    Node::deferred(name, offset, PALETTE_SIZE, View::Palette)
}

/// Returns a deferred node presenting the palette as an image.
pub fn palette_image_node<S: Into<String>>(name: S, offset: usize) -> Node {
    Node::deferred(name, offset, PALETTE_SIZE, View::PaletteImage)
}

/// Returns a deferred node listing `count` copper instructions.
pub fn copper_node<S: Into<String>>(name: S, offset: usize, count: usize) -> Node {
    Node::deferred(name, offset, 2 * count, View::Copper)
}
