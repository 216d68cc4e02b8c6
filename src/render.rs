/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Plain text rendering of the presentation tree.
use core::fmt::{self, Write};

use log::trace;

use snaview_core::node::{Node, NodeKind};

/// Rendering options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append the node descriptions below the nodes.
    pub descriptions: bool,
    /// The maximum depth of rendered nodes, unlimited if `None`.
    pub max_depth: Option<usize>,
}

/// Renders the materialized part of the tree, one node per line, indented by depth.
///
/// Deferred nodes are marked with `+`, expanded ones with `-`. Memory dump rows are
/// rendered on a single line.
pub fn render(node: &Node) -> String {
    render_with(node, RenderOptions::default())
}

pub fn render_with(node: &Node, options: RenderOptions) -> String {
    Rendered { node, options }.to_string()
}

/// Displays the tree rendered with the given options.
#[derive(Clone, Copy, Debug)]
pub struct Rendered<'a> {
    pub node: &'a Node,
    pub options: RenderOptions,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self.node, self.options)
    }
}

/// Writes the rendered tree into `w`.
pub fn write_tree<W: Write>(w: &mut W, node: &Node, options: RenderOptions) -> fmt::Result {
    write_node(w, node, 0, options)
}

fn write_node<W: Write>(w: &mut W, node: &Node, depth: usize, options: RenderOptions) -> fmt::Result {
    if options.max_depth.map_or(false, |max| depth > max) {
        trace!("render: {:?} at depth {} cut off", node.name, depth);
        return Ok(())
    }
    let indent = 2 * depth;
    write!(w, "{:indent$}", "", indent = indent)?;
    let mut recurse = true;
    match &node.kind {
        NodeKind::Root => write!(w, "{} ({} bytes)", node.name, node.size)?,
        NodeKind::Info => w.write_str(&node.name)?,
        NodeKind::Error => write!(w, "! {}", node.name)?,
        NodeKind::Details => {
            let mark = if node.is_deferred() { '+' } else { '-' };
            write!(w, "{} {}", mark, node.name)?;
        }
        NodeKind::Row => {
            write!(w, "{}:", node.name)?;
            for cell in node.children() {
                write!(w, " {}", cell.value_string().unwrap_or_default())?;
            }
            recurse = false;
        }
        NodeKind::Image(image) => {
            write!(w, "[image {}x{}, {} colors]", image.width, image.height, image.palette.len())?
        }
        NodeKind::Field|NodeKind::Cell|NodeKind::Summary => w.write_str(&node.name)?,
    }
    if let Some(value) = node.value_string() {
        write!(w, ": {}", value)?;
    }
    w.write_char('\n')?;
    if options.descriptions {
        if let Some(description) = &node.description {
            for line in description.lines() {
                writeln!(w, "{:indent$}  | {}", "", line, indent = indent)?;
            }
        }
    }
    if recurse {
        for child in node.children() {
            write_node(w, child, depth + 1, options)?;
        }
    }
    Ok(())
}
