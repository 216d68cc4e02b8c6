/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! The presentation tree.
//!
//! Every decoded entity (a register, a memory region, an image, a palette entry, a copper
//! instruction) is represented by a [Node]. Nodes covering large regions are created with
//! [Children::Deferred] holding a [Deferred] resume token and are populated in place only
//! when expanded by the decoder that created them.
use std::borrow::Cow;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

use crate::flags::ScreenViews;
use crate::video::{IndexedImage, Layer2Mode, ZxColor};

/// Returns `value` as an uppercase hexadecimal string padded with zeroes to `digits`.
pub fn hex_string(value: u32, digits: usize) -> String {
    format!("{:0width$X}", value, width = digits)
}

/// Returns `value` as a binary string of `size` bytes with nibbles separated by `_`.
pub fn bits_string(value: u32, size: usize) -> String {
    let nbits = 8 * size;
    let mut res = String::with_capacity(nbits + nbits / 4);
    for bit in (0..nbits).rev() {
        res.push(if value >> bit & 1 != 0 { '1' } else { '0' });
        if bit != 0 && bit % 4 == 0 {
            res.push('_');
        }
    }
    res
}

/// A decoded value.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeValue {
    /// A number decoded from `size` bytes.
    Number { value: u32, size: usize },
    /// A free-form text.
    Text(String),
    /// A value of `size` bytes that couldn't be decoded for the given `reason`.
    Undecodable { size: usize, reason: Cow<'static, str> },
}

impl NodeValue {
    /// Returns the short value string: hex digits, text, or `?` placeholders.
    pub fn value_string(&self) -> String {
        match self {
            NodeValue::Number { value, size } => hex_string(*value, 2 * size),
            NodeValue::Text(text) => text.clone(),
            NodeValue::Undecodable { size, .. } => "?".repeat(2 * size),
        }
    }
    /// Returns the decoded number if there is one.
    pub fn number(&self) -> Option<u32> {
        match self {
            NodeValue::Number { value, .. } => Some(*value),
            _ => None
        }
    }

    pub fn is_undecodable(&self) -> bool {
        matches!(self, NodeValue::Undecodable {..})
    }
}

/// Where the colors for an 8-bit image come from.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaletteSource {
    /// The default Next palette.
    Default,
    /// A 512 byte palette found at the given buffer offset.
    Buffer(usize),
}

/// The decoder used to materialize a deferred node.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    /// A memory dump displaying addresses starting from `display_base`.
    MemDump { display_base: usize },
    /// The selected screen interpretations followed by a memory dump of the region.
    Screens { display_base: usize, views: ScreenViews, hires_ink: ZxColor },
    /// The standard ULA screen.
    UlaScreen,
    /// The Timex 512x192 two color screen.
    TimexHiRes { ink: ZxColor },
    /// The Timex hi-color screen with 8x1 attributes.
    TimexHiCol,
    /// The Next Layer2 screen.
    Layer2 { mode: Layer2Mode, palette: PaletteSource, rotation: u8 },
    /// The Next LoRes screen.
    LoRes { palette: PaletteSource, rotation: u8 },
    /// The Next palette entries listing.
    Palette,
    /// The Next palette as a 16x16 image.
    PaletteImage,
    /// The Next copper instructions listing.
    Copper,
}

/// A resume token: the region and the decoder to materialize the children with.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deferred {
    pub offset: usize,
    pub size: usize,
    pub view: View,
}

/// The child nodes.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Children {
    /// A leaf node.
    None,
    /// Children not materialized yet.
    Deferred(Deferred),
    /// Children materialized.
    Loaded(Vec<Node>),
}

impl Default for Children {
    fn default() -> Self {
        Children::None
    }
}

/// The kind of a node, hinting renderers how to present it.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of the decoded tree.
    Root,
    /// A line of meta information.
    Info,
    /// A named value.
    Field,
    /// A collapsible group.
    Details,
    /// A row of memory dump cells.
    Row,
    /// A single memory dump byte.
    Cell,
    /// A collapsed run of identical rows or instructions.
    Summary,
    /// A decoded picture.
    Image(IndexedImage),
    /// An inline error marker.
    Error,
}

/// A node of the presentation tree.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    /// The buffer offset of the presented data.
    pub offset: usize,
    /// The size in bytes of the presented data.
    pub size: usize,
    pub kind: NodeKind,
    pub value: Option<NodeValue>,
    /// A long, human readable description (hover text).
    pub description: Option<String>,
    pub children: Children,
}

impl Node {
    pub fn new<S: Into<String>>(kind: NodeKind, name: S, offset: usize, size: usize) -> Self {
        Node {
            name: name.into(),
            offset,
            size,
            kind,
            value: None,
            description: None,
            children: Children::None
        }
    }

    pub fn root<S: Into<String>>(name: S, size: usize) -> Self {
        let mut node = Node::new(NodeKind::Root, name, 0, size);
        node.children = Children::Loaded(Vec::new());
        node
    }

    pub fn info<S: Into<String>>(text: S) -> Self {
        Node::new(NodeKind::Info, text, 0, 0)
    }
    /// Creates an inline error marker.
    pub fn error<S: Into<String>>(text: S, offset: usize, size: usize) -> Self {
        Node::new(NodeKind::Error, text, offset, size)
    }
    /// Creates a collapsible node that will be populated by the given `view` when expanded.
    pub fn deferred<S: Into<String>>(name: S, offset: usize, size: usize, view: View) -> Self {
        let mut node = Node::new(NodeKind::Details, name, offset, size);
        node.children = Children::Deferred(Deferred { offset, size, view });
        node
    }

    pub fn with_value(mut self, value: NodeValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Children::Loaded(children);
        self
    }
    /// Returns the short value string, if the node has a value.
    pub fn value_string(&self) -> Option<String> {
        self.value.as_ref().map(NodeValue::value_string)
    }
    /// Returns the decoded number, if the node has one.
    pub fn number(&self) -> Option<u32> {
        self.value.as_ref().and_then(NodeValue::number)
    }
    /// Returns `true` if the node's children are still waiting to be materialized.
    pub fn is_deferred(&self) -> bool {
        matches!(self.children, Children::Deferred(..))
    }
    /// Returns the resume token of a node that hasn't been expanded yet.
    pub fn deferred_token(&self) -> Option<&Deferred> {
        match &self.children {
            Children::Deferred(deferred) => Some(deferred),
            _ => None
        }
    }
    /// Returns the materialized children. Deferred and leaf nodes have none.
    pub fn children(&self) -> &[Node] {
        match &self.children {
            Children::Loaded(children) => children,
            _ => &[]
        }
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        match &mut self.children {
            Children::Loaded(children) => children,
            _ => &mut []
        }
    }
    /// Appends a child, turning a leaf into a parent. Deferred children are replaced.
    pub fn push(&mut self, child: Node) {
        match &mut self.children {
            Children::Loaded(children) => children.push(child),
            children => *children = Children::Loaded(vec![child])
        }
    }
    /// Returns the first materialized child with the given `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|node| node.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children_mut().iter_mut().find(|node| node.name == name)
    }
    /// Returns the image of an image node.
    pub fn image(&self) -> Option<&IndexedImage> {
        match &self.kind {
            NodeKind::Image(image) => Some(image),
            _ => None
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }
    /// Visits this node and all materialized descendants, depth first.
    pub fn walk<F: FnMut(&Node, usize)>(&self, f: &mut F) {
        fn walk_at<F: FnMut(&Node, usize)>(node: &Node, depth: usize, f: &mut F) {
            f(node, depth);
            for child in node.children() {
                walk_at(child, depth + 1, f);
            }
        }
        walk_at(self, 0, f)
    }
}
