/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use snaview_core::node::{Node, View};
use snaview_core::reader::ByteReader;

use super::registers::Register;

/// Builds the presentation tree of a single decode, keeping track of the cursor and
/// the node children are appended to.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    rd: ByteReader<'a>,
    parent: Node,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder appending children to `parent` with the cursor at `0`.
    pub fn new(data: &'a [u8], parent: Node) -> Self {
        TreeBuilder { rd: ByteReader::new(data), parent }
    }

    pub fn offset(&self) -> usize {
        self.rd.offset()
    }

    pub fn seek(&mut self, offset: usize) {
        self.rd.seek(offset)
    }
    /// Appends a line of meta information.
    pub fn info<S: Into<String>>(&mut self, text: S) {
        self.parent.push(Node::info(text))
    }
    /// Appends an error marker at the cursor.
    pub fn error<S: Into<String>>(&mut self, text: S) {
        let offset = self.rd.offset();
        self.parent.push(Node::error(text, offset, 0))
    }
    /// Appends a register field.
    ///
    /// Fields stored in sequence move the cursor past them, derived fields leave it intact.
    pub fn register(&mut self, register: &Register) {
        if !register.derived {
            if self.rd.offset() != register.offset {
                warn!("{} at {} while the cursor is at {}", register.name, register.offset, self.rd.offset());
                self.rd.seek(register.offset);
            }
            self.rd.skip(register.size());
        }
        self.parent.push(register.node())
    }
    /// Appends a collapsible node covering the next `size` bytes which will be populated
    /// with the given `view` when expanded. Returns the offset of the node.
    pub fn details<S: Into<String>>(&mut self, name: S, size: usize, view: View) -> usize {
        let offset = self.rd.skip(size);
        self.parent.push(Node::deferred(name, offset, size, view));
        offset
    }
    /// Returns the built tree.
    pub fn finish(self) -> Node {
        self.parent
    }
}
