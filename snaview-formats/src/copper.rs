/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! ZX Spectrum Next copper instructions.
use core::fmt;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use nom::multi::many0;
use nom::number::complete::be_u16;

use snaview_core::node::{bits_string, hex_string, Node, NodeKind, NodeValue};
use snaview_core::reader::OutOfRange;

/// The number of instructions in the copper memory.
pub const COPPER_INSTRUCTIONS: usize = 1024;

/// A decoded copper instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CopperOp {
    /// `0x0000`
    Noop,
    /// `0xFFFF`
    Halt,
    /// `1hhh_hhhv_vvvv_vvvv`: waits for the raster line `v` and the horizontal position `h`.
    Wait { v: u16, h: u8 },
    /// `0rrr_rrrr_vvvv_vvvv`: writes `value` to the Next register `reg`.
    Move { value: u8, reg: u8 },
}

impl From<u16> for CopperOp {
    fn from(word: u16) -> Self {
        match word {
            0 => CopperOp::Noop,
            0xFFFF => CopperOp::Halt,
            w if w & 0x8000 != 0 => CopperOp::Wait { v: w & 0x1FF, h: (w >> 9) as u8 & 0x3F },
            w => CopperOp::Move { value: w as u8, reg: (w >> 8) as u8 & 0x7F }
        }
    }
}

impl fmt::Display for CopperOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CopperOp::Noop => f.write_str("NOOP"),
            CopperOp::Halt => f.write_str("HALT"),
            CopperOp::Wait { v, h } => write!(f, "WAIT v=={} (0x{:02X}) AND h=={} (0x{:02X})", v, v, h, h),
            CopperOp::Move { value, reg } => write!(f, "MOVE {} (0x{:02X}) TO REG {} (0x{:02X})",
                                                    value, value, reg, reg),
        }
    }
}

/// A line of the copper listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopperLine {
    /// A single instruction at the word `index`.
    Op { index: usize, word: u16, op: CopperOp },
    /// Consecutive NOOPs from the word index `first` to `last` inclusive.
    NoopRun { first: usize, last: usize },
}

/// A copper listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disassembly {
    pub lines: Vec<CopperLine>,
    /// Set if the instructions extend past the end of the buffer.
    pub error: Option<OutOfRange>,
}

/// Disassembles `count` big-endian instruction words of `data` starting at `offset`.
///
/// Two or more consecutive NOOPs are collapsed into a single [CopperLine::NoopRun].
pub fn disassemble(data: &[u8], offset: usize, count: usize) -> Disassembly {
    let size = count.saturating_mul(2);
    let start = offset.min(data.len());
    let end = offset.saturating_add(size).min(data.len());
    let words = parse_words(&data[start..end]);
    let error = if words.len() < count {
        let done = 2 * words.len();
        Some(OutOfRange { offset: offset + done, size: size - done, len: data.len() })
    }
    else {
        None
    };

    let mut lines = Vec::new();
    let mut index = 0;
    while index < words.len() {
        let word = words[index];
        if word == 0 {
            let last = words[index..].iter().take_while(|&&w| w == 0).count() + index - 1;
            if last > index {
                lines.push(CopperLine::NoopRun { first: index, last });
                index = last + 1;
                continue;
            }
        }
        lines.push(CopperLine::Op { index, word, op: word.into() });
        index += 1;
    }
    Disassembly { lines, error }
}

fn parse_words(input: &[u8]) -> Vec<u16> {
    many0(be_u16::<&[u8], nom::error::Error<&[u8]>>)(input)
        .map(|(_, words)| words)
        .unwrap_or_default()
}

/// Disassembles copper instructions as presentation nodes.
pub fn copper_nodes(data: &[u8], offset: usize, count: usize) -> Vec<Node> {
    let listing = disassemble(data, offset, count);
    debug!("copper at {}: {} lines", offset, listing.lines.len());
    let mut nodes: Vec<Node> = listing.lines.iter().map(|line| match *line {
        CopperLine::Op { index, word, op } => {
            let at = offset + 2 * index;
            Node::new(NodeKind::Field, format!("[{}]", index), at, 2)
                .with_value(NodeValue::Text(op.to_string()))
                .with_description(format!("Offset: {} (0x{})\nWord: 0x{} = {}",
                    at, hex_string(at as u32, 4), hex_string(word.into(), 4), bits_string(word.into(), 2)))
        }
        CopperLine::NoopRun { first, last } => {
            Node::new(NodeKind::Summary, format!("[{}-{}]", first, last),
                      offset + 2 * first, 2 * (last - first + 1))
                .with_value(NodeValue::Text("All NOOP".into()))
        }
    }).collect();
    if let Some(err) = listing.error {
        warn!("copper: {}", err);
        nodes.push(Node::error("Error while parsing.", err.offset, err.size)
                        .with_description(err.to_string()));
    }
    nodes
}
