/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Memory dumps with identical rows collapsed.
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use snaview_core::node::{hex_string, Node, NodeKind, NodeValue};
use snaview_core::reader::OutOfRange;

/// The number of bytes in a single dump row.
pub const ROW_LEN: usize = 16;

/// A single line of a memory dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DumpLine {
    /// Up to [ROW_LEN] bytes starting at the buffer `offset`, displayed at `address`.
    Row { offset: usize, address: usize, bytes: Vec<u8> },
    /// `len` bytes of the same `value`, at least 2 complete rows.
    Run { offset: usize, address: usize, len: usize, value: u8 },
}

/// The formatted memory dump.
///
/// If the region extends past the end of the buffer, `lines` hold everything that could
/// be formatted and `error` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemDump {
    pub lines: Vec<DumpLine>,
    pub error: Option<OutOfRange>,
}

/// Formats `size` bytes of `data` at `offset` as rows of 16 bytes labeled with
/// `display_base` + the relative row offset.
///
/// Before each row the bytes equal to the first byte of the row are counted. If the run,
/// truncated to whole rows, covers at least 2 rows, a single [DumpLine::Run] is emitted
/// instead and the formatting continues after it.
pub fn format_dump(data: &[u8], offset: usize, size: usize, display_base: usize) -> MemDump {
    let byte_at = |index: usize| offset.checked_add(index).and_then(|at| data.get(at)).copied();
    let mut dump = MemDump::default();
    let mut index = 0;
    while index < size {
        let value = match byte_at(index) {
            Some(value) => value,
            None => {
                dump.error = Some(OutOfRange { offset: offset + index, size: size - index, len: data.len() });
                break
            }
        };
        let mut end = index + 1;
        while end < size && byte_at(end) == Some(value) {
            end += 1;
        }
        let end16 = end - end % ROW_LEN;
        if end16 > index + ROW_LEN {
            dump.lines.push(DumpLine::Run {
                offset: offset + index,
                address: display_base + index,
                len: end16 - index,
                value
            });
            index = end16;
            continue;
        }
        let row_end = size.min(index + ROW_LEN);
        let bytes: Vec<u8> = (index..row_end).map_while(byte_at).collect();
        let available = index + bytes.len();
        dump.lines.push(DumpLine::Row { offset: offset + index, address: display_base + index, bytes });
        if available < row_end {
            dump.error = Some(OutOfRange { offset: offset + available, size: size - available, len: data.len() });
            break
        }
        index = row_end;
    }
    dump
}

/// Formats a memory dump as presentation nodes, ending with an error marker if the
/// region couldn't be dumped completely.
pub fn dump_nodes(data: &[u8], offset: usize, size: usize, display_base: usize) -> Vec<Node> {
    let dump = format_dump(data, offset, size, display_base);
    trace!("memory dump at {} size {}: {} lines", offset, size, dump.lines.len());
    let mut nodes: Vec<Node> = dump.lines.iter().map(|line| line_node(line, offset)).collect();
    if let Some(err) = dump.error {
        warn!("memory dump: {}", err);
        nodes.push(Node::error("Error while parsing.", err.offset, err.size)
                        .with_description(err.to_string()));
    }
    nodes
}

fn line_node(line: &DumpLine, base_offset: usize) -> Node {
    match *line {
        DumpLine::Run { offset, address, len, value } => {
            let last = address + len - 1;
            Node::new(NodeKind::Summary,
                      format!("{}-{}", hex_string(address as u32, 4), hex_string(last as u32, 4)),
                      offset, len)
                .with_value(NodeValue::Text(format!("contain all {}", hex_string(value.into(), 2))))
                .with_description(format!("Index (dec): {}-{}\nValue (dec): {}", address, last, value))
        }
        DumpLine::Row { offset, address, ref bytes } => {
            let cells = bytes.iter().enumerate().map(|(i, &value)| {
                let cell_offset = offset + i;
                let cell_address = address + i;
                Node::new(NodeKind::Cell, hex_string(cell_address as u32, 4), cell_offset, 1)
                    .with_value(NodeValue::Number { value: value.into(), size: 1 })
                    .with_description(format!(
                        "Index (hex): {}\nIndex (dec): {}\nOffset: {} (+{})\nValue (dec): {}",
                        hex_string(cell_address as u32, 4), cell_address,
                        cell_offset, cell_offset - base_offset, value))
            }).collect();
            Node::new(NodeKind::Row, hex_string(address as u32, 4), offset, bytes.len())
                .with_children(cells)
        }
    }
}
