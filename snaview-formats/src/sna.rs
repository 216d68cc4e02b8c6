/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! **SNA** snapshot format decoder.
use core::fmt;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use snaview_core::error::DecodeError;
use snaview_core::flags::{Port7ffdFlags, ScreenViews};
use snaview_core::node::{Node, View};
use snaview_core::reader::{region, OutOfRange};
use snaview_core::video::ZxColor;

use crate::view;

pub mod registers;
mod tree;

pub use registers::*;
pub use tree::TreeBuilder;
/*
   Offset   Size   Description
   ------------------------------------------------------------------------
   0        27     bytes  SNA header (see registers)
   27       16Kb   bytes  RAM 0x4000..=0x7FFF (bank 5 in 128k)
   16411    16Kb   bytes  RAM 0x8000..=0xBFFF (bank 2 in 128k)
   32795    16Kb   bytes  RAM 0xC000..=0xFFFF (currently paged bank in 128k)
   ------------------------------------------------------------------------
   Size: 49179 bytes, 128k snapshots continue with:
   49179    2      word   PC
   49181    1      byte   port OUT 0x7ffd
   49182    1      byte   TR-DOS rom paged (1) or not (0)
   49183    16Kb   bytes  remaining RAM banks in the order 0, 1, 3, 4, 6, 7
   ...
   ------------------------------------------------------------------------
   Size: 131103 or 147487 bytes
*/
/// The size in bytes of the **SNA** header.
pub const HEADER_SIZE: usize = 27;
/// The length in bytes of the 48k **SNA** file.
pub const SNA48_LENGTH: usize = 49179;
/// The length in bytes of the 128k **SNA** file.
pub const SNA128_LENGTH: usize = 131103;
/// The length in bytes of the 128k **SNA** file with the paged bank stored twice.
pub const SNA128_DUP_LENGTH: usize = 147487;
/// The offset of the port 0x7ffd value in the 128k **SNA** file.
pub const PORT_7FFD_OFFSET: usize = 49181;
/// The size of a single RAM bank.
pub const BANK_SIZE: usize = 0x4000;
/// The address the snapshot RAM is mapped at.
pub const RAM_ADDRESS: u16 = 0x4000;

const BANK_ORDER: [usize; 6] = [5, 2, 0, 1, 3, 4];

/// The snapshot variant recognized by the buffer length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SnaFormat {
    Zx48k,
    Zx128k,
    Invalid,
}

impl fmt::Display for SnaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnaFormat::Zx48k => "ZX48K",
            SnaFormat::Zx128k => "ZX128K",
            SnaFormat::Invalid => "invalid",
        })
    }
}

/// Classifies the snapshot by its exact length.
pub fn classify(len: usize) -> SnaFormat {
    match len {
        SNA48_LENGTH => SnaFormat::Zx48k,
        SNA128_LENGTH|SNA128_DUP_LENGTH => SnaFormat::Zx128k,
        _ => SnaFormat::Invalid
    }
}

/// Returns the port 0x7ffd value of a 128k snapshot.
pub fn port_7ffd(data: &[u8]) -> Result<Port7ffdFlags, OutOfRange> {
    region(data, PORT_7FFD_OFFSET, 1).map(|port| Port7ffdFlags::from_data(port[0]))
}

/// Returns the bank stored as the one paged in at 0xC000 in a 128k snapshot.
pub fn paged_in_bank(data: &[u8]) -> Result<u8, OutOfRange> {
    port_7ffd(data).map(Port7ffdFlags::paged_in_bank)
}

/// Maps the bank visiting order to the bank number. Indices past the permuted ones
/// map to themselves.
pub fn bank_permutation(index: usize) -> usize {
    BANK_ORDER.get(index).copied().unwrap_or(index)
}

/// Returns the banks stored after the 128k extension fields.
pub fn remaining_banks(paged_in: u8) -> impl Iterator<Item=usize> {
    (2..=7).map(bank_permutation).filter(move |&bank| bank != usize::from(paged_in))
}

/// The order of the RAM banks in a 128k snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BankTable {
    pub port: Port7ffdFlags,
}

impl BankTable {
    pub fn from_data(data: &[u8]) -> Result<Self, OutOfRange> {
        port_7ffd(data).map(|port| BankTable { port })
    }

    pub fn paged_in(&self) -> u8 {
        self.port.paged_in_bank()
    }
    /// Returns the banks stored after the extension fields.
    pub fn remaining(&self) -> Vec<usize> {
        remaining_banks(self.paged_in()).collect()
    }
    /// Returns all the stored banks in the order they are stored.
    pub fn order(&self) -> Vec<usize> {
        let mut order = vec![5, 2, self.paged_in().into()];
        order.extend(remaining_banks(self.paged_in()));
        order
    }
}

/// Options of the decoded presentation tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// The screen interpretations offered for the screen memory.
    pub screen_views: ScreenViews,
    /// The ink of the Timex hi-res screen.
    pub hires_ink: ZxColor,
    /// Whether the screen memory and its first screen of a 48k snapshot are expanded
    /// up front.
    pub open_screen: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            screen_views: ScreenViews::default(),
            hires_ink: ZxColor::default(),
            open_screen: true
        }
    }
}

impl DecodeOptions {
    pub fn with_screen_views(mut self, screen_views: ScreenViews) -> Self {
        self.screen_views = screen_views;
        self
    }

    pub fn with_hires_ink(mut self, hires_ink: ZxColor) -> Self {
        self.hires_ink = hires_ink;
        self
    }

    pub fn with_open_screen(mut self, open_screen: bool) -> Self {
        self.open_screen = open_screen;
        self
    }
}

/// A decode session owning the snapshot data.
///
/// The tree returned by [SnaSession::decode] holds deferred nodes for the memory regions,
/// which are populated by [SnaSession::expand].
#[derive(Clone, Debug)]
pub struct SnaSession {
    data: Box<[u8]>,
    format: SnaFormat,
    options: DecodeOptions,
}

impl SnaSession {
    pub fn new<D: Into<Box<[u8]>>>(data: D) -> Self {
        SnaSession::with_options(data, DecodeOptions::default())
    }

    pub fn with_options<D: Into<Box<[u8]>>>(data: D, options: DecodeOptions) -> Self {
        let data = data.into();
        let format = classify(data.len());
        match format {
            SnaFormat::Invalid => warn!("SNA: unrecognized length: {}", data.len()),
            _ => debug!("SNA: {} snapshot, {} bytes", format, data.len())
        }
        SnaSession { data, format, options }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> SnaFormat {
        self.format
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }
    /// Returns an error if the length of the data doesn't match any snapshot variant.
    pub fn validate(&self) -> Result<SnaFormat, DecodeError> {
        match self.format {
            SnaFormat::Invalid => Err(DecodeError::InvalidLength(self.data.len())),
            format => Ok(format)
        }
    }

    pub fn registers(&self) -> RegisterSet {
        decode_registers(&self.data, self.format)
    }
    /// Returns the bank table of a 128k snapshot.
    pub fn bank_table(&self) -> Option<BankTable> {
        match self.format {
            SnaFormat::Zx128k => BankTable::from_data(&self.data).ok(),
            _ => None
        }
    }
    /// Decodes the snapshot into the presentation tree.
    ///
    /// Snapshots of unknown length are decoded with the 48k layout, the missing data
    /// being reported where it's expected.
    pub fn decode(&self) -> Node {
        let data = &self.data[..];
        let mut tree = TreeBuilder::new(data, Node::root("SNA", data.len()));
        match self.format {
            SnaFormat::Zx48k => tree.info("ZX48K SNA file."),
            SnaFormat::Zx128k => tree.info("ZX128K SNA file."),
            SnaFormat::Invalid => tree.error("Wrong length."),
        }
        tree.info(format!("Length: {}", data.len()));
        let banks = self.bank_table();
        if let Some(banks) = banks {
            let order: Vec<String> = banks.order().iter().map(ToString::to_string).collect();
            tree.info(format!("Banks: {}", order.join(", ")));
        }

        let registers = self.registers();
        let (header, extension): (Vec<&Register>, Vec<&Register>) = registers.iter()
            .partition(|reg| reg.derived || reg.offset < HEADER_SIZE);
        tree.seek(0);
        for reg in header {
            tree.register(reg);
        }

        let screens = View::Screens {
            display_base: RAM_ADDRESS.into(),
            views: self.options.screen_views,
            hires_ink: self.options.hires_ink
        };
        match banks {
            Some(banks) => {
                tree.details("Bank5: 4000-7FFF", BANK_SIZE, screens);
                tree.details("Bank2: 8000-BFFF", BANK_SIZE, View::MemDump { display_base: 0x8000 });
                tree.details(format!("Bank{}: C000-FFFF", banks.paged_in()), BANK_SIZE,
                             View::MemDump { display_base: 0xC000 });
                for reg in extension {
                    tree.register(reg);
                }
                for bank in banks.remaining() {
                    tree.details(format!("Bank{}:", bank), BANK_SIZE, View::MemDump { display_base: 0 });
                }
            }
            None => {
                tree.details("4000-7FFF", BANK_SIZE, screens);
                tree.details("8000-BFFF", BANK_SIZE, View::MemDump { display_base: 0x8000 });
                tree.details("C000-FFFF", BANK_SIZE, View::MemDump { display_base: 0xC000 });
            }
        }

        let mut root = tree.finish();
        if self.options.open_screen && banks.is_none() {
            self.open_screen(&mut root);
        }
        root
    }
    /// Materializes the children of a deferred `node`. Returns `false` if the node has
    /// already been expanded or can't be expanded at all.
    pub fn expand(&self, node: &mut Node) -> bool {
        view::expand(&self.data, node)
    }
    /// Expands the nodes along the `path` of child names starting from `node`, returning
    /// the expanded node at the end of the path.
    pub fn expand_path<'n>(&self, node: &'n mut Node, path: &[&str]) -> Option<&'n mut Node> {
        let mut node = node;
        for name in path {
            self.expand(node);
            node = node.child_mut(name)?;
        }
        self.expand(node);
        Some(node)
    }
    /// Recursively expands all the deferred nodes.
    pub fn expand_all(&self, node: &mut Node) {
        self.expand(node);
        for child in node.children_mut() {
            self.expand_all(child);
        }
    }

    fn open_screen(&self, root: &mut Node) {
        let screens = root.children_mut().iter_mut().find(|node| {
            matches!(node.deferred_token(), Some(token) if matches!(token.view, View::Screens {..}))
        });
        if let Some(screens) = screens {
            self.expand(screens);
            if let Some(first) = screens.children_mut().first_mut() {
                self.expand(first);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaview_core::node::{NodeKind, NodeValue};

    #[test]
    fn classify_works() {
        assert_eq!(classify(49179), SnaFormat::Zx48k);
        assert_eq!(classify(131103), SnaFormat::Zx128k);
        assert_eq!(classify(147487), SnaFormat::Zx128k);
        for len in [0, 10, 27, 49178, 49180, 131102, 131104, 147486, 147488].iter() {
            assert_eq!(classify(*len), SnaFormat::Invalid);
        }
    }

    #[test]
    fn bank_permutation_works() {
        let banks: Vec<_> = (0..=5).map(bank_permutation).collect();
        assert_eq!(banks, [5, 2, 0, 1, 3, 4]);
        assert_eq!(bank_permutation(6), 6);
        assert_eq!(bank_permutation(7), 7);
        assert_eq!(bank_permutation(100), 100);
        for &paged in [0u8, 1, 3].iter() {
            let remaining: Vec<_> = remaining_banks(paged).collect();
            assert_eq!(remaining.len(), 5);
            assert!(!remaining.contains(&paged.into()));
        }
        assert_eq!(remaining_banks(2).collect::<Vec<_>>(), [0, 1, 3, 4, 6, 7]);
    }

    #[test]
    fn bank_table_works() {
        let mut data = vec![0u8; SNA128_LENGTH];
        data[PORT_7FFD_OFFSET] = 0b0001_0111;
        let banks = BankTable::from_data(&data).unwrap();
        assert_eq!(paged_in_bank(&data), Ok(3));
        assert_eq!(banks.paged_in(), 3);
        assert_eq!(banks.order(), [5, 2, 3, 0, 1, 4, 6, 7]);
        assert!(paged_in_bank(&data[..PORT_7FFD_OFFSET]).is_err());
    }

    #[test]
    fn decode_options_works() {
        let options = DecodeOptions::default();
        assert_eq!(options.screen_views, ScreenViews::ULA);
        assert_eq!(options.hires_ink, ZxColor::White);
        assert!(options.open_screen);
        let options = options.with_open_screen(false)
                             .with_hires_ink(ZxColor::Red)
                             .with_screen_views(ScreenViews::all());
        assert!(!options.open_screen);
        assert_eq!(options.hires_ink, ZxColor::Red);
        assert_eq!(options.screen_views, ScreenViews::all());
    }

    #[test]
    fn decode_48k_works() {
        let mut data = vec![0u8; SNA48_LENGTH];
        data[23] = 0x00;
        data[24] = 0x80;
        let session = SnaSession::new(data);
        assert_eq!(session.format(), SnaFormat::Zx48k);
        assert_eq!(session.validate(), Ok(SnaFormat::Zx48k));
        assert!(session.bank_table().is_none());
        let mut root = session.decode();
        assert_eq!(root.kind, NodeKind::Root);
        let names: Vec<&str> = root.children().iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, [
            "ZX48K SNA file.", "Length: 49179",
            "I", "HL'", "DE'", "BC'", "AF'", "HL", "DE", "BC", "IY", "IX", "Interrupt", "R", "AF", "SP", "PC",
            "IM", "Border", "4000-7FFF", "8000-BFFF", "C000-FFFF"]);
        assert_eq!(root.child("SP").unwrap().number(), Some(0x8000));
        // the screen region is open
        let screens = root.child("4000-7FFF").unwrap();
        assert_eq!((screens.offset, screens.size), (27, BANK_SIZE));
        assert!(!screens.is_deferred());
        let screen = screens.child("Screen").unwrap();
        assert!(screen.children()[0].image().is_some());
        assert!(screens.child("Memory Dump").unwrap().is_deferred());
        let c000 = root.child("C000-FFFF").unwrap();
        assert_eq!(c000.offset, 27 + 2 * BANK_SIZE);
        assert!(c000.is_deferred());
        let dump = session.expand_path(&mut root, &["C000-FFFF"]).unwrap();
        assert_eq!(dump.children().len(), 1);
        assert_eq!(dump.children()[0].name, "C000-FFFF");
        assert_eq!(dump.children()[0].value_string().unwrap(), "contain all 00");
        // expansion is idempotent
        let before = root.clone();
        assert!(!session.expand(root.child_mut("C000-FFFF").unwrap()));
        assert_eq!(root, before);
    }

    #[test]
    fn decode_128k_works() {
        let mut data = vec![0u8; SNA128_DUP_LENGTH];
        data[PORT_7FFD_OFFSET] = 2;
        data[PORT_7FFD_OFFSET + 1] = 1;
        let session = SnaSession::with_options(data, DecodeOptions::default().with_open_screen(false));
        assert_eq!(session.format(), SnaFormat::Zx128k);
        let root = session.decode();
        let names: Vec<&str> = root.children().iter().map(|node| node.name.as_str()).collect();
        assert_eq!(&names[..3], ["ZX128K SNA file.", "Length: 147487", "Banks: 5, 2, 2, 0, 1, 3, 4, 6, 7"]);
        assert_eq!(&names[3 + 16..], [
            "Bank5: 4000-7FFF", "Bank2: 8000-BFFF", "Bank2: C000-FFFF", "PC", "Port 7FFD", "TRDOS ROM",
            "Bank0:", "Bank1:", "Bank3:", "Bank4:", "Bank6:", "Bank7:"]);
        let port = root.child("Port 7FFD").unwrap();
        assert_eq!((port.offset, port.size), (PORT_7FFD_OFFSET, 1));
        assert_eq!(root.child("PC").unwrap().offset, SNA48_LENGTH);
        assert_eq!(root.child("Bank0:").unwrap().offset, 49183);
        let last = root.children().last().unwrap();
        assert_eq!(last.offset + last.size, SNA128_DUP_LENGTH);
        assert!(root.child("Bank5: 4000-7FFF").unwrap().is_deferred());
        assert_eq!(root.child("Bank2: 8000-BFFF").unwrap().size, BANK_SIZE);
    }

    #[test]
    fn decode_128k_reports_missing_bank() {
        let mut data = vec![0u8; SNA128_LENGTH];
        data[PORT_7FFD_OFFSET] = 2;
        let session = SnaSession::new(data);
        let mut root = session.decode();
        let bank7 = session.expand_path(&mut root, &["Bank7:"]).unwrap();
        assert!(bank7.children().last().unwrap().is_error());
    }

    #[test]
    fn decode_128k_keeps_banks_collapsed() {
        let mut data = vec![0u8; SNA128_LENGTH];
        data[PORT_7FFD_OFFSET] = 1;
        let session = SnaSession::new(data);
        assert!(session.options().open_screen);
        let mut root = session.decode();
        let banks: Vec<&Node> = root.children().iter().filter(|node| node.kind == NodeKind::Details).collect();
        assert_eq!(banks.len(), 8);
        assert!(banks.into_iter().all(Node::is_deferred));
        let bank5 = root.child("Bank5: 4000-7FFF").unwrap();
        assert!(bank5.is_deferred());
        assert!(bank5.child("Screen").is_none());
        let screen = session.expand_path(&mut root, &["Bank5: 4000-7FFF", "Screen"]).unwrap();
        assert_eq!(screen.children()[0].name, "256x192");
    }

    #[test]
    fn decode_sp_in_rom() {
        let mut data = vec![0u8; SNA48_LENGTH];
        data[23] = 0xFF;
        data[24] = 0x3F;
        let root = SnaSession::new(data).decode();
        let pc = root.child("PC").unwrap();
        assert_eq!(pc.value_string().unwrap(), "????");
        match pc.value.as_ref().unwrap() {
            NodeValue::Undecodable { reason, .. } => assert_eq!(reason, SP_IN_ROM),
            value => panic!("unexpected {:?}", value)
        }
    }

    #[test]
    fn decode_truncated_works() {
        let session = SnaSession::new(vec![0u8; 10]);
        assert_eq!(session.validate(), Err(DecodeError::InvalidLength(10)));
        let mut root = session.decode();
        assert!(root.children()[0].is_error());
        assert_eq!(root.children()[0].name, "Wrong length.");
        assert_eq!(root.child("I").unwrap().value_string().unwrap(), "00");
        assert_eq!(root.child("SP").unwrap().value_string().unwrap(), "????");
        assert_eq!(root.child("Border").unwrap().value_string().unwrap(), "??");
        let screens = root.child("4000-7FFF").unwrap();
        assert!(screens.child("Screen").unwrap().children()[0].is_error());
        session.expand_all(&mut root);
        let dump = root.child("8000-BFFF").unwrap();
        assert_eq!(dump.children().len(), 1);
        assert!(dump.children()[0].is_error());
        let empty = SnaSession::new(Vec::new());
        assert_eq!(empty.decode().child("Length: 0").map(|node| node.kind.clone()), Some(NodeKind::Info));
    }
}
