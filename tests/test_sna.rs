//! Decoding of complete and damaged SNA snapshots.
use rand::prelude::*;
use rand::rngs::SmallRng;

use snaview::flags::ScreenViews;
use snaview::node::{Children, Node, NodeKind, NodeValue};
use snaview::sna::{SNA48_LENGTH, SNA128_LENGTH, SNA128_DUP_LENGTH, PORT_7FFD_OFFSET, SP_IN_ROM};
use snaview::video::{Rgb, ZxColor};
use snaview::{render, DecodeOptions, SnaFormat, SnaSession};

fn snapshot48() -> Vec<u8> {
    let mut data = vec![0u8; SNA48_LENGTH];
    // SP = 0xFF00, the return address 0x8000 on the stack
    data[23..25].copy_from_slice(&[0x00, 0xFF]);
    let stack = 27 + 0xFF00 - 0x4000;
    data[stack..stack + 2].copy_from_slice(&[0x00, 0x80]);
    data[25] = 1;
    data[26] = 1;
    // a white on black checkerboard in the top left character cell
    for line in 0..8 {
        data[27 + line * 256] = if line & 1 == 0 { 0xAA } else { 0x55 };
    }
    data[27 + 6144] = 0b0000_0111;
    data
}

fn count_nodes(node: &Node) -> (usize, usize) {
    let mut nodes = 0;
    let mut deferred = 0;
    node.walk(&mut |node, _| {
        nodes += 1;
        if node.is_deferred() {
            deferred += 1;
        }
    });
    (nodes, deferred)
}

#[test]
fn test_sna48() {
    let session = SnaSession::new(snapshot48());
    assert_eq!(session.format(), SnaFormat::Zx48k);
    let mut root = session.decode();
    assert_eq!(root.child("PC").unwrap().number(), Some(0x8000));
    assert_eq!(root.child("Border").unwrap().description.as_ref().unwrap().lines().last(),
               Some("Border color: BLUE"));
    let screen = root.child("4000-7FFF").unwrap().child("Screen").unwrap();
    let image = screen.children()[0].image().unwrap();
    assert_eq!(image.rgb_at(0, 0), Rgb::new(0xD7, 0xD7, 0xD7));
    assert_eq!(image.rgb_at(1, 0), Rgb::new(0, 0, 0));
    assert_eq!(image.rgb_at(1, 1), Rgb::new(0xD7, 0xD7, 0xD7));
    assert_eq!(image.to_rgb24().len(), 256 * 192 * 3);

    session.expand_all(&mut root);
    let (_, deferred) = count_nodes(&root);
    assert_eq!(deferred, 0);
    let mem = root.child("4000-7FFF").unwrap().child("Memory Dump").unwrap();
    assert_eq!(mem.children()[0].kind, NodeKind::Row);
    assert_eq!(mem.children()[0].children()[0].value_string().unwrap(), "AA");
    let mut errors = 0;
    root.walk(&mut |node, _| if node.is_error() { errors += 1 });
    assert_eq!(errors, 0);

    let text = render::render(&root);
    assert!(text.starts_with("SNA (49179 bytes)\n  ZX48K SNA file.\n  Length: 49179\n"));
    assert!(text.contains("\n  PC: 8000\n"));
}

#[test]
fn test_sna128() {
    let mut data = vec![0u8; SNA128_LENGTH];
    data[PORT_7FFD_OFFSET] = 0b0001_0001;
    // mark the first byte of every stored bank with 0x10 + its bank number
    let mut offset = 27;
    for bank in [5, 2, 1, 0, 3, 4, 6, 7].iter() {
        data[offset] = 0x10 + *bank;
        offset += 0x4000;
        if offset == SNA48_LENGTH {
            offset += 4;
        }
    }
    assert_eq!(offset, SNA128_LENGTH);
    let session = SnaSession::new(data);
    assert_eq!(session.bank_table().unwrap().order(), [5, 2, 1, 0, 3, 4, 6, 7]);
    let mut root = session.decode();
    assert_eq!(root.child("Banks: 5, 2, 1, 0, 3, 4, 6, 7").map(|n| n.kind.clone()), Some(NodeKind::Info));
    assert!(root.child("PC").unwrap().description.as_ref().unwrap().contains("Index (dec): 49179"));
    assert!(root.child("Port 7FFD").unwrap().description.as_ref().unwrap().contains("RAM bank: 1"));
    for name in ["Bank1: C000-FFFF", "Bank0:", "Bank3:", "Bank4:", "Bank6:", "Bank7:"].iter() {
        let name = *name;
        let bank = session.expand_path(&mut root, &[name]).unwrap();
        let first = &bank.children()[0];
        let expected = 0x10 + name[4..5].parse::<u32>().unwrap();
        assert_eq!(first.children()[0].number(), Some(expected), "{}", name);
    }
    let bank0 = root.child("Bank0:").unwrap();
    assert_eq!(bank0.children()[0].name, "0000");
    let bank1 = root.child("Bank1: C000-FFFF").unwrap();
    assert_eq!(bank1.children()[0].name, "C000");
    assert!(root.child("Bank5: 4000-7FFF").unwrap().is_deferred());
    let screen = session.expand_path(&mut root, &["Bank5: 4000-7FFF", "Screen"]).unwrap();
    assert_eq!(screen.children()[0].image().unwrap().width, 256);
}

#[test]
fn test_sna128_duplicated_bank() {
    let mut data = vec![0u8; SNA128_DUP_LENGTH];
    data[PORT_7FFD_OFFSET] = 0b0000_0010;
    let session = SnaSession::with_options(data, DecodeOptions::default().with_open_screen(false));
    let mut root = session.decode();
    assert!(root.child("Bank2: C000-FFFF").is_some());
    assert_eq!(root.children().iter().filter(|n| n.is_deferred()).count(), 9);
    session.expand_all(&mut root);
    let mut errors = 0;
    root.walk(&mut |node, _| if node.is_error() { errors += 1 });
    assert_eq!(errors, 0);
}

#[test]
fn test_screen_views() {
    let options = DecodeOptions::default()
                    .with_screen_views(ScreenViews::TIMEX_HI_RES | ScreenViews::TIMEX_HI_COL)
                    .with_hires_ink(ZxColor::Green);
    let session = SnaSession::with_options(snapshot48(), options);
    let root = session.decode();
    let screens = root.child("4000-7FFF").unwrap();
    let names: Vec<_> = screens.children().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Timex HiCol Screen", "Timex HiRes Screen", "Memory Dump"]);
    let hicol = &screens.children()[0];
    assert!(hicol.children()[0].image().is_some());
    assert!(screens.children()[1].is_deferred());
}

#[test]
fn test_sp_in_rom() {
    let mut data = snapshot48();
    data[23..25].copy_from_slice(&[0xFF, 0x3F]);
    let root = SnaSession::new(data).decode();
    let pc = root.child("PC").unwrap();
    assert_eq!(pc.value, Some(NodeValue::Undecodable { size: 2, reason: SP_IN_ROM.into() }));
}

#[test]
fn test_truncated() {
    let data = snapshot48();
    for &len in [0usize, 1, 10, 26, 27, 28, 100, 6912, 16411, 20000, 49178].iter() {
        let session = SnaSession::new(&data[..len]);
        assert_eq!(session.format(), SnaFormat::Invalid);
        let mut root = session.decode();
        assert!(root.children()[0].is_error());
        session.expand_all(&mut root);
        let (_, deferred) = count_nodes(&root);
        assert_eq!(deferred, 0);
        let mut errors = 0;
        root.walk(&mut |node, _| if node.is_error() { errors += 1 });
        assert!(errors >= 2, "{}", len);
    }
    let root = SnaSession::new(&data[..10]).decode();
    assert_eq!(root.child("HL").unwrap().value_string().unwrap(), "????");
    assert_eq!(root.child("I").unwrap().value_string().unwrap(), "00");
}

#[test]
fn test_garbage_never_panics() {
    let mut rng = SmallRng::seed_from_u64(0x5A5A);
    for _ in 0..20 {
        let len = match rng.gen_range(0..4) {
            0 => rng.gen_range(0..64),
            1 => SNA48_LENGTH,
            2 => SNA128_LENGTH,
            _ => rng.gen_range(0..SNA128_DUP_LENGTH + 100),
        };
        let mut data = vec![0u8; len];
        rng.fill(&mut data[..]);
        let options = DecodeOptions::default().with_screen_views(ScreenViews::all());
        let session = SnaSession::with_options(data, options);
        let mut root = session.decode();
        session.expand_all(&mut root);
        let (nodes, deferred) = count_nodes(&root);
        assert!(nodes > 20);
        assert_eq!(deferred, 0);
        assert!(!render::render(&root).is_empty());
    }
}

#[cfg(feature = "serialize")]
#[test]
fn test_json() {
    let session = SnaSession::new(snapshot48());
    let root = session.decode();
    let json = serde_json::to_value(&root).unwrap();
    assert_eq!(json["name"], "SNA");
    let children = json["children"]["Loaded"].as_array().unwrap();
    let sp = children.iter().find(|n| n["name"] == "SP").unwrap();
    assert_eq!(sp["value"]["Number"]["value"], 0xFF00);
    let dump = children.iter().find(|n| n["name"] == "8000-BFFF").unwrap();
    assert_eq!(dump["children"]["Deferred"]["offset"], 16411);
    let back: Node = serde_json::from_value(json).unwrap();
    assert_eq!(back, root);
    assert!(matches!(back.child("C000-FFFF").unwrap().children, Children::Deferred(..)));
}
