/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! **SNA** register fields.
use core::fmt;
use std::borrow::Cow;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use arrayvec::ArrayVec;

use snaview_core::flags::Port7ffdFlags;
use snaview_core::node::{hex_string, Node, NodeKind, NodeValue};
use snaview_core::reader::ByteReader;
use snaview_core::video::ZxColor;

use super::{SnaFormat, HEADER_SIZE, SNA48_LENGTH, RAM_ADDRESS};

/// The placeholder reason of a field that couldn't be read.
pub const PARSE_ERROR: &str = "Error while parsing.";
/// The placeholder reason of the 48k PC when SP points to ROM.
pub const SP_IN_ROM: &str = "SP points to ROM. Can't decode PC.";
/// The description of the 48k PC.
pub const PC_DERIVED: &str = "PC is derived from the location SP points to.";

/// The maximum number of registers in a register set.
pub const MAX_REGISTERS: usize = 19;

/// Names of the snapshot fields holding the CPU and hardware state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterName {
    I, HlAlt, DeAlt, BcAlt, AfAlt, Hl, De, Bc, Iy, Ix,
    /// Bit 2 holds IFF2.
    Interrupt,
    R, Af, Sp,
    /// Interrupt mode.
    Im,
    Border,
    /// Derived from the stack in 48k snapshots, stored after the paged bank in 128k ones.
    Pc,
    /// 128k only.
    Port7ffd,
    /// 128k only.
    TrDosRom,
}

/*
   Offset   Size   Description
   ------------------------------------------------------------------------
   0        1      byte   I
   1        8      word   HL', DE', BC', AF'
   9        10     word   HL, DE, BC, IY, IX
   19       1      byte   Interrupt (bit 2 = IFF2)
   20       1      byte   R
   21       2      word   AF
   23       2      word   SP
   25       1      byte   IntMode
   26       1      byte   BorderColor
   ------------------------------------------------------------------------
*/
/// The header fields in the order they are stored.
pub const HEADER_LAYOUT: [RegisterName; 16] = {
    use RegisterName::*;
    [I, HlAlt, DeAlt, BcAlt, AfAlt, Hl, De, Bc, Iy, Ix, Interrupt, R, Af, Sp, Im, Border]
};

/// The 128k fields stored after the paged bank, in order.
pub const EXTENSION_LAYOUT: [RegisterName; 3] = [RegisterName::Pc, RegisterName::Port7ffd, RegisterName::TrDosRom];

impl RegisterName {
    pub fn label(self) -> &'static str {
        use RegisterName::*;
        match self {
            I         => "I",
            HlAlt     => "HL'",
            DeAlt     => "DE'",
            BcAlt     => "BC'",
            AfAlt     => "AF'",
            Hl        => "HL",
            De        => "DE",
            Bc        => "BC",
            Iy        => "IY",
            Ix        => "IX",
            Interrupt => "Interrupt",
            R         => "R",
            Af        => "AF",
            Sp        => "SP",
            Im        => "IM",
            Border    => "Border",
            Pc        => "PC",
            Port7ffd  => "Port 7FFD",
            TrDosRom  => "TRDOS ROM",
        }
    }
    /// The field size in bytes.
    pub fn size(self) -> usize {
        use RegisterName::*;
        match self {
            I|Interrupt|R|Im|Border|Port7ffd|TrDosRom => 1,
            _ => 2
        }
    }
}

impl fmt::Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded register field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    pub name: RegisterName,
    /// The buffer offset of the field.
    pub offset: usize,
    /// The field value or the reason it couldn't be decoded.
    pub value: Result<u16, Cow<'static, str>>,
    /// `true` if the field is not stored in sequence but read from elsewhere (the 48k PC).
    pub derived: bool,
}

impl Register {
    pub fn size(&self) -> usize {
        self.name.size()
    }

    pub fn value(&self) -> Option<u16> {
        self.value.as_ref().ok().copied()
    }

    pub fn node_value(&self) -> NodeValue {
        let size = self.size();
        match &self.value {
            Ok(value) => NodeValue::Number { value: (*value).into(), size },
            Err(reason) => NodeValue::Undecodable { size, reason: reason.clone() }
        }
    }
    /// Returns a human readable interpretation of the value if the field has one.
    pub fn meaning(&self) -> Option<String> {
        let value = self.value()?;
        Some(match self.name {
            RegisterName::Interrupt => {
                format!("IFF2: {}", if value & 0b100 != 0 { "enabled" } else { "disabled" })
            }
            RegisterName::Im => format!("Interrupt mode: {}", value),
            RegisterName::Border => {
                let color = (value <= 7).then(|| ZxColor::from_bits_truncate(value as u8).to_string());
                format!("Border color: {}", color.as_deref().unwrap_or("UNKNOWN"))
            }
            RegisterName::Port7ffd => Port7ffdFlags::from_data(value as u8).to_string(),
            RegisterName::TrDosRom => {
                format!("TR-DOS ROM {}", if value != 0 { "paged in" } else { "not paged in" })
            }
            _ => return None
        })
    }
    /// Returns the presentation node of the field.
    pub fn node(&self) -> Node {
        let label = self.name.label();
        let mut description = if self.derived {
            PC_DERIVED.to_string()
        }
        else {
            format!("{}\nIndex (hex): {}\nIndex (dec): {}", label, hex_string(self.offset as u32, 4), self.offset)
        };
        match &self.value {
            Ok(value) => description.push_str(&format!("\n{}: {} (dec)", label, value)),
            Err(reason) => { description.push('\n'); description.push_str(reason) }
        }
        if let Some(meaning) = self.meaning() {
            description.push('\n');
            description.push_str(&meaning);
        }
        Node::new(NodeKind::Field, label, self.offset, self.size())
            .with_value(self.node_value())
            .with_description(description)
    }
}

/// An ordered collection of decoded registers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterSet {
    registers: ArrayVec<Register, MAX_REGISTERS>,
}

impl RegisterSet {
    pub fn get(&self, name: RegisterName) -> Option<&Register> {
        self.registers.iter().find(|reg| reg.name == name)
    }
    /// Returns the decoded value of the register `name`.
    pub fn value(&self, name: RegisterName) -> Option<u16> {
        self.get(name).and_then(Register::value)
    }

    pub fn iter(&self) -> impl Iterator<Item=&Register> {
        self.registers.iter()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    fn push(&mut self, register: Register) {
        if self.registers.try_push(register).is_err() {
            error!("register set overflow");
        }
    }
}

fn read_register(rd: &mut ByteReader<'_>, name: RegisterName) -> Register {
    let value = rd.read_value(name.size())
                  .map(|value| value as u16)
                  .map_err(|err| {
                      debug!("{}: {}", name, err);
                      Cow::Borrowed(PARSE_ERROR)
                  });
    Register { name, offset: rd.field_offset(), value, derived: false }
}

/// Returns the 48k PC read from the top of the stack.
fn derive_pc(rd: &ByteReader<'_>, sp: &Result<u16, Cow<'static, str>>) -> Register {
    let sp = match sp {
        Ok(sp) => *sp,
        Err(_) => {
            return Register { name: RegisterName::Pc, offset: HEADER_SIZE, value: Err(PARSE_ERROR.into()), derived: true }
        }
    };
    if sp < RAM_ADDRESS {
        return Register { name: RegisterName::Pc, offset: HEADER_SIZE, value: Err(SP_IN_ROM.into()), derived: true }
    }
    let offset = HEADER_SIZE + usize::from(sp - RAM_ADDRESS);
    let value = rd.peek_u16(offset).map_err(|err| {
        debug!("PC: {}", err);
        Cow::Borrowed(PARSE_ERROR)
    });
    Register { name: RegisterName::Pc, offset, value, derived: true }
}

/// Decodes the snapshot registers.
///
/// The 16 header fields are always decoded. For the 48k (and invalid) format the PC is
/// derived from the stack, for the 128k format the PC, port 0x7ffd and TR-DOS fields are
/// read from after the paged bank. Fields that don't fit in `data` get a placeholder
/// value.
pub fn decode_registers(data: &[u8], format: SnaFormat) -> RegisterSet {
    let mut rd = ByteReader::new(data);
    let mut set = RegisterSet::default();
    for &name in HEADER_LAYOUT.iter() {
        let register = read_register(&mut rd, name);
        let is_sp = name == RegisterName::Sp;
        let sp = register.value.clone();
        set.push(register);
        if is_sp && format != SnaFormat::Zx128k {
            set.push(derive_pc(&rd, &sp));
        }
    }
    if format == SnaFormat::Zx128k {
        rd.seek(SNA48_LENGTH);
        for &name in EXTENSION_LAYOUT.iter() {
            set.push(read_register(&mut rd, name));
        }
    }
    set
}
