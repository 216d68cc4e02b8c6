/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
use core::fmt;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;

bitflags! {
    /// ZX Spectrum 128k memory paging flags as saved in the snapshot.
    ///
    /// I/O port matching: `01xx_xxxx_xxxx_xx0x` (`0x7ffd`).
    ///
    /// | Dir | b7  | b6  | b5  | b4  | b3  | b2  | b1  | b0  |
    /// |-----|-----|-----|-----|-----|-----|-----|-----|-----|
    /// | OUT |     |     | LCK | ROM | SCR | RB2 | RB1 | RB0 |
    ///
    /// RAM bank: `RB2 * 4 + RB1 * 2 + RB0`.
    ///
    /// SCR bank: `0 in RAM5, 1 in RAM7`.
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    #[derive(Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
    pub struct Port7ffdFlags: u8 {
        const RAM_BANK0     = 0b00_0001;
        const RAM_BANK1     = 0b00_0010;
        const RAM_BANK2     = 0b00_0100;
        const SCREEN_BANK   = 0b00_1000;
        const ROM_BANK      = 0b01_0000;
        const LOCK_MMU      = 0b10_0000;
    }
}

impl Port7ffdFlags {
    pub const RAM_BANK_MASK: Self = Self::from_bits_retain(0b111);
    pub const PAGED_IN_MASK: Self = Self::from_bits_retain(0b011);

    /// Creates flags from the raw port `data` by truncating unused bits.
    #[inline]
    pub fn from_data(data: u8) -> Self {
        Self::from_bits_truncate(data)
    }
    /// Returns the bank number the snapshot layout treats as the one paged in at `0xC000`.
    ///
    /// Only bits `b0-b1` are taken into account.
    pub fn paged_in_bank(self) -> u8 {
        (self & Self::PAGED_IN_MASK).bits()
    }
    /// Returns the full RAM bank index selected by bits `b0-b2`.
    pub fn ram_bank(self) -> u8 {
        (self & Self::RAM_BANK_MASK).bits()
    }
    /// Returns the ROM bank index.
    pub fn rom_bank(self) -> u8 {
        self.intersects(Self::ROM_BANK).into()
    }
    /// Returns `true` if the shadow screen in RAM7 is selected.
    pub fn is_shadow_screen(self) -> bool {
        self.intersects(Self::SCREEN_BANK)
    }
    /// Returns `true` if further paging is locked.
    pub fn is_mmu_locked(self) -> bool {
        self.intersects(Self::LOCK_MMU)
    }
}

impl fmt::Display for Port7ffdFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RAM bank: {}, screen: {}, ROM: {}{}",
            self.ram_bank(),
            if self.is_shadow_screen() { "bank 7" } else { "bank 5" },
            self.rom_bank(),
            if self.is_mmu_locked() { ", paging locked" } else { "" })
    }
}

bitflags! {
    /// Selects screen interpretations offered for the screen memory region.
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
    pub struct ScreenViews: u8 {
        /// The standard 256x192 ULA screen with 8x8 attributes.
        const ULA          = 0b001;
        /// The Timex 256x192 hi-color screen with 8x1 attributes.
        const TIMEX_HI_COL = 0b010;
        /// The Timex 512x192 two color hi-res screen.
        const TIMEX_HI_RES = 0b100;
    }
}

impl Default for ScreenViews {
    fn default() -> Self {
        ScreenViews::ULA
    }
}
