/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    SNAVIEW is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    SNAVIEW is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! ZX Spectrum snapshot and screen decoders.
// http://www.worldofspectrum.org/faq/reference/formats.htm
// https://wiki.specnext.dev/Layer_2
pub mod copper;
pub mod memdump;
pub mod palette;
pub mod screen;
pub mod sna;
pub mod view;

pub use sna::{DecodeOptions, SnaFormat, SnaSession};
