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
//! # SNAVIEW
//!
//! Decodes ZX Spectrum **SNA** snapshots (48k and 128k) into a tree of named nodes:
//! registers, memory banks, memory dumps and screen images.
//!
//! Header fields are decoded up front, memory regions are decoded only when their node
//! is expanded.
//!
//! ```no_run
//! use snaview::{SnaSession, render};
//!
//! let data = std::fs::read("game.sna").unwrap();
//! let session = SnaSession::new(data);
//! let mut root = session.decode();
//! session.expand_path(&mut root, &["8000-BFFF"]);
//! println!("{}", render::render(&root));
//! ```
//!
//! Truncated or malformed data never fails the decode. Fields that can't be read have
//! `?` placeholder values and regions that can't be decoded contain error nodes.

pub mod render;

pub use snaview_core::{error, flags, node, reader, video};
pub use snaview_formats::{copper, memdump, palette, screen, sna, view};
pub use snaview_formats::{DecodeOptions, SnaFormat, SnaSession};
pub use snaview_core::node::{Node, NodeKind, NodeValue};
