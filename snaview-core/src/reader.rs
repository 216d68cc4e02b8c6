/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! A forward moving cursor over the snapshot bytes.
use core::fmt;

/// The error returned when a field would extend past the end of the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutOfRange {
    /// The buffer offset of the requested field.
    pub offset: usize,
    /// The requested field size in bytes.
    pub size: usize,
    /// The total length of the buffer.
    pub len: usize,
}

impl std::error::Error for OutOfRange {}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reading {} byte(s) at offset {} exceeds the buffer length {}",
                self.size, self.offset, self.len)
    }
}

/// Returns `size` bytes of `data` starting at `offset`.
pub fn region(data: &[u8], offset: usize, size: usize) -> Result<&[u8], OutOfRange> {
    offset.checked_add(size)
          .and_then(|end| data.get(offset..end))
          .ok_or(OutOfRange { offset, size, len: data.len() })
}

/// A cursor over an immutable byte buffer.
///
/// Each [ByteReader::read] marks the next `size` bytes as the *active field* and moves
/// the cursor past it, regardless of whether the field fits in the buffer. The active
/// field is then inspected with [ByteReader::value], [ByteReader::bytes] or
/// [ByteReader::text]. This way a truncated buffer still keeps the offsets of all
/// subsequent fields in place.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    field: usize,
    size: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new cursor at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader::at(data, 0)
    }
    /// Creates a new cursor at the given `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        ByteReader { data, offset, field: offset, size: 0 }
    }
    /// Returns the whole underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
    /// Returns the current cursor position.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
    /// Returns the offset of the active field.
    #[inline]
    pub fn field_offset(&self) -> usize {
        self.field
    }
    /// Returns the size of the active field.
    #[inline]
    pub fn field_size(&self) -> usize {
        self.size
    }
    /// Returns the number of bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }
    /// Moves the cursor to `offset`, clearing the active field.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
        self.field = offset;
        self.size = 0;
    }
    /// Advances the cursor by `size` bytes without making them the active field.
    /// Returns the offset the skipped region starts at.
    pub fn skip(&mut self, size: usize) -> usize {
        let start = self.offset;
        self.offset = start.saturating_add(size);
        start
    }
    /// Marks the next `size` bytes as the active field and advances the cursor past it.
    ///
    /// The cursor advances even if the field does not fit in the buffer, in which case
    /// an error is returned.
    pub fn read(&mut self, size: usize) -> Result<(), OutOfRange> {
        self.field = self.offset;
        self.size = size;
        self.offset = self.offset.saturating_add(size);
        self.check()
    }
    /// Reads the next `size` bytes and returns their little-endian value.
    pub fn read_value(&mut self, size: usize) -> Result<u32, OutOfRange> {
        self.read(size)?;
        self.value()
    }
    /// Returns the bytes of the active field.
    pub fn bytes(&self) -> Result<&'a [u8], OutOfRange> {
        region(self.data, self.field, self.size)
    }
    /// Returns the little-endian value of the active field.
    ///
    /// Only fields up to 4 bytes long are meaningful, the more significant bytes overflow.
    pub fn value(&self) -> Result<u32, OutOfRange> {
        let mut value = 0u32;
        let mut factor = 1u32;
        for &byte in self.bytes()? {
            value = value.wrapping_add(factor.wrapping_mul(byte.into()));
            factor = factor.wrapping_mul(256);
        }
        Ok(value)
    }
    /// Returns the active field as text, one character per byte.
    pub fn text(&self) -> Result<String, OutOfRange> {
        Ok(self.bytes()?.iter().copied().map(char::from).collect())
    }
    /// Returns a byte at the absolute `offset` without moving the cursor.
    pub fn peek_u8(&self, offset: usize) -> Result<u8, OutOfRange> {
        region(self.data, offset, 1).map(|b| b[0])
    }
    /// Returns a little-endian word at the absolute `offset` without moving the cursor.
    pub fn peek_u16(&self, offset: usize) -> Result<u16, OutOfRange> {
        region(self.data, offset, 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn check(&self) -> Result<(), OutOfRange> {
        region(self.data, self.field, self.size).map(drop)
    }
}
