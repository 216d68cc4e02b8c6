/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of SNAVIEW, a Rust library for decoding ZX Spectrum snapshots.

    For the full copyright notice, see the lib.rs file.
*/
//! Decoding errors.
use core::fmt;
use std::io;

use crate::reader::OutOfRange;
use crate::video::ImageDecodeError;

/// Errors that may occur while decoding a snapshot.
///
/// None of them is fatal to a decode session. They are recovered at the smallest
/// enclosing unit (a field, a memory dump or an image) and turned into placeholder
/// values or inline error nodes.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer length doesn't match any known snapshot variant.
    InvalidLength(usize),
    /// A field would extend past the end of the buffer.
    OutOfRange(OutOfRange),
    /// A screen or palette couldn't be reconstructed.
    Image(ImageDecodeError),
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidLength(..) => None,
            DecodeError::OutOfRange(err) => Some(err),
            DecodeError::Image(err) => Some(err),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidLength(len) => write!(f, "wrong length of the SNA data: {}", len),
            DecodeError::OutOfRange(err) => err.fmt(f),
            DecodeError::Image(err) => err.fmt(f),
        }
    }
}

impl From<OutOfRange> for DecodeError {
    fn from(err: OutOfRange) -> Self {
        DecodeError::OutOfRange(err)
    }
}

impl From<ImageDecodeError> for DecodeError {
    fn from(err: ImageDecodeError) -> Self {
        DecodeError::Image(err)
    }
}

impl From<DecodeError> for io::Error {
    fn from(err: DecodeError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_works() {
        let oor = OutOfRange { offset: 10, size: 2, len: 11 };
        let err = DecodeError::from(oor);
        assert_eq!(err, DecodeError::OutOfRange(oor));
        assert_eq!(err.to_string(), "reading 2 byte(s) at offset 10 exceeds the buffer length 11");
        let err = DecodeError::from(ImageDecodeError::from(oor));
        assert!(std::error::Error::source(&err).is_some());
        let ioerr = io::Error::from(DecodeError::InvalidLength(3));
        assert_eq!(ioerr.kind(), io::ErrorKind::InvalidData);
        assert_eq!(ioerr.to_string(), "wrong length of the SNA data: 3");
    }
}
