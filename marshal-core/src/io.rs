// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal byte-reading and byte-writing traits shared by the parser and generator crates.
//!
//! Modeled on `symphonia_core::io::ReadBytes`, trimmed to the handful of primitives the long
//! codec and the token readers/writers actually need: single bytes, fixed-size buffers, and a
//! running position used to stamp errors with a byte offset.

use crate::errors::{unexpected_eof_error, Result};

/// A source of bytes that tracks how many have been consumed so far.
pub trait ReadBytes {
    /// Reads exactly one byte, or fails with [`crate::ErrorKind::UnexpectedEof`].
    fn read_byte(&mut self) -> Result<u8>;

    /// Fills `buf` completely, or fails with [`crate::ErrorKind::UnexpectedEof`].
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<()>;

    /// The number of bytes consumed from this source so far.
    fn pos(&self) -> u64;
}

/// A sink of bytes that tracks how many have been produced so far.
pub trait WriteBytes {
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    fn write_buf(&mut self, buf: &[u8]) -> Result<()>;

    /// The number of bytes written to this sink so far.
    fn pos(&self) -> u64;
}

/// `ReadBytes` over an in-memory slice, used by replay sub-parsers and by unit tests. Never
/// returns `UnexpectedEof` mid-buffer in a way that surprises the caller: reading past the end
/// reports the offset at which the read was attempted.
pub struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        SliceReader { buf, pos: 0 }
    }
}

impl<'a> ReadBytes for SliceReader<'a> {
    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.buf.len() {
            return unexpected_eof_error(self.pos as u64);
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.pos + buf.len() > self.buf.len() {
            return unexpected_eof_error(self.pos as u64);
        }
        buf.copy_from_slice(&self.buf[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn pos(&self) -> u64 {
        self.pos as u64
    }
}
