// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The parser's growable read buffer.
//!
//! Unlike `symphonia_core::io::MediaSourceStream`'s ring buffer, which discards consumed bytes
//! once they fall outside its read-ahead window, this buffer never discards anything for the
//! life of the stream: symbol-table and link-table entries, and `replay()`, all refer back into
//! it by byte range and must remain valid for as long as the `Parser` that produced them is
//! alive. `reset()` is the only way to reclaim its capacity.

use std::io::Read;

use marshal_core::errors::unexpected_eof_error;
use marshal_core::range::Range;
use marshal_core::Result;

/// Growable, append-only byte buffer fed on demand from an underlying [`Read`].
pub struct StreamBuffer<R> {
    source: R,
    buf: Vec<u8>,
    source_eof: bool,
}

impl<R: Read> StreamBuffer<R> {
    pub fn new(source: R, initial_capacity: usize) -> Self {
        StreamBuffer { source, buf: Vec::with_capacity(initial_capacity), source_eof: false }
    }

    /// Replaces the source and drops all buffered bytes, for reuse across streams.
    pub fn reset(&mut self, source: R) {
        self.source = source;
        self.buf.clear();
        self.source_eof = false;
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Ensures at least `upto` bytes are buffered, pulling more from the source as needed.
    /// Fails with `UnexpectedEof` if the source is exhausted before `upto` bytes are available.
    pub fn require(&mut self, upto: u64) -> Result<()> {
        while (self.buf.len() as u64) < upto {
            if self.source_eof {
                return unexpected_eof_error(self.buf.len() as u64);
            }
            let mut chunk = [0u8; 4096];
            let n = self.source.read(&mut chunk)?;
            if n == 0 {
                self.source_eof = true;
                continue;
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    pub fn byte_at(&self, offset: u64) -> u8 {
        self.buf[offset as usize]
    }

    pub fn slice(&self, range: Range) -> &[u8] {
        &self.buf[range.begin as usize..range.end as usize]
    }
}
