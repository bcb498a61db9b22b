// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The symbol table and link table: two separate, append-only identifier spaces, each a
//! growable vector of [`Range`]s into the parser's read buffer.

use log::trace;
use marshal_core::range::Range;

/// Interning table for `Symbol`s. A `Symlink` token's id is a strict zero-based index into this
/// table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Range>,
}

impl SymbolTable {
    pub fn push(&mut self, range: Range) -> u64 {
        let id = self.entries.len() as u64;
        trace!("symbol table insert id={id} range={range:?}");
        self.entries.push(range);
        id
    }

    pub fn get(&self, id: u64) -> Option<Range> {
        self.entries.get(id as usize).copied()
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Table of every *linkable* value's byte range, in the order they first appeared. A `Link`
/// token's id is a strict zero-based index into this table.
#[derive(Debug, Default)]
pub struct LinkTable {
    entries: Vec<Range>,
}

impl LinkTable {
    /// Reserves the next id for a linkable value whose opening byte is at `begin`; its `end` is
    /// filled in later by [`Self::finish`].
    pub fn open(&mut self, begin: u64) -> u64 {
        let id = self.entries.len() as u64;
        trace!("link table open id={id} begin={begin}");
        self.entries.push(Range::open_at(begin));
        id
    }

    pub fn finish(&mut self, id: u64, end: u64) {
        if let Some(entry) = self.entries.get_mut(id as usize) {
            entry.end = end;
        }
    }

    pub fn get(&self, id: u64) -> Option<Range> {
        self.entries.get(id as usize).copied()
    }

    /// Finds the id of the entry whose linkable value opens at `begin`, for replay sub-parsers
    /// re-deriving link ids for values the original parse already recorded. Entries are appended
    /// in increasing `begin` order, so this binary-searches rather than scanning linearly.
    pub fn find_by_begin(&self, begin: u64) -> Option<u64> {
        self.entries
            .binary_search_by_key(&begin, |range| range.begin)
            .ok()
            .map(|idx| idx as u64)
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
