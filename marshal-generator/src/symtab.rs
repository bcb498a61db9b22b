// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generator's symbol interning table: maps already-written symbol text to its emit index,
//! the mirror image of the parser's `SymbolTable` of ranges.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SymbolTable {
    ids: HashMap<Vec<u8>, u64>,
}

impl SymbolTable {
    /// Returns the existing id for `name`, or interns it and returns `None`.
    pub fn intern(&mut self, name: &[u8]) -> Option<u64> {
        if let Some(&id) = self.ids.get(name) {
            return Some(id);
        }
        let id = self.ids.len() as u64;
        self.ids.insert(name.to_vec(), id);
        None
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
