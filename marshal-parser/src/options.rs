// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Tunables accepted by [`crate::Parser::with_options`].
///
/// Mirrors `symphonia_core::io::MediaSourceStreamOptions`: a single knob for the initial buffer
/// capacity. Unlike that stream, this one never bounds the buffer's eventual size — it must be
/// allowed to grow for as long as the parser's link/symbol tables and any in-flight `replay()`
/// depend on it.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    pub initial_buffer_capacity: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { initial_buffer_capacity: 4 * 1024 }
    }
}
