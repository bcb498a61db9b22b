// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Tunables accepted by [`crate::Generator::with_options`].
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    /// The internal write buffer is flushed to the sink once it exceeds this many bytes (in
    /// addition to always flushing when the top-level value completes).
    pub flush_threshold: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions { flush_threshold: 8 * 1024 }
    }
}
