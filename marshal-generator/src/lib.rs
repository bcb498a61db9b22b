// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A push-based, structurally-validating writer for the Ruby Marshal 4.8 wire format.
//!
//! [`Generator`] wraps an arbitrary [`std::io::Write`] sink. Each public method writes one token
//! of the Marshal alphabet and checks it against the currently open frame; violating a structural
//! invariant (writing past a declared count, a non-symbol in key position, an unbalanced `end_*`,
//! or writing after the single top-level value is complete) fails with the matching
//! [`marshal_core::ErrorKind`] rather than producing a malformed stream.

mod context;
mod generator;
mod options;
mod symtab;

pub use generator::Generator;
pub use options::GeneratorOptions;
