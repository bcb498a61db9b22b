// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! A pull-based, token-emitting parser for the Ruby Marshal 4.8 wire format.
//!
//! [`Parser`] wraps an arbitrary [`std::io::Read`] source. Call [`Parser::next`] to advance one
//! token at a time, and the payload accessors (`int()`, `float()`, `bignum()`, `bytes()`/
//! `text()`, `len()`, `link_id()`) to read the current token. [`Parser::replay`] re-emits the
//! token sequence of any previously parsed linkable value using buffered bytes, without
//! re-reading the source.

mod buffer;
mod context;
mod options;
mod parser;
mod tables;

pub use options::ParserOptions;
pub use parser::Parser;
