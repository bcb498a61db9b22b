// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # rmarsh
//!
//! rmarsh is a streaming encoder and decoder for the Ruby Marshal 4.8 wire format: the
//! self-describing, byte-oriented serialization Ruby's `Marshal.dump`/`Marshal.load` produce.
//!
//! # Usage
//!
//! 1. To read a stream, wrap any [`std::io::Read`] in a [`Parser`] and call
//!    [`Parser::next`][parser::Parser::next] one token at a time. Typed accessors (`int()`,
//!    `float()`, `bignum()`, `bytes()`/`text()`, `len()`, `link_id()`) expose the current token's
//!    payload; [`Parser::replay`][parser::Parser::replay] re-emits the token sequence of any
//!    previously parsed linkable value without rewinding the source.
//! 2. To write a stream, wrap any [`std::io::Write`] in a [`Generator`] and call its
//!    token-producing methods (`nil()`, `fixnum()`, `start_array()`/`end_array()`, ...) in the
//!    order the value graph should take.
//!
//! Both share the token alphabet and error taxonomy defined in [`core`]. This crate does not
//! include a reflection-driven binding layer between host-language values and this token
//! interface (a "Mapper"); callers walk the token stream directly or build such a layer on top.

pub use marshal_core as core;
pub use marshal_generator as generator;
pub use marshal_parser as parser;

pub use marshal_core::{Error, ErrorKind, Range, Result, Token};
pub use marshal_generator::{Generator, GeneratorOptions};
pub use marshal_parser::{Parser, ParserOptions};
