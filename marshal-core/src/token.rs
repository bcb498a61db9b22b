// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The token alphabet shared by the parser's pull interface and the generator's structural
//! bookkeeping.

use crate::format::RegexpFlags;
use crate::range::Range;

/// One unit of a Marshal token stream.
///
/// `Range`-valued fields (`Symbol`, `String`, `Float`, `Bignum`'s digit text, `Regexp`'s
/// expression) refer back into the parser's read buffer rather than owning their bytes; see
/// [`crate::Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Nil,
    True,
    False,
    Fixnum(i32),
    /// Sign (`true` for non-negative) and the half-open range of little-endian magnitude bytes
    /// as they appear on the wire.
    Bignum { positive: bool, magnitude: Range },
    /// The decimal ASCII text of the float, as it appears on the wire.
    Float(Range),
    Symbol(Range),
    String(Range),
    Regexp { expr: Range, flags: RegexpFlags },
    StartArray(u64),
    EndArray,
    StartHash(u64),
    EndHash,
    StartIVar,
    /// Emitted after the wrapped value of an `IVar`, carrying the number of symbol/value pairs
    /// that follow.
    IVarProps(u64),
    EndIVar,
    Class(Range),
    Module(Range),
    StartObject(u64),
    EndObject,
    StartUsrMarshal,
    EndUsrMarshal,
    /// `user_defined`: unlike `UsrMarshal`, the payload is an opaque byte blob rather than a
    /// nested value, so the class name and data travel together on one token.
    UsrDef { class: Range, data: Range },
    StartStruct(u64),
    EndStruct,
    /// A back-reference to a previously parsed linkable value.
    Link(u64),
    /// The source has no more values; sticky once observed.
    Eof,
}

impl Token {
    /// `true` for tokens that introduce a *linkable* value (gets a link table entry): every
    /// scalar and composite opener except `Symbol`, which is tracked by the symbol table
    /// instead.
    pub fn is_linkable_open(&self) -> bool {
        matches!(
            self,
            Token::Bignum { .. }
                | Token::Float(_)
                | Token::String(_)
                | Token::Regexp { .. }
                | Token::StartArray(_)
                | Token::StartHash(_)
                | Token::StartIVar
                | Token::StartObject(_)
                | Token::StartUsrMarshal
                | Token::UsrDef { .. }
                | Token::StartStruct(_)
        )
    }

    /// `true` for the opener half of a Start/End token pair.
    pub fn is_composite_open(&self) -> bool {
        matches!(
            self,
            Token::StartArray(_)
                | Token::StartHash(_)
                | Token::StartIVar
                | Token::StartObject(_)
                | Token::StartUsrMarshal
                | Token::StartStruct(_)
        )
    }
}
