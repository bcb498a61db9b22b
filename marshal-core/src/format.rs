// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Byte-level constants for the Marshal 4.8 wire format: the stream magic and the type-byte
//! table (§6 of the format description).

/// Major version byte that opens every stream.
pub const MAGIC_MAJOR: u8 = 4;
/// Minor version byte that opens every stream.
pub const MAGIC_MINOR: u8 = 8;

pub const TYPE_NIL: u8 = b'0';
pub const TYPE_TRUE: u8 = b'T';
pub const TYPE_FALSE: u8 = b'F';
pub const TYPE_FIXNUM: u8 = b'i';
pub const TYPE_BIGNUM: u8 = b'l';
pub const TYPE_FLOAT: u8 = b'f';
pub const TYPE_SYMBOL: u8 = b':';
pub const TYPE_SYMLINK: u8 = b';';
pub const TYPE_STRING: u8 = b'"';
pub const TYPE_REGEXP: u8 = b'/';
pub const TYPE_ARRAY: u8 = b'[';
pub const TYPE_HASH: u8 = b'{';
pub const TYPE_IVAR: u8 = b'I';
pub const TYPE_CLASS: u8 = b'c';
pub const TYPE_MODULE: u8 = b'm';
pub const TYPE_OBJECT: u8 = b'o';
pub const TYPE_USRMARSHAL: u8 = b'U';
pub const TYPE_USRDEF: u8 = b'u';
pub const TYPE_STRUCT: u8 = b'S';
pub const TYPE_LINK: u8 = b'@';

/// Inclusive bound on a `long`-encodable fixnum. Values outside `[-FIXNUM_MAX, FIXNUM_MAX]`
/// must be promoted to [`TYPE_BIGNUM`].
pub const FIXNUM_MAX: i64 = 0x3FFF_FFFF;
/// Inclusive lower bound on a `long`-encodable fixnum.
pub const FIXNUM_MIN: i64 = -0x3FFF_FFFF;

bitflags::bitflags! {
    /// Regexp option flags, stored as a single trailing byte after the expression text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegexpFlags: u8 {
        const IGNORECASE = 0x01;
        const EXTENDED = 0x02;
        const MULTILINE = 0x04;
        const FIXEDENCODING = 0x10;
        const NOENCODING = 0x20;
    }
}

/// Returns `true` if `byte` is a type byte that introduces a *linkable* value: one whose first
/// appearance adds an entry to the link table. Symbols are intentionally excluded; they are
/// tracked by the separate symbol table.
pub fn is_linkable_type(byte: u8) -> bool {
    matches!(
        byte,
        TYPE_BIGNUM
            | TYPE_FLOAT
            | TYPE_STRING
            | TYPE_REGEXP
            | TYPE_ARRAY
            | TYPE_HASH
            | TYPE_IVAR
            | TYPE_OBJECT
            | TYPE_USRMARSHAL
            | TYPE_USRDEF
            | TYPE_STRUCT
    )
}
