// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use marshal_core::format;

#[test]
fn composite_openers_are_linkable() {
    for byte in [
        format::TYPE_BIGNUM,
        format::TYPE_FLOAT,
        format::TYPE_STRING,
        format::TYPE_REGEXP,
        format::TYPE_ARRAY,
        format::TYPE_HASH,
        format::TYPE_IVAR,
        format::TYPE_OBJECT,
        format::TYPE_USRMARSHAL,
        format::TYPE_USRDEF,
        format::TYPE_STRUCT,
    ] {
        assert!(format::is_linkable_type(byte), "{byte} should be linkable");
    }
}

#[test]
fn symbols_and_singletons_are_not_linkable() {
    // Symbols get their own table; nil/true/false/fixnum are too small to bother sharing.
    for byte in [
        format::TYPE_SYMBOL,
        format::TYPE_SYMLINK,
        format::TYPE_NIL,
        format::TYPE_TRUE,
        format::TYPE_FALSE,
        format::TYPE_FIXNUM,
        format::TYPE_LINK,
    ] {
        assert!(!format::is_linkable_type(byte), "{byte} should not be linkable");
    }
}

#[test]
fn class_and_module_are_not_linkable() {
    // `c`/`m` name a constant already resolvable by name; Marshal never back-references them.
    assert!(!format::is_linkable_type(format::TYPE_CLASS));
    assert!(!format::is_linkable_type(format::TYPE_MODULE));
}

#[test]
fn fixnum_bounds_are_symmetric_around_thirty_bits() {
    assert_eq!(format::FIXNUM_MAX, 0x3FFF_FFFF);
    assert_eq!(format::FIXNUM_MIN, -0x3FFF_FFFF);
}

#[test]
fn regexp_flags_round_trip_through_bits() {
    use format::RegexpFlags;

    let combo = RegexpFlags::IGNORECASE | RegexpFlags::MULTILINE;
    assert_eq!(RegexpFlags::from_bits(combo.bits()), Some(combo));
    assert!(combo.contains(RegexpFlags::IGNORECASE));
    assert!(!combo.contains(RegexpFlags::EXTENDED));
}
