// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::Cursor;

use marshal::{Generator, Parser, Token};

/// A `Gem::Version`-shaped value: `UsrMarshal` wrapping an `Array` wrapping an `IVar`-wrapped
/// `String`, the same composite shape Ruby itself uses for that class.
#[test]
fn usrmarshal_wrapping_array_wrapping_ivar_string_round_trips() {
    let mut g = Generator::new(Vec::new()).unwrap();
    g.start_user_marshalled(b"Gem::Version").unwrap();
    g.start_array(1).unwrap();
    g.start_ivar(1).unwrap();
    g.string(b"1.2.3").unwrap();
    g.symbol(b"E").unwrap();
    g.bool(true).unwrap();
    g.end_ivar().unwrap();
    g.end_array().unwrap();
    g.end_user_marshalled().unwrap();
    let bytes = g.into_inner().unwrap();

    let mut p = Parser::new(Cursor::new(bytes)).unwrap();
    assert_eq!(p.next().unwrap(), Token::StartUsrMarshal);
    let class = p.next().unwrap();
    assert!(matches!(class, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "Gem::Version");
    assert_eq!(p.next().unwrap(), Token::StartArray(1));
    assert_eq!(p.next().unwrap(), Token::StartIVar);
    let s = p.next().unwrap();
    assert!(matches!(s, Token::String(_)));
    assert_eq!(p.text().unwrap(), "1.2.3");
    assert_eq!(p.next().unwrap(), Token::IVarProps(1));
    let key = p.next().unwrap();
    assert!(matches!(key, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "E");
    assert_eq!(p.next().unwrap(), Token::True);
    assert_eq!(p.next().unwrap(), Token::EndIVar);
    assert_eq!(p.next().unwrap(), Token::EndArray);
    assert_eq!(p.next().unwrap(), Token::EndUsrMarshal);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn hash_of_symbol_keys_round_trips() {
    let mut g = Generator::new(Vec::new()).unwrap();
    g.start_hash(2).unwrap();
    g.symbol(b"a").unwrap();
    g.fixnum(1).unwrap();
    g.symbol(b"b").unwrap();
    g.fixnum(2).unwrap();
    g.end_hash().unwrap();
    let bytes = g.into_inner().unwrap();

    let mut p = Parser::new(Cursor::new(bytes)).unwrap();
    assert_eq!(p.next().unwrap(), Token::StartHash(2));
    for (key, value) in [("a", 1i32), ("b", 2i32)] {
        let k = p.next().unwrap();
        assert!(matches!(k, Token::Symbol(_)));
        assert_eq!(p.text().unwrap(), key);
        assert_eq!(p.next().unwrap(), Token::Fixnum(value));
    }
    assert_eq!(p.next().unwrap(), Token::EndHash);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn bignum_round_trips_through_generator_and_parser() {
    use num_bigint::BigInt;

    let mut g = Generator::new(Vec::new()).unwrap();
    let n: BigInt = "123456789012345678901234567890".parse().unwrap();
    g.bignum(&n).unwrap();
    let bytes = g.into_inner().unwrap();

    let mut p = Parser::new(Cursor::new(bytes)).unwrap();
    let tok = p.next().unwrap();
    assert!(matches!(tok, Token::Bignum { positive: true, .. }));
    assert_eq!(p.bignum().unwrap(), n);
}

#[test]
fn fixnum_overflow_promotes_and_round_trips_as_bignum() {
    use marshal_core::format::FIXNUM_MAX;
    use num_bigint::BigInt;

    let mut g = Generator::new(Vec::new()).unwrap();
    g.fixnum(FIXNUM_MAX + 1000).unwrap();
    let bytes = g.into_inner().unwrap();

    let mut p = Parser::new(Cursor::new(bytes)).unwrap();
    let tok = p.next().unwrap();
    assert!(matches!(tok, Token::Bignum { .. }));
    assert_eq!(p.bignum().unwrap(), BigInt::from(FIXNUM_MAX + 1000));
}
