// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::Cursor;

use marshal_core::Token;
use marshal_parser::Parser;

fn parser_for(bytes: Vec<u8>) -> Parser<Cursor<Vec<u8>>> {
    Parser::new(Cursor::new(bytes)).expect("valid magic")
}

fn long_bytes(n: i64) -> Vec<u8> {
    let mut out = Vec::new();
    marshal_core::longcodec::encode_long(n, &mut out).unwrap();
    out
}

#[test]
fn nil_true_false() {
    for (byte, expect) in [(b'0', Token::Nil), (b'T', Token::True), (b'F', Token::False)] {
        let mut stream = vec![4, 8, byte];
        let mut p = parser_for(std::mem::take(&mut stream));
        assert_eq!(p.next().unwrap(), expect);
        assert_eq!(p.next().unwrap(), Token::Eof);
        assert_eq!(p.next().unwrap(), Token::Eof);
    }
}

#[test]
fn fixnum() {
    let mut stream = vec![4, 8, b'i'];
    stream.extend(long_bytes(123));
    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::Fixnum(123));
    assert_eq!(p.int().unwrap(), 123);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn empty_array() {
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(0));
    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(0));
    assert_eq!(p.next().unwrap(), Token::EndArray);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn symbol_then_symlink_in_array() {
    // [:test, :test] encoded with the second occurrence as a symlink.
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(2));
    stream.push(b':');
    stream.extend(long_bytes(4));
    stream.extend_from_slice(b"test");
    stream.push(b';');
    stream.extend(long_bytes(0));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(2));
    let first = p.next().unwrap();
    assert!(matches!(first, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "test");
    let second = p.next().unwrap();
    assert!(matches!(second, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "test");
    assert_eq!(p.next().unwrap(), Token::EndArray);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn ivar_wrapped_string() {
    // "test".force_encoding stored as I" with one E=>true property.
    let mut stream = vec![4, 8, b'I', b'"'];
    stream.extend(long_bytes(4));
    stream.extend_from_slice(b"test");
    stream.extend(long_bytes(1));
    stream.push(b':');
    stream.extend(long_bytes(1));
    stream.push(b'E');
    stream.push(b'T');

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartIVar);
    let s = p.next().unwrap();
    assert!(matches!(s, Token::String(_)));
    assert_eq!(p.text().unwrap(), "test");
    assert_eq!(p.next().unwrap(), Token::IVarProps(1));
    assert_eq!(p.len(), 1);
    let key = p.next().unwrap();
    assert!(matches!(key, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "E");
    assert_eq!(p.next().unwrap(), Token::True);
    assert_eq!(p.next().unwrap(), Token::EndIVar);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn link_to_shared_float() {
    // [1.2, @0] style: an array holding one float followed by a link back to it.
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(2));
    stream.push(b'f');
    stream.extend(long_bytes(3));
    stream.extend_from_slice(b"1.2");
    stream.push(b'@');
    stream.extend(long_bytes(1)); // link id 1: the array itself was link id 0, float is id 1

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(2));
    assert_eq!(p.link_id(), 0);
    let f = p.next().unwrap();
    assert!(matches!(f, Token::Float(_)));
    assert_eq!(p.link_id(), 1);
    assert!((p.float().unwrap() - 1.2).abs() < 1e-9);
    let link = p.next().unwrap();
    assert_eq!(link, Token::Link(1));
    assert_eq!(p.link_id(), 1);
    assert_eq!(p.next().unwrap(), Token::EndArray);
}

#[test]
fn bignum_roundtrip_value() {
    // 0xDEADCAFEBEEF as a positive bignum: 6 bytes -> 3 half-count.
    let magnitude: [u8; 6] = [0xEF, 0xBE, 0xFE, 0xCA, 0xAD, 0xDE];
    let mut stream = vec![4, 8, b'l', b'+'];
    stream.extend(long_bytes(3));
    stream.extend_from_slice(&magnitude);

    let mut p = parser_for(stream);
    let tok = p.next().unwrap();
    assert!(matches!(tok, Token::Bignum { positive: true, .. }));
    assert_eq!(p.bignum().unwrap().to_str_radix(16), "deadcafebeef");
}

#[test]
fn object_with_fields() {
    // An object of class :Point with one ivar @x => 5.
    let mut stream = vec![4, 8, b'o'];
    stream.push(b':');
    stream.extend(long_bytes(5));
    stream.extend_from_slice(b"Point");
    stream.extend(long_bytes(1));
    stream.push(b':');
    stream.extend(long_bytes(2));
    stream.extend_from_slice(b"@x");
    stream.push(b'i');
    stream.extend(long_bytes(5));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartObject(1));
    let class = p.next().unwrap();
    assert!(matches!(class, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "Point");
    let key = p.next().unwrap();
    assert!(matches!(key, Token::Symbol(_)));
    assert_eq!(p.text().unwrap(), "@x");
    assert_eq!(p.next().unwrap(), Token::Fixnum(5));
    assert_eq!(p.next().unwrap(), Token::EndObject);
    assert_eq!(p.next().unwrap(), Token::Eof);
}

#[test]
fn replay_of_a_shared_string() {
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(2));
    stream.push(b'"');
    stream.extend(long_bytes(5));
    stream.extend_from_slice(b"hello");
    stream.push(b'@');
    stream.extend(long_bytes(1));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(2));
    let s = p.next().unwrap();
    assert!(matches!(s, Token::String(_)));
    assert_eq!(p.text().unwrap(), "hello");
    assert_eq!(p.next().unwrap(), Token::Link(1));

    let mut replay = p.replay(1).unwrap();
    let replayed = replay.next().unwrap();
    assert!(matches!(replayed, Token::String(_)));
    assert_eq!(replay.text().unwrap(), "hello");
    assert_eq!(replay.next().unwrap(), Token::Eof);
}

#[test]
fn replay_unfinished_is_rejected() {
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(1));
    stream.push(b'"');
    stream.extend(long_bytes(5));
    stream.extend_from_slice(b"hello");

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(1));
    // The array (link id 0) has not finished yet; replaying it must fail.
    assert!(p.replay(0).is_err());
}

#[test]
fn replay_reports_nested_link_ids() {
    // [1.2, @1]: the array itself is link id 0, the float nested inside it is link id 1.
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(2));
    stream.push(b'f');
    stream.extend(long_bytes(3));
    stream.extend_from_slice(b"1.2");
    stream.push(b'@');
    stream.extend(long_bytes(1));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(2));
    p.next().unwrap();
    p.next().unwrap();
    p.next().unwrap();

    // Replaying the whole array must still report the original link id of the nested float
    // opener, not -1, even though it's a second (non-top-level) linkable inside the subtree.
    let mut replay = p.replay(0).unwrap();
    let opener = replay.next().unwrap();
    assert_eq!(opener, Token::StartArray(2));
    assert_eq!(replay.link_id(), 0);
    let nested = replay.next().unwrap();
    assert!(matches!(nested, Token::Float(_)));
    assert_eq!(replay.link_id(), 1);
    assert_eq!(replay.next().unwrap(), Token::Link(1));
    assert_eq!(replay.link_id(), 1);
    assert_eq!(replay.next().unwrap(), Token::EndArray);
    assert_eq!(replay.next().unwrap(), Token::Eof);
}

#[test]
fn replay_rejects_recursive_replay() {
    // A self-referential array: `a = []; a << a`.
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(1));
    stream.push(b'@');
    stream.extend(long_bytes(0));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(1));
    assert_eq!(p.next().unwrap(), Token::Link(0));
    assert_eq!(p.next().unwrap(), Token::EndArray);

    let mut replay = p.replay(0).unwrap();
    assert_eq!(replay.next().unwrap(), Token::StartArray(1));
    let err = replay.replay(0).unwrap_err();
    assert_eq!(err.kind(), Some(marshal_core::ErrorKind::ReplayRecursive));
}

#[test]
fn skip_nested_array() {
    let mut stream = vec![4, 8, b'['];
    stream.extend(long_bytes(2));
    stream.push(b'[');
    stream.extend(long_bytes(2));
    stream.push(b'i');
    stream.extend(long_bytes(1));
    stream.push(b'i');
    stream.extend(long_bytes(2));
    stream.push(b'i');
    stream.extend(long_bytes(3));

    let mut p = parser_for(stream);
    assert_eq!(p.next().unwrap(), Token::StartArray(2));
    let inner = p.next().unwrap();
    assert_eq!(inner, Token::StartArray(2));
    p.skip().unwrap();
    assert_eq!(p.next().unwrap(), Token::Fixnum(3));
    assert_eq!(p.next().unwrap(), Token::EndArray);
}

#[test]
fn bad_magic_is_rejected() {
    let stream = vec![3, 8, b'0'];
    assert!(Parser::new(Cursor::new(stream)).is_err());
}

#[test]
fn unknown_type_byte_is_malformed() {
    let stream = vec![4, 8, b'?'];
    let mut p = parser_for(stream);
    assert!(p.next().is_err());
}
