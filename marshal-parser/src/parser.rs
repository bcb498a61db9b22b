// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The pull-based Marshal parser.

use std::cell::{Ref, RefCell};
use std::io::Read;
use std::rc::Rc;

use log::trace;
use num_bigint::{BigInt, BigUint, Sign};

use marshal_core::errors::{
    malformed_stream_error, replay_recursive_error, replay_unfinished_error,
    replay_unknown_id_error, wrong_token_error,
};
use marshal_core::format::{self, RegexpFlags};
use marshal_core::io::ReadBytes;
use marshal_core::longcodec::decode_long;
use marshal_core::range::Range;
use marshal_core::{Result, Token};

use crate::buffer::StreamBuffer;
use crate::context::{Context, IVarPhase, KeyedKind};
use crate::options::ParserOptions;
use crate::tables::{LinkTable, SymbolTable};

/// Sentinel `current_link_id` value meaning "the current token did not open a link table
/// entry."
const NO_LINK: i64 = -1;

/// Adapts the shared read buffer to [`ReadBytes`] so [`decode_long`] can be reused verbatim.
struct BufCursor<R> {
    buffer: Rc<RefCell<StreamBuffer<R>>>,
    pos: u64,
}

impl<R: Read> ReadBytes for BufCursor<R> {
    fn read_byte(&mut self) -> Result<u8> {
        self.buffer.borrow_mut().require(self.pos + 1)?;
        let b = self.buffer.borrow().byte_at(self.pos);
        self.pos += 1;
        Ok(b)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<()> {
        let need = self.pos + buf.len() as u64;
        self.buffer.borrow_mut().require(need)?;
        buf.copy_from_slice(self.buffer.borrow().slice(Range::new(self.pos, need)));
        self.pos = need;
        Ok(())
    }

    fn pos(&self) -> u64 {
        self.pos
    }
}

/// A pull-based reader over a Marshal 4.8 byte stream.
///
/// `next()` advances one token at a time; typed accessors (`int()`, `float()`, `bignum()`,
/// `bytes()`/`text()`, `len()`, `link_id()`) expose the current token's payload. See the crate
/// documentation for the full contract.
pub struct Parser<R> {
    buffer: Rc<RefCell<StreamBuffer<R>>>,
    symtab: Rc<RefCell<SymbolTable>>,
    linktab: Rc<RefCell<LinkTable>>,
    stack: Vec<Context>,
    pos: u64,
    read_top: bool,
    is_replay: bool,
    replay_ancestors: Vec<u64>,
    current: Token,
    current_link_id: i64,
}

impl<R: Read> Parser<R> {
    pub fn new(source: R) -> Result<Self> {
        Self::with_options(source, ParserOptions::default())
    }

    pub fn with_options(source: R, options: ParserOptions) -> Result<Self> {
        let buffer = StreamBuffer::new(source, options.initial_buffer_capacity);
        let mut parser = Parser {
            buffer: Rc::new(RefCell::new(buffer)),
            symtab: Rc::new(RefCell::new(SymbolTable::default())),
            linktab: Rc::new(RefCell::new(LinkTable::default())),
            stack: Vec::new(),
            pos: 0,
            read_top: false,
            is_replay: false,
            replay_ancestors: Vec::new(),
            current: Token::Eof,
            current_link_id: NO_LINK,
        };
        parser.read_magic()?;
        Ok(parser)
    }

    /// Reinitializes logical state (position, stack, tables) and swaps in a new source.
    pub fn reset(&mut self, source: R) -> Result<()> {
        trace!("parser reset");
        self.buffer.borrow_mut().reset(source);
        self.symtab.borrow_mut().clear();
        self.linktab.borrow_mut().clear();
        self.stack.clear();
        self.pos = 0;
        self.read_top = false;
        self.current = Token::Eof;
        self.current_link_id = NO_LINK;
        self.read_magic()
    }

    fn read_magic(&mut self) -> Result<()> {
        let major = self.read_u8()?;
        let minor = self.read_u8()?;
        if major != format::MAGIC_MAJOR || minor != format::MAGIC_MINOR {
            return malformed_stream_error(0, format!("bad magic byte pair {major}.{minor}"));
        }
        Ok(())
    }

    /// Advances to the next token. Sticky `Eof` once the single top-level value is consumed.
    pub fn next(&mut self) -> Result<Token> {
        if self.stack.is_empty() && self.read_top {
            self.current = Token::Eof;
            self.current_link_id = NO_LINK;
            return Ok(Token::Eof);
        }

        if let Some(closer) = self.try_close_top()? {
            self.current = closer;
            self.current_link_id = NO_LINK;
            return Ok(closer);
        }

        if let Some(Context::Keyed { pending_class: Some(range), .. }) = self.stack.last().copied() {
            if let Some(Context::Keyed { pending_class, .. }) = self.stack.last_mut() {
                *pending_class = None;
            }
            let tok = Token::Symbol(range);
            self.current = tok;
            self.current_link_id = NO_LINK;
            return Ok(tok);
        }

        if matches!(self.stack.last(), Some(Context::IVar { phase: IVarPhase::WrappedValueDone, .. })) {
            let k = self.read_long()?;
            if k < 0 {
                return malformed_stream_error(self.pos, "negative ivar property count");
            }
            let k = k as u64;
            if let Some(Context::IVar { phase, pairs, position, .. }) = self.stack.last_mut() {
                *phase = IVarPhase::Pairs;
                *pairs = k;
                *position = 0;
            }
            let tok = Token::IVarProps(k);
            self.current = tok;
            self.current_link_id = NO_LINK;
            return Ok(tok);
        }

        let requires_symbol_key = self.current_position_requires_symbol_key();
        let requires_class_symbol = self.current_requires_class_symbol();

        let tok = self.read_value()?;

        if requires_class_symbol && !matches!(tok, Token::Symbol(_)) {
            return malformed_stream_error(self.pos, "expected symbol class name");
        }
        if requires_symbol_key && !matches!(tok, Token::Symbol(_)) {
            return malformed_stream_error(self.pos, "expected symbol in key position");
        }

        if !tok.is_composite_open() {
            self.after_value(tok)?;
        }
        self.current = tok;
        Ok(tok)
    }

    fn current_requires_class_symbol(&self) -> bool {
        matches!(self.stack.last(), Some(Context::UsrMarshal { has_class: false, .. }))
    }

    fn current_position_requires_symbol_key(&self) -> bool {
        match self.stack.last() {
            Some(Context::Keyed { pending_class: None, position, .. }) => position % 2 == 0,
            Some(Context::IVar { phase: IVarPhase::Pairs, position, .. }) => position % 2 == 0,
            _ => false,
        }
    }

    fn after_value(&mut self, _tok: Token) -> Result<()> {
        match self.stack.last_mut() {
            None => self.read_top = true,
            Some(Context::Array { position, .. }) => *position += 1,
            Some(Context::Hash { position, .. }) => *position += 1,
            Some(Context::Keyed { position, .. }) => *position += 1,
            Some(Context::UsrMarshal { has_class, has_value, .. }) => {
                if !*has_class {
                    *has_class = true;
                } else {
                    *has_value = true;
                }
            }
            Some(Context::IVar { phase, position, .. }) => match phase {
                IVarPhase::WrappedValue => *phase = IVarPhase::WrappedValueDone,
                IVarPhase::Pairs => *position += 1,
                IVarPhase::WrappedValueDone => unreachable!("no value is read in this phase"),
            },
        }
        Ok(())
    }

    fn try_close_top(&mut self) -> Result<Option<Token>> {
        let should_close = match self.stack.last() {
            Some(Context::Array { size, position, .. }) => position == size,
            Some(Context::Hash { size, position, .. }) => position == size,
            Some(Context::Keyed { pending_class: None, pairs, position, .. }) => *position == pairs * 2,
            Some(Context::IVar { phase: IVarPhase::Pairs, pairs, position, .. }) => *position == pairs * 2,
            Some(Context::UsrMarshal { has_class, has_value, .. }) => *has_class && *has_value,
            _ => false,
        };
        if !should_close {
            return Ok(None);
        }
        let frame = self.stack.pop().expect("should_close implies a frame exists");
        let end = self.pos;
        let closer = match frame {
            Context::Array { link_id, .. } => {
                self.finish_link(link_id, end);
                Token::EndArray
            }
            Context::Hash { link_id, .. } => {
                self.finish_link(link_id, end);
                Token::EndHash
            }
            Context::Keyed { kind, link_id, .. } => {
                self.finish_link(link_id, end);
                match kind {
                    KeyedKind::Object => Token::EndObject,
                    KeyedKind::Struct => Token::EndStruct,
                }
            }
            Context::IVar { link_id, .. } => {
                self.finish_link(link_id, end);
                Token::EndIVar
            }
            Context::UsrMarshal { link_id, .. } => {
                self.finish_link(link_id, end);
                Token::EndUsrMarshal
            }
        };
        self.after_value(closer)?;
        Ok(Some(closer))
    }

    /// Reads one value from the wire: a leaf scalar, or the opener of a new composite frame.
    fn read_value(&mut self) -> Result<Token> {
        let begin = self.pos;
        let type_byte = self.read_u8()?;

        let tok = match type_byte {
            format::TYPE_NIL => Token::Nil,
            format::TYPE_TRUE => Token::True,
            format::TYPE_FALSE => Token::False,
            format::TYPE_FIXNUM => {
                let n = self.read_long()?;
                // `decode_long` never yields more than 4 bytes of magnitude, so this always fits.
                Token::Fixnum(n as i32)
            }
            format::TYPE_BIGNUM => {
                let sign_byte = self.read_u8()?;
                let positive = match sign_byte {
                    b'+' => true,
                    b'-' => false,
                    _ => return malformed_stream_error(self.pos, "invalid bignum sign byte"),
                };
                let half_count = self.read_long()?;
                if half_count < 0 {
                    return malformed_stream_error(self.pos, "negative bignum half-count");
                }
                let magnitude = self.take_range(half_count as u64 * 2)?;
                let link_id = self.open_link(begin);
                self.finish_link(link_id, self.pos);
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::Bignum { positive, magnitude });
            }
            format::TYPE_FLOAT => {
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative float length");
                }
                let range = self.take_range(len as u64)?;
                let link_id = self.open_link(begin);
                self.finish_link(link_id, self.pos);
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::Float(range));
            }
            format::TYPE_SYMBOL => {
                let range = self.read_symbol_body(false)?;
                Token::Symbol(range)
            }
            format::TYPE_SYMLINK => {
                let range = self.read_symbol_body(true)?;
                Token::Symbol(range)
            }
            format::TYPE_STRING => {
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative string length");
                }
                let range = self.take_range(len as u64)?;
                let link_id = self.open_link(begin);
                self.finish_link(link_id, self.pos);
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::String(range));
            }
            format::TYPE_REGEXP => {
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative regexp length");
                }
                let expr = self.take_range(len as u64)?;
                let flag_byte = self.read_u8()?;
                let flags = RegexpFlags::from_bits_truncate(flag_byte);
                let link_id = self.open_link(begin);
                self.finish_link(link_id, self.pos);
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::Regexp { expr, flags });
            }
            format::TYPE_ARRAY => {
                let n = self.read_long()?;
                if n < 0 {
                    return malformed_stream_error(self.pos, "negative array length");
                }
                let link_id = self.open_link(begin);
                self.stack.push(Context::Array { size: n as u64, position: 0, link_id });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartArray(n as u64));
            }
            format::TYPE_HASH => {
                let n = self.read_long()?;
                if n < 0 {
                    return malformed_stream_error(self.pos, "negative hash length");
                }
                let link_id = self.open_link(begin);
                self.stack.push(Context::Hash { size: n as u64 * 2, position: 0, link_id });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartHash(n as u64));
            }
            format::TYPE_IVAR => {
                let link_id = self.open_link(begin);
                self.stack.push(Context::IVar {
                    phase: IVarPhase::WrappedValue,
                    pairs: 0,
                    position: 0,
                    link_id,
                });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartIVar);
            }
            format::TYPE_CLASS => {
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative class name length");
                }
                let range = self.take_range(len as u64)?;
                Token::Class(range)
            }
            format::TYPE_MODULE => {
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative module name length");
                }
                let range = self.take_range(len as u64)?;
                Token::Module(range)
            }
            format::TYPE_OBJECT => {
                let class = self.read_symbol_value()?;
                let nvars = self.read_long()?;
                if nvars < 0 {
                    return malformed_stream_error(self.pos, "negative object field count");
                }
                let link_id = self.open_link(begin);
                self.stack.push(Context::Keyed {
                    kind: KeyedKind::Object,
                    pending_class: Some(class),
                    pairs: nvars as u64,
                    position: 0,
                    link_id,
                });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartObject(nvars as u64));
            }
            format::TYPE_STRUCT => {
                let class = self.read_symbol_value()?;
                let nfields = self.read_long()?;
                if nfields < 0 {
                    return malformed_stream_error(self.pos, "negative struct field count");
                }
                let link_id = self.open_link(begin);
                self.stack.push(Context::Keyed {
                    kind: KeyedKind::Struct,
                    pending_class: Some(class),
                    pairs: nfields as u64,
                    position: 0,
                    link_id,
                });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartStruct(nfields as u64));
            }
            format::TYPE_USRMARSHAL => {
                let link_id = self.open_link(begin);
                self.stack.push(Context::UsrMarshal { has_class: false, has_value: false, link_id });
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::StartUsrMarshal);
            }
            format::TYPE_USRDEF => {
                let class = self.read_symbol_value()?;
                let len = self.read_long()?;
                if len < 0 {
                    return malformed_stream_error(self.pos, "negative user-defined data length");
                }
                let data = self.take_range(len as u64)?;
                let link_id = self.open_link(begin);
                self.finish_link(link_id, self.pos);
                self.current_link_id = self.as_visible_link_id(link_id);
                return Ok(Token::UsrDef { class, data });
            }
            format::TYPE_LINK => {
                let id = self.read_long()?;
                if id < 0 || id as u64 >= self.linktab.borrow().len() {
                    return malformed_stream_error(self.pos, format!("link id {id} out of range"));
                }
                Token::Link(id as u64)
            }
            other => {
                return malformed_stream_error(begin, format!("unknown type byte {other:#04x}"));
            }
        };

        self.current_link_id = NO_LINK;
        Ok(tok)
    }

    fn read_symbol_body(&mut self, is_symlink: bool) -> Result<Range> {
        if is_symlink {
            let id = self.read_long()?;
            if id < 0 {
                return malformed_stream_error(self.pos, "negative symlink id");
            }
            self.symtab
                .borrow()
                .get(id as u64)
                .ok_or(())
                .or_else(|_| malformed_stream_error(self.pos, format!("symlink id {id} out of range")))
        } else {
            let len = self.read_long()?;
            if len < 0 {
                return malformed_stream_error(self.pos, "negative symbol length");
            }
            let range = self.take_range(len as u64)?;
            if !self.is_replay {
                self.symtab.borrow_mut().push(range);
            }
            Ok(range)
        }
    }

    /// Reads a symbol-or-symlink ahead of a composite opener that needs it before its own
    /// token can be emitted (`Object`/`Struct`'s class name, `UsrDef`'s class name).
    fn read_symbol_value(&mut self) -> Result<Range> {
        let b = self.read_u8()?;
        match b {
            format::TYPE_SYMBOL => self.read_symbol_body(false),
            format::TYPE_SYMLINK => self.read_symbol_body(true),
            _ => malformed_stream_error(self.pos, "expected symbol"),
        }
    }

    /// Reserves a new link-table entry, or during replay looks up the id the original parse
    /// already assigned to the linkable value opening at `begin` — replay never mutates the
    /// table, only the top-level parse does.
    fn open_link(&mut self, begin: u64) -> u64 {
        if self.is_replay {
            return self.linktab.borrow().find_by_begin(begin).unwrap_or(u64::MAX);
        }
        self.linktab.borrow_mut().open(begin)
    }

    fn finish_link(&mut self, id: u64, end: u64) {
        if !self.is_replay && id != u64::MAX {
            self.linktab.borrow_mut().finish(id, end);
        }
    }

    fn as_visible_link_id(&self, id: u64) -> i64 {
        if id == u64::MAX {
            NO_LINK
        } else {
            id as i64
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.buffer.borrow_mut().require(self.pos + 1)?;
        let b = self.buffer.borrow().byte_at(self.pos);
        self.pos += 1;
        Ok(b)
    }

    fn take_range(&mut self, len: u64) -> Result<Range> {
        let begin = self.pos;
        let end = begin + len;
        self.buffer.borrow_mut().require(end)?;
        self.pos = end;
        Ok(Range::new(begin, end))
    }

    fn read_long(&mut self) -> Result<i64> {
        let mut cursor = BufCursor { buffer: Rc::clone(&self.buffer), pos: self.pos };
        let value = decode_long(&mut cursor)?;
        self.pos = cursor.pos();
        Ok(value)
    }

    /// The current byte offset, for diagnostics and error reporting.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// The token last returned by [`Self::next`].
    pub fn current(&self) -> Token {
        self.current
    }

    /// `next()` must return a token for which `matcher` holds, or a `WrongToken` error.
    pub fn expect(&mut self, matcher: impl FnOnce(&Token) -> bool) -> Result<Token> {
        let tok = self.next()?;
        if matcher(&tok) {
            Ok(tok)
        } else {
            wrong_token_error(self.pos, format!("unexpected token {tok:?}"))
        }
    }

    fn current_range(&self) -> Result<Range> {
        match self.current {
            Token::Symbol(r) | Token::String(r) | Token::Float(r) | Token::Class(r) | Token::Module(r) => Ok(r),
            Token::Bignum { magnitude, .. } => Ok(magnitude),
            Token::Regexp { expr, .. } => Ok(expr),
            Token::UsrDef { data, .. } => Ok(data),
            _ => wrong_token_error(self.pos, "token has no byte range"),
        }
    }

    /// Zero-copy view of the current token's byte payload. Valid until the next [`Self::reset`].
    pub fn bytes(&self) -> Result<Ref<'_, [u8]>> {
        let range = self.current_range()?;
        Ok(Ref::map(self.buffer.borrow(), |buf| buf.slice(range)))
    }

    /// The current token's byte payload decoded as UTF-8 (lossily; Marshal strings are not
    /// guaranteed valid UTF-8).
    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.bytes()?).into_owned())
    }

    /// The current `Fixnum`'s value.
    pub fn int(&self) -> Result<i32> {
        match self.current {
            Token::Fixnum(v) => Ok(v),
            _ => wrong_token_error(self.pos, "current token is not a Fixnum"),
        }
    }

    /// The current `Float`'s value, parsed from its decimal text.
    pub fn float(&self) -> Result<f64> {
        match self.current {
            Token::Float(_) => self
                .text()?
                .parse()
                .map_err(|_| ())
                .or_else(|_: ()| wrong_token_error(self.pos, "malformed float text")),
            _ => wrong_token_error(self.pos, "current token is not a Float"),
        }
    }

    /// The current `Bignum`'s value.
    pub fn bignum(&self) -> Result<BigInt> {
        match self.current {
            Token::Bignum { positive, .. } => {
                let magnitude = BigUint::from_bytes_le(&self.bytes()?);
                let sign = if positive { Sign::Plus } else { Sign::Minus };
                Ok(BigInt::from_biguint(sign, magnitude))
            }
            _ => wrong_token_error(self.pos, "current token is not a Bignum"),
        }
    }

    /// The declared element count of the current composite opener, or `-1`.
    pub fn len(&self) -> i64 {
        match self.current {
            Token::StartArray(n)
            | Token::StartHash(n)
            | Token::IVarProps(n)
            | Token::StartObject(n)
            | Token::StartStruct(n) => n as i64,
            _ => -1,
        }
    }

    /// The link-table id of the current token: the target id for `Link`, the id just reserved
    /// for a linkable opener, or `-1`.
    pub fn link_id(&self) -> i64 {
        if let Token::Link(id) = self.current {
            return id as i64;
        }
        self.current_link_id
    }

    /// Consumes the rest of the subtree rooted at the current token without materializing
    /// scalars; a no-op if the current token is a leaf.
    pub fn skip(&mut self) -> Result<()> {
        if !self.current.is_composite_open() {
            return Ok(());
        }
        let target_depth = self.stack.len();
        while self.stack.len() >= target_depth {
            self.next()?;
        }
        Ok(())
    }

    /// Returns a sub-parser that re-emits the token sequence of a previously parsed linkable
    /// value, reading from the shared buffer rather than the original source.
    pub fn replay(&mut self, link_id: u64) -> Result<Parser<R>> {
        let range = self
            .linktab
            .borrow()
            .get(link_id)
            .ok_or(())
            .or_else(|_| replay_unknown_id_error(self.pos, link_id))?;
        if range.is_open() {
            return replay_unfinished_error(self.pos, link_id);
        }
        if self.replay_ancestors.contains(&link_id) {
            return replay_recursive_error(self.pos, link_id);
        }
        trace!("replay link_id={link_id} range={range:?}");

        let mut ancestors = self.replay_ancestors.clone();
        ancestors.push(link_id);

        Ok(Parser {
            buffer: Rc::clone(&self.buffer),
            symtab: Rc::clone(&self.symtab),
            linktab: Rc::clone(&self.linktab),
            stack: Vec::new(),
            pos: range.begin,
            read_top: false,
            is_replay: true,
            replay_ancestors: ancestors,
            current: Token::Eof,
            current_link_id: NO_LINK,
        })
    }
}
