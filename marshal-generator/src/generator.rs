// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The push-based Marshal generator.

use std::io::Write;

use log::trace;
use num_bigint::{BigInt, Sign};

use marshal_core::errors::{
    generator_finished_error, generator_overflow_error, non_symbol_key_error, unbalanced_close_error,
};
use marshal_core::format::{self, RegexpFlags, FIXNUM_MAX, FIXNUM_MIN};
use marshal_core::io::WriteBytes;
use marshal_core::longcodec::encode_long;
use marshal_core::Result;

use crate::context::{Frame, IVarPhase, KeyedKind};
use crate::options::GeneratorOptions;
use crate::symtab::SymbolTable;

/// A push-based writer of a single Marshal 4.8 top-level value.
///
/// Each public method writes one token and checks it against the currently open frame; see the
/// crate documentation for the full structural-invariant contract.
pub struct Generator<W> {
    sink: W,
    buf: Vec<u8>,
    flush_threshold: usize,
    symtab: SymbolTable,
    stack: Vec<Frame>,
    top_written: bool,
    pos: u64,
}

impl<W: Write> WriteBytes for Generator<W> {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.buf.push(byte);
        self.pos += 1;
        if self.buf.len() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(buf);
        self.pos += buf.len() as u64;
        if self.buf.len() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    fn pos(&self) -> u64 {
        self.pos
    }
}

impl<W: Write> Generator<W> {
    pub fn new(sink: W) -> Result<Self> {
        Self::with_options(sink, GeneratorOptions::default())
    }

    pub fn with_options(sink: W, options: GeneratorOptions) -> Result<Self> {
        let mut gen = Generator {
            sink,
            buf: Vec::with_capacity(options.flush_threshold),
            flush_threshold: options.flush_threshold,
            symtab: SymbolTable::default(),
            stack: Vec::new(),
            top_written: false,
            pos: 0,
        };
        gen.write_magic()?;
        Ok(gen)
    }

    /// Flushes any buffered bytes, clears logical state (frame stack, symbol table), and writes
    /// a fresh magic prefix to `sink` for reuse.
    pub fn reset(&mut self, sink: W) -> Result<()> {
        trace!("generator reset");
        self.flush()?;
        self.sink = sink;
        self.symtab.clear();
        self.stack.clear();
        self.top_written = false;
        self.pos = 0;
        self.write_magic()
    }

    fn write_magic(&mut self) -> Result<()> {
        self.write_byte(format::MAGIC_MAJOR)?;
        self.write_byte(format::MAGIC_MINOR)
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }

    /// The number of bytes written (buffered or flushed) so far, for diagnostics.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Flushes any remaining buffered bytes and returns the underlying sink, consuming the
    /// generator.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    fn write_long(&mut self, n: i64) -> Result<()> {
        let mut tmp = Vec::with_capacity(5);
        encode_long(n, &mut tmp)?;
        self.write_buf(&tmp)
    }

    fn write_symbol_body(&mut self, name: &[u8]) -> Result<()> {
        if let Some(id) = self.symtab.intern(name) {
            trace!("symbol symlinked id={id}");
            self.write_byte(format::TYPE_SYMLINK)?;
            self.write_long(id as i64)
        } else {
            trace!("symbol interned len={}", name.len());
            self.write_byte(format::TYPE_SYMBOL)?;
            self.write_long(name.len() as i64)?;
            self.write_buf(name)
        }
    }

    fn write_bignum_body(&mut self, n: &BigInt) -> Result<()> {
        self.write_byte(format::TYPE_BIGNUM)?;
        let (sign, mut magnitude) = n.to_bytes_le();
        let positive = sign != Sign::Minus;
        self.write_byte(if positive { b'+' } else { b'-' })?;
        if magnitude.len() % 2 != 0 {
            magnitude.push(0);
        }
        self.write_long(magnitude.len() as i64 / 2)?;
        self.write_buf(&magnitude)
    }

    /// Checks the structural invariants a write at the current position must satisfy:
    /// completion, bounds, and (inside `IVar`/`Object`/`Struct`) the symbol-keyed-position rule.
    fn before_write(&self, is_symbol: bool) -> Result<()> {
        if self.stack.is_empty() && self.top_written {
            return generator_finished_error(self.pos);
        }
        match self.stack.last() {
            None => Ok(()),
            Some(Frame::Array { size, position }) => {
                if position >= size {
                    return generator_overflow_error(self.pos, *size);
                }
                Ok(())
            }
            Some(Frame::Hash { size, position }) => {
                if position >= size {
                    return generator_overflow_error(self.pos, *size);
                }
                Ok(())
            }
            Some(Frame::IVar { phase: IVarPhase::WrappedValue, .. }) => Ok(()),
            Some(Frame::IVar { phase: IVarPhase::Pairs, nvars, position }) => {
                let bound = nvars * 2;
                if *position >= bound {
                    return generator_overflow_error(self.pos, bound);
                }
                if position % 2 == 0 && !is_symbol {
                    return non_symbol_key_error(self.pos);
                }
                Ok(())
            }
            Some(Frame::Keyed { pairs, position, .. }) => {
                let bound = pairs * 2;
                if *position >= bound {
                    return generator_overflow_error(self.pos, bound);
                }
                if position % 2 == 0 && !is_symbol {
                    return non_symbol_key_error(self.pos);
                }
                Ok(())
            }
            Some(Frame::UsrMarshal { has_value: true }) => generator_overflow_error(self.pos, 1),
            Some(Frame::UsrMarshal { has_value: false }) => Ok(()),
        }
    }

    /// Propagates completion of a just-written value (scalar or just-closed composite) to the
    /// new top frame: advances its position, flips a one-shot flag, or — uniquely for `IVar`'s
    /// wrapped value — writes the property-count long and switches into the `Pairs` phase.
    fn advance_parent(&mut self) -> Result<()> {
        if let Some(Frame::IVar { phase: IVarPhase::WrappedValue, nvars, .. }) = self.stack.last() {
            let nvars = *nvars;
            self.write_long(nvars as i64)?;
            if let Some(Frame::IVar { phase, position, .. }) = self.stack.last_mut() {
                *phase = IVarPhase::Pairs;
                *position = 0;
            }
            return Ok(());
        }

        match self.stack.last_mut() {
            None => {
                self.top_written = true;
                self.flush()?;
            }
            Some(Frame::Array { position, .. }) => *position += 1,
            Some(Frame::Hash { position, .. }) => *position += 1,
            Some(Frame::Keyed { position, .. }) => *position += 1,
            Some(Frame::IVar { position, .. }) => *position += 1,
            Some(Frame::UsrMarshal { has_value }) => *has_value = true,
        }
        Ok(())
    }

    fn end_keyed(&mut self, expected_kind: KeyedKind, name: &str) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Keyed { kind, pairs, position }) if *kind == expected_kind && *position == pairs * 2 => {}
            Some(Frame::Keyed { kind, pairs, position }) if *kind == expected_kind => {
                return unbalanced_close_error(
                    self.pos,
                    format!("{name} at {position} of {} declared", pairs * 2),
                );
            }
            _ => return unbalanced_close_error(self.pos, format!("{name} called without a matching open frame")),
        }
        self.stack.pop();
        Ok(())
    }

    pub fn nil(&mut self) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_NIL)?;
        self.advance_parent()
    }

    pub fn bool(&mut self, value: bool) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(if value { format::TYPE_TRUE } else { format::TYPE_FALSE })?;
        self.advance_parent()
    }

    /// Writes `n` as a Fixnum, transparently promoting to Bignum if it falls outside
    /// `[-0x3FFFFFFF, 0x3FFFFFFF]`.
    pub fn fixnum(&mut self, n: i64) -> Result<()> {
        self.before_write(false)?;
        if (FIXNUM_MIN..=FIXNUM_MAX).contains(&n) {
            self.write_byte(format::TYPE_FIXNUM)?;
            self.write_long(n)?;
        } else {
            self.write_bignum_body(&BigInt::from(n))?;
        }
        self.advance_parent()
    }

    pub fn bignum(&mut self, n: &BigInt) -> Result<()> {
        self.before_write(false)?;
        self.write_bignum_body(n)?;
        self.advance_parent()
    }

    /// Writes `f` as a length-prefixed decimal text run. `NaN`/infinities are written as Ruby's
    /// `Float#to_s` spells them (`"nan"`, `"inf"`, `"-inf"`).
    pub fn float(&mut self, f: f64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_FLOAT)?;
        let text = if f.is_nan() {
            "nan".to_string()
        } else if f.is_infinite() {
            if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
        } else {
            format!("{f}")
        };
        self.write_long(text.len() as i64)?;
        self.write_buf(text.as_bytes())?;
        self.advance_parent()
    }

    /// Writes `name` as a Symbol, substituting a symlink if it was already written this stream.
    pub fn symbol(&mut self, name: &[u8]) -> Result<()> {
        self.before_write(true)?;
        self.write_symbol_body(name)?;
        self.advance_parent()
    }

    pub fn string(&mut self, bytes: &[u8]) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_STRING)?;
        self.write_long(bytes.len() as i64)?;
        self.write_buf(bytes)?;
        self.advance_parent()
    }

    pub fn class(&mut self, name: &[u8]) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_CLASS)?;
        self.write_long(name.len() as i64)?;
        self.write_buf(name)?;
        self.advance_parent()
    }

    pub fn module(&mut self, name: &[u8]) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_MODULE)?;
        self.write_long(name.len() as i64)?;
        self.write_buf(name)?;
        self.advance_parent()
    }

    pub fn regexp(&mut self, expr: &[u8], flags: RegexpFlags) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_REGEXP)?;
        self.write_long(expr.len() as i64)?;
        self.write_buf(expr)?;
        self.write_byte(flags.bits())?;
        self.advance_parent()
    }

    /// Writes a `user_defined` (`_dump`/`_load`) leaf: a class name plus an opaque byte blob.
    pub fn user_defined(&mut self, class: &[u8], data: &[u8]) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_USRDEF)?;
        self.write_symbol_body(class)?;
        self.write_long(data.len() as i64)?;
        self.write_buf(data)?;
        self.advance_parent()
    }

    pub fn start_array(&mut self, n: u64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_ARRAY)?;
        self.write_long(n as i64)?;
        self.stack.push(Frame::Array { size: n, position: 0 });
        Ok(())
    }

    pub fn end_array(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Array { size, position }) if position == size => {}
            Some(Frame::Array { size, position }) => {
                return unbalanced_close_error(self.pos, format!("end_array at {position} of {size}"));
            }
            _ => return unbalanced_close_error(self.pos, "end_array called without an open array"),
        }
        self.stack.pop();
        self.advance_parent()
    }

    /// `n` declared elements, each a key/value pair (the stream's own count doubles it).
    pub fn start_hash(&mut self, n: u64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_HASH)?;
        self.write_long(n as i64)?;
        self.stack.push(Frame::Hash { size: n * 2, position: 0 });
        Ok(())
    }

    pub fn end_hash(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::Hash { size, position }) if position == size => {}
            Some(Frame::Hash { size, position }) => {
                return unbalanced_close_error(self.pos, format!("end_hash at {position} of {size}"));
            }
            _ => return unbalanced_close_error(self.pos, "end_hash called without an open hash"),
        }
        self.stack.pop();
        self.advance_parent()
    }

    /// Opens an `IVar` frame expecting exactly one wrapped value followed by `nvars` symbol/value
    /// pairs. The property count is written to the stream only after the wrapped value, matching
    /// the wire's own ordering.
    pub fn start_ivar(&mut self, nvars: u64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_IVAR)?;
        self.stack.push(Frame::IVar { nvars, phase: IVarPhase::WrappedValue, position: 0 });
        Ok(())
    }

    pub fn end_ivar(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::IVar { phase: IVarPhase::Pairs, nvars, position }) if *position == nvars * 2 => {}
            Some(Frame::IVar { phase: IVarPhase::WrappedValue, .. }) => {
                return unbalanced_close_error(self.pos, "end_ivar before its wrapped value was written");
            }
            Some(Frame::IVar { nvars, position, .. }) => {
                return unbalanced_close_error(
                    self.pos,
                    format!("end_ivar at {position} of {}", nvars * 2),
                );
            }
            _ => return unbalanced_close_error(self.pos, "end_ivar called without an open ivar"),
        }
        self.stack.pop();
        self.advance_parent()
    }

    /// Writes the class symbol and declared field count immediately, then opens a frame
    /// expecting `nvars` further symbol/value pairs.
    pub fn start_object(&mut self, class: &[u8], nvars: u64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_OBJECT)?;
        self.write_symbol_body(class)?;
        self.write_long(nvars as i64)?;
        self.stack.push(Frame::Keyed { kind: KeyedKind::Object, pairs: nvars, position: 0 });
        Ok(())
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.end_keyed(KeyedKind::Object, "end_object")?;
        self.advance_parent()
    }

    pub fn start_struct(&mut self, class: &[u8], nfields: u64) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_STRUCT)?;
        self.write_symbol_body(class)?;
        self.write_long(nfields as i64)?;
        self.stack.push(Frame::Keyed { kind: KeyedKind::Struct, pairs: nfields, position: 0 });
        Ok(())
    }

    pub fn end_struct(&mut self) -> Result<()> {
        self.end_keyed(KeyedKind::Struct, "end_struct")?;
        self.advance_parent()
    }

    /// Writes the class symbol immediately, then opens a frame expecting exactly one value.
    pub fn start_user_marshalled(&mut self, class: &[u8]) -> Result<()> {
        self.before_write(false)?;
        self.write_byte(format::TYPE_USRMARSHAL)?;
        self.write_symbol_body(class)?;
        self.stack.push(Frame::UsrMarshal { has_value: false });
        Ok(())
    }

    pub fn end_user_marshalled(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(Frame::UsrMarshal { has_value: true }) => {}
            Some(Frame::UsrMarshal { has_value: false }) => {
                return unbalanced_close_error(self.pos, "end_user_marshalled before its value was written");
            }
            _ => return unbalanced_close_error(self.pos, "end_user_marshalled called without an open frame"),
        }
        self.stack.pop();
        self.advance_parent()
    }
}
