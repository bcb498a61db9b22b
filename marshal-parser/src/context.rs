// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The parser's context stack: one frame per value nested inside a composite.

use marshal_core::range::Range;

/// Which phase of an `IVar` frame the parser is in: the single wrapped value, then its
/// symbol/value property pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IVarPhase {
    WrappedValue,
    /// The wrapped value has been read; the next `next()` call reads the property count long
    /// and transitions to `Pairs`.
    WrappedValueDone,
    Pairs,
}

/// `Object` and `Struct` share the same "class symbol already consumed, now read N symbol/value
/// pairs" shape; `which` is only used to pick the matching closer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedKind {
    Object,
    Struct,
}

/// One frame of parser nesting state. `link_id` is the link-table id reserved when the
/// composite was opened, finalized via [`crate::tables::LinkTable::finish`] when it closes.
#[derive(Debug, Clone, Copy)]
pub enum Context {
    Array { size: u64, position: u64, link_id: u64 },
    /// `size` is already doubled (key + value per declared element).
    Hash { size: u64, position: u64, link_id: u64 },
    IVar { phase: IVarPhase, pairs: u64, position: u64, link_id: u64 },
    /// `Object`/`Struct` read their class symbol and count eagerly (the wire orders them
    /// class-symbol-then-count, but the opener token needs the count up front); `pending_class`
    /// is emitted as a standalone `Symbol` token on the very next step, before pair counting
    /// begins.
    Keyed { kind: KeyedKind, pending_class: Option<Range>, pairs: u64, position: u64, link_id: u64 },
    /// Expects the class symbol, then exactly one wrapped value.
    UsrMarshal { has_class: bool, has_value: bool, link_id: u64 },
}
