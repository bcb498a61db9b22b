// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The generator's frame stack: one entry per composite currently open for writing.

/// Which phase of an `IVar` frame the generator is in: the single wrapped value, then (once the
/// property count has been written) its symbol/value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IVarPhase {
    WrappedValue,
    Pairs,
}

/// `Object` and `Struct` share the same "class symbol already emitted at `start_*`, now write N
/// symbol/value pairs" shape; `which` only picks the matching `end_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedKind {
    Object,
    Struct,
}

/// One frame of generator nesting state.
#[derive(Debug, Clone, Copy)]
pub enum Frame {
    Array { size: u64, position: u64 },
    /// `size` is already doubled (key + value per declared element).
    Hash { size: u64, position: u64 },
    /// `nvars` is fixed by the `start_ivar(nvars)` call; the long encoding it is only written to
    /// the stream once the wrapped value has been written.
    IVar { nvars: u64, phase: IVarPhase, position: u64 },
    Keyed { kind: KeyedKind, pairs: u64, position: u64 },
    /// Expects exactly one value after the class symbol already written by `start_user_marshalled`.
    UsrMarshal { has_value: bool },
}
