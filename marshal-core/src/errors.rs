// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::io;
use std::result;

/// The specific way a stream was rejected or an invariant was violated.
///
/// Every non-IO variant is paired with a byte offset (bytes consumed by the parser, or bytes
/// written by the generator, at the time of the failure) by [`Error::Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream's structure does not match the format: bad magic, unknown type byte, an
    /// out-of-range long encoding, an out-of-range link or symlink id, or a non-symbol byte
    /// where an IVar/Object/Struct key was expected.
    MalformedStream,
    /// The source ended while a value was still being read.
    UnexpectedEof,
    /// `replay()` was asked to replay a link whose value has not finished parsing yet.
    ReplayUnfinished,
    /// `replay()` was asked to replay a link that is already being replayed by an ancestor.
    ReplayRecursive,
    /// `replay()` was given a link id that does not (yet) exist in the link table.
    ReplayUnknownId,
    /// A payload accessor (`int()`, `text()`, ...) was called on a token it does not apply to.
    WrongToken,
    /// A write was attempted after the generator's single top-level value was completed.
    GeneratorFinished,
    /// A write was attempted past the declared element count of the current composite.
    GeneratorOverflow,
    /// A symbol-keyed position (inside an IVar, Object, or Struct) received a non-symbol value.
    NonSymbolKey,
    /// An `end_*` call did not match the currently open frame's kind or declared count.
    UnbalancedClose,
    /// A numeric value fell outside the range the target representation can hold.
    ValueOutOfRange,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedStream => "stream is malformed",
            ErrorKind::UnexpectedEof => "unexpected end of stream",
            ErrorKind::ReplayUnfinished => "cannot replay a value that has not finished parsing",
            ErrorKind::ReplayRecursive => "cannot replay a link that is already being replayed",
            ErrorKind::ReplayUnknownId => "replay target id does not exist in the link table",
            ErrorKind::WrongToken => "payload accessor does not apply to the current token",
            ErrorKind::GeneratorFinished => "generator has already written its top-level value",
            ErrorKind::GeneratorOverflow => "write exceeds the declared count of the open frame",
            ErrorKind::NonSymbolKey => "expected a symbol in key position",
            ErrorKind::UnbalancedClose => "closing call does not match the open frame",
            ErrorKind::ValueOutOfRange => "value out of range for its wire representation",
        }
    }
}

/// `Error` enumerates everything that can go wrong parsing or generating a Marshal stream.
#[derive(Debug)]
pub enum Error {
    /// The underlying byte source or sink failed.
    Io(io::Error),
    /// A structural or format violation at a specific byte offset.
    Format { kind: ErrorKind, offset: u64, message: String },
}

impl Error {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Io(_) => None,
            Error::Format { kind, .. } => Some(*kind),
        }
    }

    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::Io(_) => None,
            Error::Format { offset, .. } => Some(*offset),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Format { kind, offset, message } => {
                write!(f, "{} at byte {}: {}", kind.as_str(), offset, message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Format { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

pub type Result<T> = result::Result<T, Error>;

fn format_error<T>(kind: ErrorKind, offset: u64, message: impl Into<String>) -> Result<T> {
    Err(Error::Format { kind, offset, message: message.into() })
}

/// Convenience constructor for [`ErrorKind::MalformedStream`].
pub fn malformed_stream_error<T>(offset: u64, message: impl Into<String>) -> Result<T> {
    format_error(ErrorKind::MalformedStream, offset, message)
}

/// Convenience constructor for [`ErrorKind::UnexpectedEof`].
pub fn unexpected_eof_error<T>(offset: u64) -> Result<T> {
    format_error(ErrorKind::UnexpectedEof, offset, "source ended mid-value")
}

/// Convenience constructor for [`ErrorKind::ReplayUnfinished`].
pub fn replay_unfinished_error<T>(offset: u64, link_id: u64) -> Result<T> {
    format_error(ErrorKind::ReplayUnfinished, offset, format!("link {link_id} is still open"))
}

/// Convenience constructor for [`ErrorKind::ReplayRecursive`].
pub fn replay_recursive_error<T>(offset: u64, link_id: u64) -> Result<T> {
    format_error(ErrorKind::ReplayRecursive, offset, format!("link {link_id} is already being replayed"))
}

/// Convenience constructor for [`ErrorKind::ReplayUnknownId`].
pub fn replay_unknown_id_error<T>(offset: u64, link_id: u64) -> Result<T> {
    format_error(ErrorKind::ReplayUnknownId, offset, format!("no link table entry for id {link_id}"))
}

/// Convenience constructor for [`ErrorKind::WrongToken`].
pub fn wrong_token_error<T>(offset: u64, message: impl Into<String>) -> Result<T> {
    format_error(ErrorKind::WrongToken, offset, message)
}

/// Convenience constructor for [`ErrorKind::GeneratorFinished`].
pub fn generator_finished_error<T>(offset: u64) -> Result<T> {
    format_error(ErrorKind::GeneratorFinished, offset, "top-level value already written")
}

/// Convenience constructor for [`ErrorKind::GeneratorOverflow`].
pub fn generator_overflow_error<T>(offset: u64, declared: u64) -> Result<T> {
    format_error(ErrorKind::GeneratorOverflow, offset, format!("frame declared {declared} elements"))
}

/// Convenience constructor for [`ErrorKind::NonSymbolKey`].
pub fn non_symbol_key_error<T>(offset: u64) -> Result<T> {
    format_error(ErrorKind::NonSymbolKey, offset, "expected a symbol in key position")
}

/// Convenience constructor for [`ErrorKind::UnbalancedClose`].
pub fn unbalanced_close_error<T>(offset: u64, message: impl Into<String>) -> Result<T> {
    format_error(ErrorKind::UnbalancedClose, offset, message)
}

/// Convenience constructor for [`ErrorKind::ValueOutOfRange`].
pub fn value_out_of_range_error<T>(offset: u64, message: impl Into<String>) -> Result<T> {
    format_error(ErrorKind::ValueOutOfRange, offset, message)
}
