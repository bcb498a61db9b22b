// rmarsh
// Copyright (c) 2026 The rmarsh Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use marshal_core::Range;

#[test]
fn new_range_has_expected_length() {
    let r = Range::new(10, 15);
    assert_eq!(r.len(), 5);
    assert!(!r.is_empty());
    assert!(!r.is_open());
}

#[test]
fn open_range_has_zero_end_until_finalized() {
    let mut r = Range::open_at(3);
    assert!(r.is_open());
    assert_eq!(r.begin, 3);

    r.end = 9;
    assert!(!r.is_open());
    assert_eq!(r.len(), 6);
}

#[test]
fn empty_range_reports_zero_length() {
    let r = Range::new(4, 4);
    assert!(r.is_empty());
    assert_eq!(r.len(), 0);
}

#[test]
fn default_range_is_empty_at_origin() {
    let r = Range::default();
    assert_eq!(r, Range::new(0, 0));
    // A default range is open (end == 0) despite begin also being 0; callers must not rely on
    // `is_open` alone to detect a freshly-constructed Range.
    assert!(r.is_open());
}
