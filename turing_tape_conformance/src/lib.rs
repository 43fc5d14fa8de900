// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance suite for the `turing_tape` VM. See `tests/conformance.rs`.
