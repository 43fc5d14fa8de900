// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `turing_tape`: a compact bytecode format and tape-machine VM runtime.
//!
//! Programs are Turing machines lowered to a linear byte stream by a
//! compiler: each state is a chain of pattern arms, and each arm carries a
//! right-hand side of tape effects ending in a final transition. The
//! [`vm::Machine`] interprets that stream against a one-sided symbol tape
//! under an explicit move budget; [`asm::Asm`] builds programs without a
//! compiler, and [`disasm`] renders them back.
//!
//! ## Example
//!
//! ```
//! use turing_tape::asm::Asm;
//! use turing_tape::vm::{Completion, Limits, Machine};
//!
//! // Fill the tape with alternating ASCII digits: the entry state writes a
//! // '0', and the flip state keeps stepping right and writing the digit the
//! // scanned square is not.
//! let mut a = Asm::new();
//! let start = a.label();
//! let flip = a.label();
//!
//! a.begin_state(start)?;
//! a.other().write_val(0x30).final_state(flip);
//!
//! a.begin_state(flip)?;
//! a.compare_val(0x30).right().write_val(0x31).final_state(flip);
//! a.compare_val(0x31).right().write_val(0x30).final_state(flip);
//! a.halt();
//!
//! let bytes = a.finish(start)?;
//!
//! let mut m = Machine::new(&bytes, &[]).unwrap();
//! assert_eq!(m.run(&Limits { move_budget: 10 }).unwrap(), Completion::OutOfMoves);
//! assert_eq!(
//!     m.tape().trimmed(),
//!     [0x30, 0x31, 0x30, 0x31, 0x30, 0x31, 0x30, 0x31, 0x30, 0x31]
//! );
//! assert_eq!(m.tape().head(), 9);
//! assert_eq!(m.move_count(), 10);
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```

#![no_std]

extern crate alloc;

pub mod asm;
pub mod disasm;
pub mod format;
pub mod opcode;
pub mod state;
pub mod tape;
pub mod trace;
pub mod vm;
