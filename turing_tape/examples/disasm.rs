// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disassembler example.
//!
//! Run with:
//! `cargo run -p turing_tape --example disasm`

use turing_tape::asm::Asm;
use turing_tape::disasm::disassemble;

fn main() {
    // A two-state machine that rewrites a run of 'a's to 'b's, then parks one
    // square left of where it started.
    let mut a = Asm::new();
    let start = a.label();
    let rewind = a.label();

    a.begin_state(start).unwrap();
    a.compare_val(0x61).write_val(0x62).right().final_state(start);
    a.other().make_state(0, rewind).final_arg(0);

    a.begin_state(rewind).unwrap();
    a.other().left().write_bound().final_state(start);

    let bytes = a.finish(start).unwrap();
    println!("{}", disassemble(&bytes).unwrap());
}
