// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for `turing_tape`.
//!
//! Tracing is optional and `no_std` friendly. The VM only emits events
//! requested by a [`TraceMask`]; with [`TraceMask::NONE`] the hot loops do no
//! trace work at all.
//!
//! To enable tracing, use [`Machine::run_traced`] with a [`TraceSink`].

#[cfg(doc)]
use crate::vm::Machine;

use crate::vm::{Completion, TrapInfo};

/// A set of trace events requested by a [`TraceSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceMask(u32);

impl core::ops::BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TraceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TraceMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Emit [`TraceEvent::RunStart`] and [`TraceEvent::RunEnd`].
    pub const RUN: Self = Self(1 << 0);
    /// Emit [`TraceEvent::Move`] at the start of each move.
    pub const MOVE: Self = Self(1 << 1);
    /// Emit [`TraceEvent::Instr`] for each fetched instruction.
    pub const INSTR: Self = Self(1 << 2);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// A trace event emitted by the VM.
#[derive(Clone, Debug)]
pub enum TraceEvent<'a> {
    /// Start of a run.
    RunStart {
        /// Address of the current state's arm block.
        address: u32,
        /// Move budget for this run.
        move_budget: u64,
    },
    /// Start of a single move.
    Move {
        /// Zero-based move index.
        index: u64,
        /// Address of the state being matched.
        address: u32,
        /// The symbol under the head.
        scanned: u16,
    },
    /// A single fetched instruction (arm header or RHS).
    Instr {
        /// Byte offset of the opcode.
        pc: u32,
        /// Opcode byte.
        opcode: u8,
    },
    /// End of a run.
    RunEnd {
        /// Run outcome.
        outcome: TraceOutcome<'a>,
    },
}

/// Run outcome for tracing.
#[derive(Clone, Debug)]
pub enum TraceOutcome<'a> {
    /// The run completed with a cause.
    Completed(Completion),
    /// The run trapped.
    Trap(&'a TrapInfo),
}

/// A trace sink that can receive VM events.
pub trait TraceSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }

    /// Receives a trace event.
    fn event(&mut self, event: TraceEvent<'_>);
}
