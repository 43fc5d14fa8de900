// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpreter for `turing_tape` bytecode.
//!
//! The VM executes one program against one tape with an explicit move budget.
//! Dispatch is two-level: the move loop matches one arm of the current state
//! per move, and the RHS loop executes the matched arm's instructions until a
//! final transition hands control back. The two loops are deliberately kept
//! separate.
//!
//! The bytecode is produced by a trusted compiler, but this implementation
//! traps on malformed input instead of reading out of bounds: every fetch is
//! checked, argument registers are `Option` slots so a consumed argument
//! cannot be observed, and the scratch stacks enforce their capacities.

use alloc::vec::Vec;
use core::fmt;
use core::mem;
use core::ops::ControlFlow;

use crate::format::{Header, Reader};
use crate::opcode::Opcode;
use crate::state::{MAX_ARGS, STATE_SCRATCH_CAPACITY, SYMBOL_SCRATCH_CAPACITY, StateValue};
use crate::tape::Tape;
use crate::trace::{TraceEvent, TraceMask, TraceOutcome, TraceSink};

/// Execution limits for a VM run.
#[derive(Clone, Debug)]
pub struct Limits {
    /// Maximum number of moves a run may execute. Polled before each move, so
    /// a long right-hand side runs to completion once entered.
    pub move_budget: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            move_budget: 1_000_000,
        }
    }
}

/// Why a run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// A `halt` arm was matched.
    Halted,
    /// A leftward move underran square 0.
    LeftEdge,
    /// The move budget ran out.
    OutOfMoves,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halted => write!(f, "halted"),
            Self::LeftEdge => write!(f, "stopped at the left edge"),
            Self::OutOfMoves => write!(f, "out of moves"),
        }
    }
}

/// A runtime trap: a precondition the bytecode contract promised to uphold
/// was violated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    /// The opcode byte is not part of the instruction set.
    UnknownOpcode {
        /// The unrecognized opcode byte.
        opcode: u8,
    },
    /// A valid opcode appeared where the grammar does not allow it (an RHS
    /// instruction in arm position, or an arm header inside an RHS).
    UnexpectedOpcode {
        /// The out-of-place opcode byte.
        opcode: u8,
    },
    /// The cursor ran past the end of the program.
    UnexpectedEof,
    /// An argument index was at or beyond the register count.
    ArgOutOfRange {
        /// The offending argument index.
        index: u8,
    },
    /// A state argument was read after being taken or freed.
    ArgConsumed {
        /// The offending argument index.
        index: u8,
    },
    /// A scratch stack exceeded its capacity.
    ScratchOverflow,
    /// `make_state` asked for more children than the state scratch holds.
    ScratchUnderflow,
    /// A final transition installed more than [`MAX_ARGS`] arguments.
    ArgCountExceeded,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode } => write!(f, "unknown opcode {opcode:#04x}"),
            Self::UnexpectedOpcode { opcode } => write!(f, "unexpected opcode {opcode:#04x}"),
            Self::UnexpectedEof => write!(f, "unexpected end of program"),
            Self::ArgOutOfRange { index } => write!(f, "argument index {index} out of range"),
            Self::ArgConsumed { index } => write!(f, "argument {index} already consumed"),
            Self::ScratchOverflow => write!(f, "scratch stack overflow"),
            Self::ScratchUnderflow => write!(f, "scratch stack underflow"),
            Self::ArgCountExceeded => write!(f, "argument count exceeded"),
        }
    }
}

impl core::error::Error for Trap {}

/// A trap annotated with the byte offset it occurred at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrapInfo {
    /// Byte offset of the faulting fetch.
    pub pc: u32,
    /// Trap kind.
    pub trap: Trap,
}

impl TrapInfo {
    fn new(pc: u32, trap: Trap) -> Self {
        Self { pc, trap }
    }
}

impl fmt::Display for TrapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trap at pc={:#010x}: {}", self.pc, self.trap)
    }
}

impl core::error::Error for TrapInfo {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.trap)
    }
}

/// A tape machine executing one program.
///
/// A machine is constructed over a borrowed bytecode buffer and an initial
/// tape, run against a [`Limits`] budget, and then inspected through the
/// accessors. All owned resources (tape, argument registers, scratch stacks)
/// are freed on drop.
pub struct Machine<'p> {
    cursor: Reader<'p>,
    tape: Tape,
    address: u32,
    state_args: Vec<Option<StateValue>>,
    symbol_args: Vec<u16>,
    state_scratch: Vec<StateValue>,
    symbol_scratch: Vec<u16>,
    bound: u16,
    moves: u64,
    completion: Option<Completion>,
}

impl fmt::Debug for Machine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("address", &self.address)
            .field("moves", &self.moves)
            .field("head", &self.tape.head())
            .finish_non_exhaustive()
    }
}

impl<'p> Machine<'p> {
    /// Creates a machine over `bytes` with `initial_tape` installed at square
    /// 0 and the cursor positioned at the entry state's first arm.
    ///
    /// The entry state has no parameters, so both register files start empty.
    pub fn new(bytes: &'p [u8], initial_tape: &[u16]) -> Result<Self, TrapInfo> {
        let mut cursor = Reader::new(bytes);
        let header =
            Header::read(&mut cursor).map_err(|_| TrapInfo::new(0, Trap::UnexpectedEof))?;
        cursor.jump(header.entry);
        Ok(Self {
            cursor,
            tape: Tape::new(initial_tape),
            address: header.entry,
            state_args: Vec::new(),
            symbol_args: Vec::new(),
            state_scratch: Vec::new(),
            symbol_scratch: Vec::new(),
            bound: 0,
            moves: 0,
            completion: None,
        })
    }

    /// Runs until the machine halts, underruns the left edge, or exhausts the
    /// move budget.
    ///
    /// `Halted` and `LeftEdge` are final: a later call reports the same
    /// completion without executing further moves. `OutOfMoves` is not; a
    /// later call with a larger budget resumes where the run left off.
    pub fn run(&mut self, limits: &Limits) -> Result<Completion, TrapInfo> {
        self.run_traced(limits, TraceMask::NONE, None)
    }

    /// Runs like [`Machine::run`], emitting the events selected by `mask` to
    /// `sink`.
    pub fn run_traced(
        &mut self,
        limits: &Limits,
        mask: TraceMask,
        mut sink: Option<&mut dyn TraceSink>,
    ) -> Result<Completion, TrapInfo> {
        if mask.contains(TraceMask::RUN) {
            emit(
                &mut sink,
                TraceEvent::RunStart {
                    address: self.address,
                    move_budget: limits.move_budget,
                },
            );
        }

        let result = self.run_loop(limits, mask, &mut sink);

        if mask.contains(TraceMask::RUN) {
            let outcome = match &result {
                Ok(completion) => TraceOutcome::Completed(*completion),
                Err(trap) => TraceOutcome::Trap(trap),
            };
            emit(&mut sink, TraceEvent::RunEnd { outcome });
        }

        result
    }

    fn run_loop(
        &mut self,
        limits: &Limits,
        mask: TraceMask,
        sink: &mut Option<&mut dyn TraceSink>,
    ) -> Result<Completion, TrapInfo> {
        loop {
            if let Some(completion) = self.completion {
                return Ok(completion);
            }
            if self.moves >= limits.move_budget {
                return Ok(Completion::OutOfMoves);
            }
            if mask.contains(TraceMask::MOVE) {
                emit(
                    sink,
                    TraceEvent::Move {
                        index: self.moves,
                        address: self.address,
                        scanned: self.tape.read(),
                    },
                );
            }
            match self.run_move(mask, sink)? {
                ControlFlow::Continue(()) => self.moves += 1,
                ControlFlow::Break(completion) => {
                    // A left-edge stop can abandon a half-built envelope;
                    // destroy it so a live machine holds no orphaned values.
                    self.state_scratch.clear();
                    self.symbol_scratch.clear();
                    self.completion = Some(completion);
                    return Ok(completion);
                }
            }
        }
    }

    /// Matches one arm of the current state and executes its right-hand side.
    fn run_move(
        &mut self,
        mask: TraceMask,
        sink: &mut Option<&mut dyn TraceSink>,
    ) -> Result<ControlFlow<Completion>, TrapInfo> {
        loop {
            let pc = self.pc();
            let opcode = self.fetch_opcode(pc, mask, sink)?;
            match opcode {
                Opcode::CompareArg => {
                    let index = self.fetch_u8()?;
                    let value = self.symbol_arg(pc, index)?;
                    if self.tape.read() == value {
                        self.fetch_u16()?;
                        return self.run_rhs(mask, sink);
                    }
                    let skip = self.fetch_u16()?;
                    self.skip(skip)?;
                }
                Opcode::CompareVal => {
                    let value = self.fetch_u16()?;
                    if self.tape.read() == value {
                        self.fetch_u16()?;
                        return self.run_rhs(mask, sink);
                    }
                    let skip = self.fetch_u16()?;
                    self.skip(skip)?;
                }
                Opcode::Other => {
                    self.bound = self.tape.read();
                    return self.run_rhs(mask, sink);
                }
                Opcode::Halt => return Ok(ControlFlow::Break(Completion::Halted)),
                other => {
                    return Err(TrapInfo::new(
                        pc,
                        Trap::UnexpectedOpcode {
                            opcode: other.byte(),
                        },
                    ));
                }
            }
        }
    }

    /// Executes RHS instructions until a final transition or a left-edge
    /// stop.
    fn run_rhs(
        &mut self,
        mask: TraceMask,
        sink: &mut Option<&mut dyn TraceSink>,
    ) -> Result<ControlFlow<Completion>, TrapInfo> {
        debug_assert!(
            self.state_scratch.is_empty() && self.symbol_scratch.is_empty(),
            "scratch stacks must be empty at RHS entry"
        );
        loop {
            let pc = self.pc();
            let opcode = self.fetch_opcode(pc, mask, sink)?;
            match opcode {
                Opcode::Left => {
                    if self.tape.left(1).is_break() {
                        return Ok(ControlFlow::Break(Completion::LeftEdge));
                    }
                }
                Opcode::Right => self.tape.right(1),
                Opcode::LeftN => {
                    let n = self.fetch_u8()?;
                    if self.tape.left(n as usize).is_break() {
                        return Ok(ControlFlow::Break(Completion::LeftEdge));
                    }
                }
                Opcode::RightN => {
                    let n = self.fetch_u8()?;
                    self.tape.right(n as usize);
                }
                Opcode::WriteArg => {
                    let index = self.fetch_u8()?;
                    let value = self.symbol_arg(pc, index)?;
                    self.tape.write(value);
                }
                Opcode::WriteVal => {
                    let value = self.fetch_u16()?;
                    self.tape.write(value);
                }
                Opcode::WriteBound => self.tape.write(self.bound),
                Opcode::SymbolArg => {
                    let index = self.fetch_u8()?;
                    let value = self.symbol_arg(pc, index)?;
                    self.push_symbol(pc, value)?;
                }
                Opcode::SymbolVal => {
                    let value = self.fetch_u16()?;
                    self.push_symbol(pc, value)?;
                }
                Opcode::SymbolBound => {
                    let value = self.bound;
                    self.push_symbol(pc, value)?;
                }
                Opcode::TakeArg => {
                    let index = self.fetch_u8()?;
                    let taken = self.take_state_arg(pc, index)?;
                    self.push_state(pc, taken)?;
                }
                Opcode::CloneArg => {
                    let index = self.fetch_u8()?;
                    let cloned = self.state_arg(pc, index)?.clone();
                    self.push_state(pc, cloned)?;
                }
                Opcode::FreeArg => {
                    let index = self.fetch_u8()?;
                    drop(self.take_state_arg(pc, index)?);
                }
                Opcode::MakeState => {
                    let children_count = self.fetch_u8()? as usize;
                    let address = self.fetch_u32()?;
                    let at = self
                        .state_scratch
                        .len()
                        .checked_sub(children_count)
                        .ok_or_else(|| TrapInfo::new(pc, Trap::ScratchUnderflow))?;
                    let children = self.state_scratch.split_off(at);
                    let symbols = mem::take(&mut self.symbol_scratch);
                    self.push_state(pc, StateValue::new(address, children, symbols))?;
                }
                Opcode::FinalState => {
                    let address = self.fetch_u32()?;
                    if self.state_scratch.len() > MAX_ARGS {
                        return Err(TrapInfo::new(pc, Trap::ArgCountExceeded));
                    }
                    self.state_args.clear();
                    self.state_args.extend(self.state_scratch.drain(..).map(Some));
                    self.symbol_args.clear();
                    self.symbol_args.append(&mut self.symbol_scratch);
                    self.address = address;
                    self.cursor.jump(address);
                    return Ok(ControlFlow::Continue(()));
                }
                Opcode::FinalArg => {
                    let index = self.fetch_u8()?;
                    let StateValue {
                        address,
                        children,
                        symbols,
                    } = self.take_state_arg(pc, index)?;
                    self.state_args.clear();
                    self.state_args.extend(children.into_iter().map(Some));
                    self.symbol_args = symbols;
                    self.address = address;
                    self.cursor.jump(address);
                    return Ok(ControlFlow::Continue(()));
                }
                other => {
                    return Err(TrapInfo::new(
                        pc,
                        Trap::UnexpectedOpcode {
                            opcode: other.byte(),
                        },
                    ));
                }
            }
        }
    }

    /// Returns the address of the current (or final) state's arm block.
    #[must_use]
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Returns the number of completed moves.
    #[must_use]
    pub fn move_count(&self) -> u64 {
        self.moves
    }

    /// Returns the tape.
    #[must_use]
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the symbol captured by the most recent `other` arm.
    #[must_use]
    pub fn bound(&self) -> u16 {
        self.bound
    }

    /// Consumes the machine and returns the tape.
    #[must_use]
    pub fn into_tape(self) -> Tape {
        self.tape
    }

    fn pc(&self) -> u32 {
        u32::try_from(self.cursor.offset()).unwrap_or(u32::MAX)
    }

    fn fetch_opcode(
        &mut self,
        pc: u32,
        mask: TraceMask,
        sink: &mut Option<&mut dyn TraceSink>,
    ) -> Result<Opcode, TrapInfo> {
        let byte = self.fetch_u8()?;
        let opcode =
            Opcode::from_byte(byte).ok_or(TrapInfo::new(pc, Trap::UnknownOpcode { opcode: byte }))?;
        if mask.contains(TraceMask::INSTR) {
            emit(sink, TraceEvent::Instr { pc, opcode: byte });
        }
        Ok(opcode)
    }

    fn fetch_u8(&mut self) -> Result<u8, TrapInfo> {
        let pc = self.pc();
        self.cursor
            .fetch_u8()
            .map_err(|_| TrapInfo::new(pc, Trap::UnexpectedEof))
    }

    fn fetch_u16(&mut self) -> Result<u16, TrapInfo> {
        let pc = self.pc();
        self.cursor
            .fetch_u16()
            .map_err(|_| TrapInfo::new(pc, Trap::UnexpectedEof))
    }

    fn fetch_u32(&mut self) -> Result<u32, TrapInfo> {
        let pc = self.pc();
        self.cursor
            .fetch_u32()
            .map_err(|_| TrapInfo::new(pc, Trap::UnexpectedEof))
    }

    fn skip(&mut self, n: u16) -> Result<(), TrapInfo> {
        let pc = self.pc();
        self.cursor
            .skip(n as usize)
            .map_err(|_| TrapInfo::new(pc, Trap::UnexpectedEof))
    }

    fn symbol_arg(&self, pc: u32, index: u8) -> Result<u16, TrapInfo> {
        self.symbol_args
            .get(index as usize)
            .copied()
            .ok_or(TrapInfo::new(pc, Trap::ArgOutOfRange { index }))
    }

    fn state_arg(&self, pc: u32, index: u8) -> Result<&StateValue, TrapInfo> {
        match self.state_args.get(index as usize) {
            Some(slot) => slot
                .as_ref()
                .ok_or(TrapInfo::new(pc, Trap::ArgConsumed { index })),
            None => Err(TrapInfo::new(pc, Trap::ArgOutOfRange { index })),
        }
    }

    fn take_state_arg(&mut self, pc: u32, index: u8) -> Result<StateValue, TrapInfo> {
        match self.state_args.get_mut(index as usize) {
            Some(slot) => slot
                .take()
                .ok_or(TrapInfo::new(pc, Trap::ArgConsumed { index })),
            None => Err(TrapInfo::new(pc, Trap::ArgOutOfRange { index })),
        }
    }

    fn push_state(&mut self, pc: u32, value: StateValue) -> Result<(), TrapInfo> {
        if self.state_scratch.len() >= STATE_SCRATCH_CAPACITY {
            return Err(TrapInfo::new(pc, Trap::ScratchOverflow));
        }
        self.state_scratch.push(value);
        Ok(())
    }

    fn push_symbol(&mut self, pc: u32, value: u16) -> Result<(), TrapInfo> {
        if self.symbol_scratch.len() >= SYMBOL_SCRATCH_CAPACITY {
            return Err(TrapInfo::new(pc, Trap::ScratchOverflow));
        }
        self.symbol_scratch.push(value);
        Ok(())
    }
}

fn emit(sink: &mut Option<&mut dyn TraceSink>, event: TraceEvent<'_>) {
    if let Some(t) = sink.as_mut() {
        t.event(event);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::format::Writer;
    use crate::opcode::Opcode;

    use super::{Completion, Limits, Machine, Trap};

    /// Hand-assembles a program: header, then `body` starting at offset 6.
    fn program(entry: u32, body: &[u8]) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u16(0);
        w.write_u32(entry);
        let mut bytes = w.into_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn halt_on_entry_executes_no_moves() {
        let bytes = program(6, &[Opcode::Halt.byte()]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        assert_eq!(m.run(&Limits::default()), Ok(Completion::Halted));
        assert_eq!(m.move_count(), 0);
        assert_eq!(m.address(), 6);
    }

    #[test]
    fn completion_is_sticky_after_halt() {
        let bytes = program(6, &[Opcode::Halt.byte()]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        assert_eq!(m.run(&Limits::default()), Ok(Completion::Halted));
        assert_eq!(m.run(&Limits::default()), Ok(Completion::Halted));
        assert_eq!(m.move_count(), 0);
    }

    #[test]
    fn zero_budget_executes_nothing() {
        let bytes = program(6, &[Opcode::Halt.byte()]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        assert_eq!(m.run(&Limits { move_budget: 0 }), Ok(Completion::OutOfMoves));
        assert_eq!(m.move_count(), 0);
    }

    #[test]
    fn truncated_header_traps() {
        let err = Machine::new(&[0, 0, 6], &[]).unwrap_err();
        assert_eq!(err.trap, Trap::UnexpectedEof);
    }

    #[test]
    fn unknown_opcode_traps_with_location() {
        let bytes = program(6, &[0xFF]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        let err = m.run(&Limits::default()).unwrap_err();
        assert_eq!(err.pc, 6);
        assert_eq!(err.trap, Trap::UnknownOpcode { opcode: 0xFF });
    }

    #[test]
    fn rhs_opcode_in_arm_position_traps() {
        let bytes = program(6, &[Opcode::Right.byte()]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        let err = m.run(&Limits::default()).unwrap_err();
        assert_eq!(err.trap, Trap::UnexpectedOpcode { opcode: 5 });
    }

    #[test]
    fn argument_index_out_of_range_traps() {
        // The entry state has no parameters, so `compare_arg 0` faults.
        let bytes = program(6, &[Opcode::CompareArg.byte(), 0, 0, 0]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        let err = m.run(&Limits::default()).unwrap_err();
        assert_eq!(err.trap, Trap::ArgOutOfRange { index: 0 });
    }

    #[test]
    fn cursor_running_off_the_end_traps() {
        // `other` followed by nothing: the RHS fetch falls off the program.
        let bytes = program(6, &[Opcode::Other.byte()]);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        let err = m.run(&Limits::default()).unwrap_err();
        assert_eq!(err.trap, Trap::UnexpectedEof);
    }

    #[test]
    fn left_edge_stop_destroys_scratch() {
        // other; symbol_val 7; left; (never reaches a terminal)
        let body = [
            Opcode::Other.byte(),
            Opcode::SymbolVal.byte(),
            7,
            0,
            Opcode::Left.byte(),
        ];
        let bytes = program(6, &body);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        assert_eq!(m.run(&Limits::default()), Ok(Completion::LeftEdge));
        assert_eq!(m.move_count(), 0);
        assert!(m.symbol_scratch.is_empty());
        assert!(m.state_scratch.is_empty());
    }

    #[test]
    fn final_state_installs_scratch_as_arguments() {
        // Entry: other; symbol_val 0x61; final_state 15.
        // At 15: compare_arg 0 (skip 7); write_arg 0; final_state 26.
        // At 26: halt.
        let body = [
            Opcode::Other.byte(),
            Opcode::SymbolVal.byte(),
            0x61,
            0,
            Opcode::FinalState.byte(),
            15,
            0,
            0,
            0,
            // offset 15
            Opcode::CompareArg.byte(),
            0,
            7,
            0,
            // offset 19: RHS
            Opcode::WriteArg.byte(),
            0,
            Opcode::FinalState.byte(),
            26,
            0,
            0,
            0,
            // offset 26
            Opcode::Halt.byte(),
        ];
        let bytes = program(6, &body);
        let mut m = Machine::new(&bytes, &[0x61]).unwrap();
        assert_eq!(m.run(&Limits::default()), Ok(Completion::Halted));
        assert_eq!(m.move_count(), 2);
        assert_eq!(m.tape().cells()[0], 0x61);
        assert_eq!(m.address(), 26);
    }

    #[test]
    fn take_then_reuse_traps_as_consumed() {
        // Entry: other; make_state(0 children) -> scratch; final_state into a
        // state with one state arg; that state takes arg 0 twice.
        let body = [
            Opcode::Other.byte(),
            Opcode::MakeState.byte(),
            0,
            28,
            0,
            0,
            0,
            Opcode::FinalState.byte(),
            18,
            0,
            0,
            0,
            // offset 18
            Opcode::Other.byte(),
            Opcode::TakeArg.byte(),
            0,
            Opcode::TakeArg.byte(),
            0,
            // unreachable terminal
            Opcode::FinalState.byte(),
            28,
            0,
            0,
            0,
            // offset 28
            Opcode::Halt.byte(),
        ];
        let bytes = program(6, &body);
        let mut m = Machine::new(&bytes, &[]).unwrap();
        let err = m.run(&Limits::default()).unwrap_err();
        assert_eq!(err.trap, Trap::ArgConsumed { index: 0 });
    }
}
