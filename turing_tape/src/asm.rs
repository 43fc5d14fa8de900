// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bytecode builder ("assembler") for `turing_tape`.
//!
//! This is a small, public helper for constructing programs without manually
//! computing byte offsets, arm skip fields, or the header. It is primarily
//! intended for tests and prototypes; a full compiler front-end would emit
//! the same encoding.
//!
//! States are addressed through [`Label`]s: allocate with [`Asm::label`],
//! bind with [`Asm::begin_state`], and reference from `final_state` /
//! `make_state` before or after binding. The `u16` skip field of a
//! `compare_arg` / `compare_val` arm is patched automatically when the arm's
//! terminal instruction is emitted.

use alloc::vec::Vec;
use core::fmt;

use crate::format::{HEADER_LEN, Writer};
use crate::opcode::Opcode;

/// A label for a state's arm block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(u32);

/// A label that has not been placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedLabel;

impl fmt::Display for UnresolvedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label was referenced but never placed")
    }
}

impl core::error::Error for UnresolvedLabel {}

/// A bytecode builder error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AsmError {
    /// A label was referenced but never placed.
    UnresolvedLabel,
    /// An arm was opened but no terminal instruction closed it.
    UnterminatedArm,
    /// An arm's right-hand side exceeded the `u16` skip range.
    ArmTooLong,
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedLabel => write!(f, "unresolved label"),
            Self::UnterminatedArm => write!(f, "unterminated arm"),
            Self::ArmTooLong => write!(f, "arm right-hand side too long"),
        }
    }
}

impl core::error::Error for AsmError {}

impl From<UnresolvedLabel> for AsmError {
    fn from(_: UnresolvedLabel) -> Self {
        Self::UnresolvedLabel
    }
}

#[derive(Clone, Debug)]
struct Fixup {
    at: usize,
    label: Label,
}

/// Bytecode builder.
#[derive(Clone, Debug, Default)]
pub struct Asm {
    body: Writer,
    next_label: u32,
    labels: Vec<Option<u32>>,
    fixups: Vec<Fixup>,
    open_skip: Option<usize>,
    state_count: u16,
    error: Option<AsmError>,
}

impl Asm {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current byte offset ("pc") in the output, header included.
    #[must_use]
    pub fn pc(&self) -> u32 {
        u32::try_from(HEADER_LEN + self.body.len()).unwrap_or(u32::MAX)
    }

    /// Allocates a new label.
    #[must_use]
    pub fn label(&mut self) -> Label {
        let id = self.next_label;
        self.next_label = self.next_label.wrapping_add(1);
        self.labels.push(None);
        Label(id)
    }

    /// Binds `label` to the current `pc` and starts a new state region.
    pub fn begin_state(&mut self, label: Label) -> Result<(), UnresolvedLabel> {
        let pc = self.pc();
        let slot = self
            .labels
            .get_mut(label.0 as usize)
            .ok_or(UnresolvedLabel)?;
        *slot = Some(pc);
        self.state_count = self.state_count.saturating_add(1);
        Ok(())
    }

    /// `compare_arg index` arm header. The skip field is patched when the
    /// arm's terminal lands.
    pub fn compare_arg(&mut self, index: u8) -> &mut Self {
        self.arm_boundary();
        self.body.write_u8(Opcode::CompareArg.byte());
        self.body.write_u8(index);
        self.open_skip();
        self
    }

    /// `compare_val value` arm header. The skip field is patched when the
    /// arm's terminal lands.
    pub fn compare_val(&mut self, value: u16) -> &mut Self {
        self.arm_boundary();
        self.body.write_u8(Opcode::CompareVal.byte());
        self.body.write_u16(value);
        self.open_skip();
        self
    }

    /// `other` wildcard arm header.
    pub fn other(&mut self) -> &mut Self {
        self.arm_boundary();
        self.body.write_u8(Opcode::Other.byte());
        self
    }

    /// `halt` arm, ending the state's chain.
    pub fn halt(&mut self) -> &mut Self {
        self.arm_boundary();
        self.body.write_u8(Opcode::Halt.byte());
        self
    }

    /// `left`.
    pub fn left(&mut self) -> &mut Self {
        self.op(Opcode::Left)
    }

    /// `right`.
    pub fn right(&mut self) -> &mut Self {
        self.op(Opcode::Right)
    }

    /// `left_n n`.
    pub fn left_n(&mut self, n: u8) -> &mut Self {
        self.op(Opcode::LeftN);
        self.body.write_u8(n);
        self
    }

    /// `right_n n`.
    pub fn right_n(&mut self, n: u8) -> &mut Self {
        self.op(Opcode::RightN);
        self.body.write_u8(n);
        self
    }

    /// `write_arg index`.
    pub fn write_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::WriteArg);
        self.body.write_u8(index);
        self
    }

    /// `write_val value`.
    pub fn write_val(&mut self, value: u16) -> &mut Self {
        self.op(Opcode::WriteVal);
        self.body.write_u16(value);
        self
    }

    /// `write_bound`.
    pub fn write_bound(&mut self) -> &mut Self {
        self.op(Opcode::WriteBound)
    }

    /// `symbol_arg index`.
    pub fn symbol_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::SymbolArg);
        self.body.write_u8(index);
        self
    }

    /// `symbol_val value`.
    pub fn symbol_val(&mut self, value: u16) -> &mut Self {
        self.op(Opcode::SymbolVal);
        self.body.write_u16(value);
        self
    }

    /// `symbol_bound`.
    pub fn symbol_bound(&mut self) -> &mut Self {
        self.op(Opcode::SymbolBound)
    }

    /// `take_arg index`.
    pub fn take_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::TakeArg);
        self.body.write_u8(index);
        self
    }

    /// `clone_arg index`.
    pub fn clone_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::CloneArg);
        self.body.write_u8(index);
        self
    }

    /// `free_arg index`.
    pub fn free_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::FreeArg);
        self.body.write_u8(index);
        self
    }

    /// `make_state children, label`.
    pub fn make_state(&mut self, children: u8, label: Label) -> &mut Self {
        self.op(Opcode::MakeState);
        self.body.write_u8(children);
        self.label_ref(label);
        self
    }

    /// `final_state label` terminal; closes the open arm, if any.
    pub fn final_state(&mut self, label: Label) -> &mut Self {
        self.op(Opcode::FinalState);
        self.label_ref(label);
        self.close_arm();
        self
    }

    /// `final_arg index` terminal; closes the open arm, if any.
    pub fn final_arg(&mut self, index: u8) -> &mut Self {
        self.op(Opcode::FinalArg);
        self.body.write_u8(index);
        self.close_arm();
        self
    }

    /// Finalizes the program with `entry` as the starting state and returns
    /// the encoded bytes, header included.
    pub fn finish(mut self, entry: Label) -> Result<Vec<u8>, AsmError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.open_skip.is_some() {
            return Err(AsmError::UnterminatedArm);
        }

        for f in &self.fixups {
            let target = self
                .labels
                .get(f.label.0 as usize)
                .and_then(|slot| *slot)
                .ok_or(AsmError::UnresolvedLabel)?;
            self.body.patch_u32(f.at, target);
        }
        let entry_pc = self
            .labels
            .get(entry.0 as usize)
            .and_then(|slot| *slot)
            .ok_or(AsmError::UnresolvedLabel)?;

        let mut out = Writer::new();
        out.write_u16(self.state_count);
        out.write_u32(entry_pc);
        let mut bytes = out.into_vec();
        bytes.extend_from_slice(self.body.as_slice());
        Ok(bytes)
    }

    fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.body.write_u8(opcode.byte());
        self
    }

    fn label_ref(&mut self, label: Label) {
        self.fixups.push(Fixup {
            at: self.body.len(),
            label,
        });
        self.body.write_u32(0);
    }

    fn arm_boundary(&mut self) {
        if self.open_skip.take().is_some() {
            self.fail(AsmError::UnterminatedArm);
        }
    }

    fn open_skip(&mut self) {
        self.open_skip = Some(self.body.len());
        self.body.write_u16(0);
    }

    fn close_arm(&mut self) {
        if let Some(skip_at) = self.open_skip.take() {
            let rhs_len = self.body.len() - (skip_at + 2);
            match u16::try_from(rhs_len) {
                Ok(skip) => self.body.patch_u16(skip_at, skip),
                Err(_) => self.fail(AsmError::ArmTooLong),
            }
        }
    }

    fn fail(&mut self, e: AsmError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}
