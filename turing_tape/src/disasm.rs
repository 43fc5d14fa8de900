// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disassembler for `turing_tape` programs.
//!
//! This module provides:
//! - A structured view ([`Disassembly`], [`StateDisassembly`], [`Arm`]) for
//!   tooling and tests.
//! - A stable, human-readable text format via [`core::fmt::Display`].
//!
//! State regions are walked front to back: a region's arm chain ends at a
//! `halt` arm or after the right-hand side of an `other` arm, and the next
//! region starts immediately after. The header's declared state count is
//! reported but not trusted.

use alloc::vec::Vec;
use core::fmt;

use crate::format::{DecodeError, Header, Reader};
use crate::opcode::Opcode;

/// A disassembly error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisasmError {
    /// The byte stream was malformed.
    Decode(DecodeError),
    /// The opcode byte is not recognized.
    UnknownOpcode {
        /// Byte offset of the opcode.
        offset: u32,
        /// The unrecognized opcode byte.
        opcode: u8,
    },
    /// A valid opcode appeared where the grammar does not allow it.
    UnexpectedOpcode {
        /// Byte offset of the opcode.
        offset: u32,
        /// The out-of-place opcode byte.
        opcode: u8,
    },
}

impl fmt::Display for DisasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode failed: {e}"),
            Self::UnknownOpcode { offset, opcode } => {
                write!(f, "unknown opcode {opcode:#04x} at {offset:#010x}")
            }
            Self::UnexpectedOpcode { offset, opcode } => {
                write!(f, "unexpected opcode {opcode:#04x} at {offset:#010x}")
            }
        }
    }
}

impl core::error::Error for DisasmError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for DisasmError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// A disassembled program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disassembly {
    /// The decoded header.
    pub header: Header,
    /// State regions in layout order.
    pub states: Vec<StateDisassembly>,
}

/// One state region: an arm chain at an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateDisassembly {
    /// Byte offset of the region's first arm.
    pub address: u32,
    /// Arms in declaration order.
    pub arms: Vec<Arm>,
}

/// One arm: a pattern and its right-hand side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arm {
    /// Byte offset of the arm header.
    pub offset: u32,
    /// The match pattern.
    pub pattern: Pattern,
    /// Right-hand-side instructions; empty for `halt` arms.
    pub instrs: Vec<DecodedInstr>,
}

/// An arm-header pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Match against an argument register.
    CompareArg {
        /// Argument index.
        index: u8,
        /// Encoded skip to the next arm on a miss.
        skip: u16,
    },
    /// Match against an immediate value.
    CompareVal {
        /// Immediate symbol.
        value: u16,
        /// Encoded skip to the next arm on a miss.
        skip: u16,
    },
    /// Wildcard; binds the scanned symbol.
    Other,
    /// Stop the machine.
    Halt,
}

/// A decoded RHS instruction with its byte offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstr {
    /// Byte offset of the opcode.
    pub offset: u32,
    /// The instruction.
    pub instr: Instr,
}

/// A decoded right-hand-side instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    /// Move the head one square left.
    Left,
    /// Move the head one square right.
    Right,
    /// Move the head `n` squares left.
    LeftN {
        /// Square count.
        n: u8,
    },
    /// Move the head `n` squares right.
    RightN {
        /// Square count.
        n: u8,
    },
    /// Write an argument symbol at the head.
    WriteArg {
        /// Argument index.
        index: u8,
    },
    /// Write an immediate symbol at the head.
    WriteVal {
        /// Immediate symbol.
        value: u16,
    },
    /// Write the bound symbol at the head.
    WriteBound,
    /// Push an argument symbol onto the symbol scratch.
    SymbolArg {
        /// Argument index.
        index: u8,
    },
    /// Push an immediate symbol onto the symbol scratch.
    SymbolVal {
        /// Immediate symbol.
        value: u16,
    },
    /// Push the bound symbol onto the symbol scratch.
    SymbolBound,
    /// Move a state argument onto the state scratch.
    TakeArg {
        /// Argument index.
        index: u8,
    },
    /// Push a clone of a state argument onto the state scratch.
    CloneArg {
        /// Argument index.
        index: u8,
    },
    /// Destroy a state argument.
    FreeArg {
        /// Argument index.
        index: u8,
    },
    /// Assemble a state value from the scratch stacks.
    MakeState {
        /// Number of children popped from the state scratch.
        children: u8,
        /// The new value's address.
        address: u32,
    },
    /// Terminal: transition to an immediate address.
    FinalState {
        /// Successor address.
        address: u32,
    },
    /// Terminal: transition into a state argument.
    FinalArg {
        /// Argument index.
        index: u8,
    },
}

/// Disassembles `bytes` into a structured view.
pub fn disassemble(bytes: &[u8]) -> Result<Disassembly, DisasmError> {
    let mut r = Reader::new(bytes);
    let header = Header::read(&mut r)?;
    let mut states = Vec::new();
    while r.offset() < r.len() {
        states.push(decode_state(&mut r)?);
    }
    Ok(Disassembly { header, states })
}

fn decode_state(r: &mut Reader<'_>) -> Result<StateDisassembly, DisasmError> {
    let address = offset_of(r);
    let mut arms = Vec::new();
    loop {
        let arm = decode_arm(r)?;
        let last = matches!(arm.pattern, Pattern::Other | Pattern::Halt);
        arms.push(arm);
        if last {
            return Ok(StateDisassembly { address, arms });
        }
    }
}

fn decode_arm(r: &mut Reader<'_>) -> Result<Arm, DisasmError> {
    let offset = offset_of(r);
    let pattern = match decode_opcode(r)? {
        Opcode::CompareArg => Pattern::CompareArg {
            index: r.fetch_u8()?,
            skip: r.fetch_u16()?,
        },
        Opcode::CompareVal => Pattern::CompareVal {
            value: r.fetch_u16()?,
            skip: r.fetch_u16()?,
        },
        Opcode::Other => Pattern::Other,
        Opcode::Halt => {
            return Ok(Arm {
                offset,
                pattern: Pattern::Halt,
                instrs: Vec::new(),
            });
        }
        other => {
            return Err(DisasmError::UnexpectedOpcode {
                offset,
                opcode: other.byte(),
            });
        }
    };
    let instrs = decode_rhs(r)?;
    Ok(Arm {
        offset,
        pattern,
        instrs,
    })
}

fn decode_rhs(r: &mut Reader<'_>) -> Result<Vec<DecodedInstr>, DisasmError> {
    let mut instrs = Vec::new();
    loop {
        let offset = offset_of(r);
        let opcode = decode_opcode(r)?;
        let instr = match opcode {
            Opcode::Left => Instr::Left,
            Opcode::Right => Instr::Right,
            Opcode::LeftN => Instr::LeftN { n: r.fetch_u8()? },
            Opcode::RightN => Instr::RightN { n: r.fetch_u8()? },
            Opcode::WriteArg => Instr::WriteArg {
                index: r.fetch_u8()?,
            },
            Opcode::WriteVal => Instr::WriteVal {
                value: r.fetch_u16()?,
            },
            Opcode::WriteBound => Instr::WriteBound,
            Opcode::SymbolArg => Instr::SymbolArg {
                index: r.fetch_u8()?,
            },
            Opcode::SymbolVal => Instr::SymbolVal {
                value: r.fetch_u16()?,
            },
            Opcode::SymbolBound => Instr::SymbolBound,
            Opcode::TakeArg => Instr::TakeArg {
                index: r.fetch_u8()?,
            },
            Opcode::CloneArg => Instr::CloneArg {
                index: r.fetch_u8()?,
            },
            Opcode::FreeArg => Instr::FreeArg {
                index: r.fetch_u8()?,
            },
            Opcode::MakeState => Instr::MakeState {
                children: r.fetch_u8()?,
                address: r.fetch_u32()?,
            },
            Opcode::FinalState => Instr::FinalState {
                address: r.fetch_u32()?,
            },
            Opcode::FinalArg => Instr::FinalArg {
                index: r.fetch_u8()?,
            },
            other => {
                return Err(DisasmError::UnexpectedOpcode {
                    offset,
                    opcode: other.byte(),
                });
            }
        };
        let terminal = matches!(instr, Instr::FinalState { .. } | Instr::FinalArg { .. });
        instrs.push(DecodedInstr { offset, instr });
        if terminal {
            return Ok(instrs);
        }
    }
}

fn decode_opcode(r: &mut Reader<'_>) -> Result<Opcode, DisasmError> {
    let offset = offset_of(r);
    let byte = r.fetch_u8()?;
    Opcode::from_byte(byte).ok_or(DisasmError::UnknownOpcode {
        offset,
        opcode: byte,
    })
}

fn offset_of(r: &Reader<'_>) -> u32 {
    u32::try_from(r.offset()).unwrap_or(u32::MAX)
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "program: {} declared states, entry @{:#010x}",
            self.header.state_count, self.header.entry
        )?;
        for state in &self.states {
            writeln!(f)?;
            write!(f, "{state}")?;
        }
        Ok(())
    }
}

impl fmt::Display for StateDisassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state @{:#010x}:", self.address)?;
        for arm in &self.arms {
            write!(f, "{arm}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pattern {
            Pattern::CompareArg { index, .. } => writeln!(f, "  compare_arg {index}:")?,
            Pattern::CompareVal { value, .. } => writeln!(f, "  compare_val {value:#06x}:")?,
            Pattern::Other => writeln!(f, "  other:")?,
            Pattern::Halt => writeln!(f, "  halt")?,
        }
        for di in &self.instrs {
            writeln!(f, "    {}", di.instr)?;
        }
        Ok(())
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::LeftN { n } => write!(f, "left_n {n}"),
            Self::RightN { n } => write!(f, "right_n {n}"),
            Self::WriteArg { index } => write!(f, "write_arg {index}"),
            Self::WriteVal { value } => write!(f, "write_val {value:#06x}"),
            Self::WriteBound => write!(f, "write_bound"),
            Self::SymbolArg { index } => write!(f, "symbol_arg {index}"),
            Self::SymbolVal { value } => write!(f, "symbol_val {value:#06x}"),
            Self::SymbolBound => write!(f, "symbol_bound"),
            Self::TakeArg { index } => write!(f, "take_arg {index}"),
            Self::CloneArg { index } => write!(f, "clone_arg {index}"),
            Self::FreeArg { index } => write!(f, "free_arg {index}"),
            Self::MakeState { children, address } => {
                write!(f, "make_state {children}, @{address:#010x}")
            }
            Self::FinalState { address } => write!(f, "final_state @{address:#010x}"),
            Self::FinalArg { index } => write!(f, "final_arg {index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use crate::asm::Asm;

    use super::{Instr, Pattern, disassemble};

    fn alternating_program() -> alloc::vec::Vec<u8> {
        let mut a = Asm::new();
        let halt = a.label();
        let flip = a.label();

        a.begin_state(halt).unwrap();
        a.halt();

        a.begin_state(flip).unwrap();
        a.compare_val(0x30).right().write_val(0x31).final_state(flip);
        a.compare_val(0x31).right().write_val(0x30).final_state(flip);
        a.other().write_bound().final_state(halt);

        a.finish(flip).unwrap()
    }

    #[test]
    fn structured_view_matches_layout() {
        let bytes = alternating_program();
        let d = disassemble(&bytes).unwrap();

        assert_eq!(d.header.state_count, 2);
        assert_eq!(d.header.entry, 7);
        assert_eq!(d.states.len(), 2);

        let halt_state = &d.states[0];
        assert_eq!(halt_state.address, 6);
        assert_eq!(halt_state.arms.len(), 1);
        assert_eq!(halt_state.arms[0].pattern, Pattern::Halt);
        assert!(halt_state.arms[0].instrs.is_empty());

        let flip = &d.states[1];
        assert_eq!(flip.address, 7);
        assert_eq!(flip.arms.len(), 3);
        assert_eq!(
            flip.arms[0].pattern,
            Pattern::CompareVal {
                value: 0x30,
                skip: 9
            }
        );
        assert_eq!(flip.arms[0].instrs[0].instr, Instr::Right);
        assert_eq!(
            flip.arms[0].instrs[2].instr,
            Instr::FinalState { address: 7 }
        );
        assert_eq!(flip.arms[2].pattern, Pattern::Other);
    }

    #[test]
    fn text_format_is_stable() {
        let bytes = alternating_program();
        let d = disassemble(&bytes).unwrap();
        let expected = "\
program: 2 declared states, entry @0x00000007

state @0x00000006:
  halt

state @0x00000007:
  compare_val 0x0030:
    right
    write_val 0x0031
    final_state @0x00000007
  compare_val 0x0031:
    right
    write_val 0x0030
    final_state @0x00000007
  other:
    write_bound
    final_state @0x00000006
";
        assert_eq!(d.to_string(), expected);
    }

    #[test]
    fn truncated_rhs_is_a_decode_error() {
        let bytes = alternating_program();
        let err = disassemble(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, super::DisasmError::Decode(_)));
    }
}
