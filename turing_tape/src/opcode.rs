// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opcode byte values for the instruction set.
//!
//! The numbering is split in two blocks and is a wire contract with the
//! compiler: arm headers occupy `0..=3`, right-hand-side instructions occupy
//! `4..=19`.

/// A bytecode opcode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Arm header: match the scanned symbol against an argument register.
    CompareArg = 0,
    /// Arm header: match the scanned symbol against an immediate value.
    CompareVal = 1,
    /// Arm header: wildcard; binds the scanned symbol to the `bound` register.
    Other = 2,
    /// Arm header: stop the machine.
    Halt = 3,

    /// Move the head one square to the left.
    Left = 4,
    /// Move the head one square to the right.
    Right = 5,
    /// Move the head `n` squares to the left.
    LeftN = 6,
    /// Move the head `n` squares to the right.
    RightN = 7,
    /// Write an argument-register symbol at the head.
    WriteArg = 8,
    /// Write an immediate symbol at the head.
    WriteVal = 9,
    /// Write the `bound` symbol at the head.
    WriteBound = 10,

    /// Push an argument-register symbol onto the symbol scratch stack.
    SymbolArg = 11,
    /// Push an immediate symbol onto the symbol scratch stack.
    SymbolVal = 12,
    /// Push the `bound` symbol onto the symbol scratch stack.
    SymbolBound = 13,
    /// Move a state argument onto the state scratch stack.
    TakeArg = 14,
    /// Push a deep clone of a state argument onto the state scratch stack.
    CloneArg = 15,
    /// Destroy a state argument in place.
    FreeArg = 16,
    /// Assemble a state value from the scratch stacks.
    MakeState = 17,
    /// Terminal: transition to an immediate address with the scratch as arguments.
    FinalState = 18,
    /// Terminal: transition into a state argument, consuming its envelope.
    FinalArg = 19,
}

impl Opcode {
    /// Returns the opcode byte value.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Parses an opcode from its byte value.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => Self::CompareArg,
            1 => Self::CompareVal,
            2 => Self::Other,
            3 => Self::Halt,
            4 => Self::Left,
            5 => Self::Right,
            6 => Self::LeftN,
            7 => Self::RightN,
            8 => Self::WriteArg,
            9 => Self::WriteVal,
            10 => Self::WriteBound,
            11 => Self::SymbolArg,
            12 => Self::SymbolVal,
            13 => Self::SymbolBound,
            14 => Self::TakeArg,
            15 => Self::CloneArg,
            16 => Self::FreeArg,
            17 => Self::MakeState,
            18 => Self::FinalState,
            19 => Self::FinalArg,
            _ => return None,
        })
    }

    /// Returns `true` for the arm-header opcodes that begin a match record.
    #[must_use]
    pub const fn is_arm_header(self) -> bool {
        matches!(
            self,
            Self::CompareArg | Self::CompareVal | Self::Other | Self::Halt
        )
    }

    /// Returns `true` for the terminal opcodes that end a right-hand side.
    #[must_use]
    pub const fn is_terminator(self) -> bool {
        matches!(self, Self::FinalState | Self::FinalArg)
    }

    /// Returns the lowercase mnemonic used by the disassembler.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::CompareArg => "compare_arg",
            Self::CompareVal => "compare_val",
            Self::Other => "other",
            Self::Halt => "halt",
            Self::Left => "left",
            Self::Right => "right",
            Self::LeftN => "left_n",
            Self::RightN => "right_n",
            Self::WriteArg => "write_arg",
            Self::WriteVal => "write_val",
            Self::WriteBound => "write_bound",
            Self::SymbolArg => "symbol_arg",
            Self::SymbolVal => "symbol_val",
            Self::SymbolBound => "symbol_bound",
            Self::TakeArg => "take_arg",
            Self::CloneArg => "clone_arg",
            Self::FreeArg => "free_arg",
            Self::MakeState => "make_state",
            Self::FinalState => "final_state",
            Self::FinalArg => "final_arg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn opcode_values_are_stable() {
        assert_eq!(Opcode::CompareArg as u8, 0);
        assert_eq!(Opcode::Halt as u8, 3);
        assert_eq!(Opcode::Left as u8, 4);
        assert_eq!(Opcode::WriteBound as u8, 10);
        assert_eq!(Opcode::SymbolArg as u8, 11);
        assert_eq!(Opcode::MakeState as u8, 17);
        assert_eq!(Opcode::FinalArg as u8, 19);
    }

    #[test]
    fn byte_roundtrip() {
        for b in 0..=19 {
            let op = Opcode::from_byte(b).unwrap();
            assert_eq!(op.byte(), b);
        }
        assert_eq!(Opcode::from_byte(20), None);
        assert_eq!(Opcode::from_byte(0xFF), None);
    }

    #[test]
    fn opcode_classification() {
        assert!(Opcode::CompareVal.is_arm_header());
        assert!(Opcode::Halt.is_arm_header());
        assert!(!Opcode::Left.is_arm_header());
        assert!(Opcode::FinalState.is_terminator());
        assert!(Opcode::FinalArg.is_terminator());
        assert!(!Opcode::MakeState.is_terminator());
    }
}
