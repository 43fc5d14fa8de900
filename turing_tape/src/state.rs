// Copyright 2026 the Turing Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The state value model.
//!
//! A [`StateValue`] is a partially applied machine state: the address of its
//! arm block plus bindings for its state and symbol parameters. Values form a
//! tree, never a DAG; every child and symbol list is exclusively owned, so
//! `Clone` is a deep copy and destruction is `Drop`.

use alloc::vec::Vec;
use core::fmt;

/// Maximum number of state or symbol arguments a state can carry.
pub const MAX_ARGS: usize = 256;

/// Capacity of the state scratch stack.
pub const STATE_SCRATCH_CAPACITY: usize = 1024;

/// Capacity of the symbol scratch stack.
pub const SYMBOL_SCRATCH_CAPACITY: usize = 256;

/// A state value: an arm-block address plus owned parameter bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateValue {
    /// Byte offset of the state's first arm.
    pub address: u32,
    /// State-parameter bindings, in declaration order.
    pub children: Vec<StateValue>,
    /// Symbol-parameter bindings, in declaration order.
    pub symbols: Vec<u16>,
}

impl StateValue {
    /// Creates a state value with no parameter bindings.
    #[must_use]
    pub fn leaf(address: u32) -> Self {
        Self {
            address,
            children: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Creates a state value with the given bindings.
    #[must_use]
    pub fn new(address: u32, children: Vec<StateValue>, symbols: Vec<u16>) -> Self {
        Self {
            address,
            children,
            symbols,
        }
    }
}

impl fmt::Display for StateValue {
    /// Renders as `State(0xXXXXXXXX; children; symbols)`, omitting empty
    /// sections.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({:#010x}", self.address)?;
        for (i, child) in self.children.iter().enumerate() {
            if i == 0 {
                write!(f, "; ")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{child}")?;
        }
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i == 0 {
                write!(f, "; ")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{symbol}")?;
        }
        write!(f, ")")
    }
}
