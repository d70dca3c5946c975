//! Method bodies: instruction streams, try blocks and debug information.

use crate::instrs::{Instr, Instruction};
use crate::types::Type;
use crate::Addr;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CodeItem {
    registers_size: u16,
    instructions: Vec<Instr>,
    #[serde(default)]
    tries: Vec<TryBlock>,
    #[serde(default)]
    debug_items: Vec<DebugItem>,
}

impl CodeItem {
    #[must_use]
    pub fn new(
        registers_size: u16,
        instructions: Vec<Instr>,
        tries: Vec<TryBlock>,
        debug_items: Vec<DebugItem>,
    ) -> Self {
        Self {
            registers_size,
            instructions,
            tries,
            debug_items,
        }
    }

    #[inline]
    #[must_use]
    pub const fn registers_size(&self) -> u16 {
        self.registers_size
    }

    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[Instr] {
        &self.instructions
    }

    #[inline]
    #[must_use]
    pub fn tries(&self) -> &[TryBlock] {
        &self.tries
    }

    #[inline]
    #[must_use]
    pub fn debug_items(&self) -> &[DebugItem] {
        &self.debug_items
    }

    /// Returns the address of the first instruction.
    ///
    /// This is the entry address unless a non-zero prologue end marker moves it.
    #[must_use]
    pub fn start_addr(&self) -> Addr {
        self.debug_items
            .iter()
            .filter_map(|item| match item {
                DebugItem::PrologueEnd { addr } if addr.0 != 0 => Some(*addr),
                _ => None,
            })
            .last()
            .unwrap_or_else(Addr::entry)
    }

    /// Iterates over instructions with their 1-based index and address.
    pub fn iter_labeled(&self) -> impl Iterator<Item = LabeledInstr<'_>> {
        let mut addr = self.start_addr();
        self.instructions
            .iter()
            .enumerate()
            .map(move |(i, instr)| {
                let labeled = LabeledInstr {
                    index: i + 1,
                    addr,
                    instr,
                };
                addr = addr.advance(instr.size());
                labeled
            })
    }

    /// Returns the address just past the last instruction.
    #[must_use]
    pub fn end_addr(&self) -> Addr {
        self.instructions
            .iter()
            .fold(self.start_addr(), |addr, instr| addr.advance(instr.size()))
    }
}

/// An instruction with its position in the method body.
#[derive(Debug, Clone, Copy)]
pub struct LabeledInstr<'a> {
    index: usize,
    addr: Addr,
    instr: &'a Instr,
}

impl<'a> LabeledInstr<'a> {
    /// Dense 1-based position in the stream.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    #[must_use]
    pub const fn instr(&self) -> &'a Instr {
        self.instr
    }

    #[inline]
    #[must_use]
    pub fn next_addr(&self) -> Addr {
        self.addr.advance(self.instr.size())
    }
}

/// A region of code covered by exception handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct TryBlock {
    start_addr: Addr,
    insn_count: usize,
    handlers: Vec<CatchHandler>,
}

impl TryBlock {
    #[must_use]
    pub const fn new(start_addr: Addr, insn_count: usize, handlers: Vec<CatchHandler>) -> Self {
        Self {
            start_addr,
            insn_count,
            handlers,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start_addr(&self) -> Addr {
        self.start_addr
    }

    /// Returns the address just past the covered region.
    #[inline]
    #[must_use]
    pub const fn end_addr(&self) -> Addr {
        self.start_addr.advance(self.insn_count)
    }

    #[inline]
    #[must_use]
    pub fn handlers(&self) -> &[CatchHandler] {
        &self.handlers
    }
}

/// A handler of a try block; no exception type means catch-all.
#[derive(Debug, Clone, Deserialize)]
pub struct CatchHandler {
    #[serde(default)]
    exception_type: Option<Type>,
    addr: Addr,
}

impl CatchHandler {
    #[must_use]
    pub const fn new(exception_type: Option<Type>, addr: Addr) -> Self {
        Self {
            exception_type,
            addr,
        }
    }

    #[inline]
    #[must_use]
    pub const fn exception_type(&self) -> Option<&Type> {
        self.exception_type.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn addr(&self) -> Addr {
        self.addr
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DebugItem {
    LineNumber {
        addr: Addr,
        line: u32,
    },
    PrologueEnd {
        addr: Addr,
    },
    EpilogueBegin {
        addr: Addr,
    },
    StartLocal {
        addr: Addr,
        register: u16,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "type")]
        type_: Option<Type>,
    },
    EndLocal {
        addr: Addr,
        register: u16,
    },
    RestartLocal {
        addr: Addr,
        register: u16,
    },
    SetSourceFile {
        addr: Addr,
        #[serde(default)]
        name: Option<String>,
    },
}
