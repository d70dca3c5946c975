//! Code addresses to instruction indices resolution.
//!
//! Branches are decoded before their target may have been visited, so edges
//! are queued with their absolute target address and resolved once the whole
//! method has been mapped.

use crate::relations::Relation;
use crate::sink::FactSink;
use df_dex::Addr;
use log::warn;
use std::collections::BTreeMap;

/// A control-flow edge waiting for its target index.
#[derive(Debug, Clone)]
pub struct PendingEdge {
    relation: Relation,
    insn: String,
    index: usize,
    key: Option<i32>,
    target: Option<Addr>,
}

impl PendingEdge {
    /// An edge of a `goto` or `if` instruction.
    #[must_use]
    pub fn branch(relation: Relation, insn: String, index: usize, target: Option<Addr>) -> Self {
        Self {
            relation,
            insn,
            index,
            key: None,
            target,
        }
    }

    /// One case of a switch, found in its payload.
    #[must_use]
    pub fn switch_case(
        relation: Relation,
        insn: String,
        index: usize,
        key: i32,
        target: Option<Addr>,
    ) -> Self {
        Self {
            relation,
            insn,
            index,
            key: Some(key),
            target,
        }
    }
}

/// Address to index map of one method, with its queued edges.
#[derive(Debug, Default)]
pub struct AddressMap {
    indices: BTreeMap<Addr, usize>,
    edges: Vec<PendingEdge>,
}

impl AddressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, addr: Addr, index: usize) {
        self.indices.insert(addr, index);
    }

    #[must_use]
    pub fn index_of(&self, addr: Addr) -> Option<usize> {
        self.indices.get(&addr).copied()
    }

    pub fn queue(&mut self, edge: PendingEdge) {
        self.edges.push(edge);
    }

    /// Writes the address map, then every queued edge whose target is a known
    /// instruction start. Returns the number of edges left unresolved.
    pub fn resolve_and_write(&mut self, sink: &dyn FactSink, method: &str) -> usize {
        for (addr, index) in &self.indices {
            sink.add(
                Relation::DexInstructionAddressMap,
                &[method, &index.to_string(), &addr.to_string()],
            );
        }

        let mut unresolved = 0;
        for edge in self.edges.drain(..) {
            let Some(target) = edge.target.and_then(|addr| self.indices.get(&addr)) else {
                warn!(
                    "cannot resolve {} target of instruction {} in method {method}",
                    edge.relation.name(),
                    edge.index
                );
                unresolved += 1;
                continue;
            };
            let target = target.to_string();
            match edge.key {
                None => sink.add(
                    edge.relation,
                    &[&edge.insn, &edge.index.to_string(), &target, method],
                ),
                Some(key) => sink.add(edge.relation, &[&edge.insn, &key.to_string(), &target]),
            }
        }
        unresolved
    }
}
