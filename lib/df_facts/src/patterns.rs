//! Multi-instruction idioms state.
//!
//! Dalvik splits some operations over several instructions. Idioms whose
//! halves are linked by an offset (`fill-array-data` and switches pointing to
//! their payloads) go through a [`PatternManager`] keyed by the payload
//! address. Idioms of adjacent instructions (invoke then `move-result`, zero
//! constant then `new-array`) use the one-shot slots of [`CarryOver`].

use df_dex::registers::Reg;
use df_dex::Addr;
use log::error;
use std::collections::BTreeMap;

/// First halves of offset-linked idioms waiting for the instruction at their
/// target address.
#[derive(Debug)]
pub struct PatternManager<T> {
    pending: BTreeMap<Addr, Vec<T>>,
}

impl<T> Default for PatternManager<T> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }
}

impl<T> PatternManager<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: Addr, entry: T) {
        self.pending.entry(target).or_default().push(entry);
    }

    /// Removes and returns every entry waiting for `target`, in registration
    /// order. Several instructions may share one payload.
    pub fn take(&mut self, target: Addr) -> Vec<T> {
        self.pending.remove(&target).unwrap_or_default()
    }

    #[must_use]
    pub fn residual(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Logs entries never consumed and returns their number.
    pub fn check_everything_consumed(&self, what: &str, method: &str) -> usize {
        let residual = self.residual();
        if residual > 0 {
            let addrs: Vec<String> = self.pending.keys().map(ToString::to_string).collect();
            error!(
                "{method}: {residual} residual {what} entries (payload addresses {})",
                addrs.join(", ")
            );
        }
        residual
    }
}

/// Producer of a value retrieved by the `move-result` that must follow it.
#[derive(Debug, Clone)]
pub enum ResultProducer {
    /// A method invocation, by instruction id.
    Invoke { insn: String },
    /// A `filled-new-array`, with the array type and element registers.
    FilledArray { array_type: String, elements: Vec<Reg> },
}

#[derive(Debug, Clone)]
pub struct PendingResult {
    pub index: usize,
    pub producer: ResultProducer,
}

#[derive(Debug, Clone, Copy)]
pub struct ZeroedRegister {
    pub index: usize,
    pub reg: Reg,
}

#[derive(Debug, Clone)]
pub struct NewArrayInfo {
    pub index: usize,
    pub heap: String,
}

/// Pending `fill-array-data`, keyed by its payload address.
#[derive(Debug, Clone)]
pub struct FillArrayEntry {
    pub reg: Reg,
    pub index: usize,
    pub new_array: NewArrayInfo,
}

/// Pending switch, keyed by its payload address. Targets in the payload are
/// relative to the switch address.
#[derive(Debug, Clone)]
pub struct SwitchEntry {
    pub addr: Addr,
    pub index: usize,
}

/// One-shot state carried between instructions of one method.
///
/// Every slot is consumed (taken) on read.
#[derive(Debug, Default)]
pub struct CarryOver {
    result: Option<PendingResult>,
    zeroed: Option<ZeroedRegister>,
    new_array: Option<NewArrayInfo>,
}

impl CarryOver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn produce_result(&mut self, index: usize, producer: ResultProducer) {
        self.result = Some(PendingResult { index, producer });
    }

    pub fn take_result(&mut self) -> Option<PendingResult> {
        self.result.take()
    }

    /// Records a narrow constant load. A zero literal arms the zeroed
    /// register, any other literal disarms it if it targets the same register.
    pub fn narrow_constant(&mut self, index: usize, reg: Reg, literal: i64) {
        if literal == 0 {
            self.zeroed = Some(ZeroedRegister { index, reg });
        } else if matches!(self.zeroed, Some(z) if z.reg == reg) {
            self.zeroed = None;
        }
    }

    /// Checks if the size register of the `new-array` at `index` was just set
    /// to zero. The zeroed register is consumed either way.
    pub fn take_zero_size(&mut self, index: usize, size_reg: Reg) -> bool {
        matches!(
            self.zeroed.take(),
            Some(z) if z.reg == size_reg && z.index + 1 == index
        )
    }

    pub fn set_new_array(&mut self, info: NewArrayInfo) {
        self.new_array = Some(info);
    }

    pub fn take_new_array(&mut self) -> Option<NewArrayInfo> {
        self.new_array.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_take_once() {
        let mut manager = PatternManager::new();
        manager.register(Addr(12), "a");
        manager.register(Addr(20), "b");
        assert_eq!(manager.take(Addr(12)), vec!["a"]);
        assert!(manager.take(Addr(12)).is_empty());
        assert_eq!(manager.residual(), 1);
        assert_eq!(manager.check_everything_consumed("switch", "m"), 1);
    }

    #[test]
    fn manager_shared_target() {
        let mut manager = PatternManager::new();
        manager.register(Addr(8), 1);
        manager.register(Addr(8), 2);
        assert_eq!(manager.take(Addr(8)), vec![1, 2]);
        assert_eq!(manager.check_everything_consumed("switch", "m"), 0);
    }

    #[test]
    fn zeroed_register() {
        let mut carry = CarryOver::new();
        carry.narrow_constant(1, Reg::from(0u16), 0);
        assert!(carry.take_zero_size(2, Reg::from(0u16)));
        assert!(!carry.take_zero_size(2, Reg::from(0u16)));

        carry.narrow_constant(1, Reg::from(0u16), 0);
        carry.narrow_constant(2, Reg::from(0u16), 5);
        assert!(!carry.take_zero_size(3, Reg::from(0u16)));

        carry.narrow_constant(1, Reg::from(0u16), 0);
        carry.narrow_constant(2, Reg::from(1u16), 5);
        assert!(!carry.take_zero_size(3, Reg::from(0u16)));

        carry.narrow_constant(4, Reg::from(2u16), 0);
        assert!(!carry.take_zero_size(5, Reg::from(3u16)));
        assert!(!carry.take_zero_size(5, Reg::from(2u16)));
    }
}
