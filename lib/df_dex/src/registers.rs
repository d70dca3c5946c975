//! Types definitions to address Dalvik registers.
//!
//! In Dalvik bytecode, registers (or register pairs) are addressed either on 4, 8 or 16 bits.
//! The [register](Reg) wrapper over a 16 bits integer keeps registers apart from literal
//! operands in instruction definitions.
//!
//! Invocation arguments come either as an explicit [list](RegList) or as a
//! [range](RegRange) of consecutive slots; both expose the same register iterator.

use serde::Deserialize;
use std::fmt;

/// The register type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Reg(u16);

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u8> for Reg {
    fn from(r: u8) -> Self {
        Self(u16::from(r))
    }
}

impl From<u16> for Reg {
    fn from(r: u16) -> Self {
        Self(r)
    }
}

impl From<Reg> for u16 {
    fn from(r: Reg) -> Self {
        r.0
    }
}

impl Reg {
    /// Returns the wrapped register slot number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns the following register, second half of a register pair.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// An explicit list of registers, used for methods parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RegList(Vec<Reg>);

impl fmt::Display for RegList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, reg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{reg}")?;
        }
        write!(f, "}}")
    }
}

impl<T> From<Vec<T>> for RegList
where
    Reg: From<T>,
{
    fn from(args: Vec<T>) -> Self {
        Self(args.into_iter().map(Reg::from).collect())
    }
}

impl RegList {
    /// Checks if the list contains no register.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a new iterator over the registers list.
    pub fn iter(&self) -> impl Iterator<Item = Reg> + '_ {
        self.0.iter().copied()
    }
}

/// A range of consecutive register slots, possibly empty.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RegRange {
    first: Reg,
    count: u16,
}

impl fmt::Display for RegRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.count == 0 {
            write!(f, "{{}}")
        } else {
            write!(
                f,
                "{{{} .. v{}}}",
                self.first,
                self.first.0.saturating_add(self.count - 1)
            )
        }
    }
}

impl RegRange {
    #[must_use]
    pub const fn new(first: Reg, count: u16) -> Self {
        Self { first, count }
    }

    /// Returns the first register of the range.
    #[inline]
    #[must_use]
    pub const fn first(&self) -> Reg {
        self.first
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count as usize
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns a new iterator over the register range. Slots past `v65535`
    /// are dropped.
    pub fn iter(&self) -> impl Iterator<Item = Reg> {
        let first = self.first.0;
        (0..self.count).map_while(move |i| first.checked_add(i).map(Reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_iteration() {
        let range = RegRange::new(Reg::from(4u16), 3);
        let regs: Vec<u16> = range.iter().map(Reg::value).collect();
        assert_eq!(regs, vec![4, 5, 6]);
        assert_eq!(format!("{range}"), "{v4 .. v6}");
        assert!(RegRange::new(Reg::from(2u16), 0).iter().next().is_none());
    }

    #[test]
    fn range_at_last_slot() {
        let range: RegRange = serde_json::from_str(r#"{"first": 65535, "count": 2}"#).unwrap();
        let regs: Vec<u16> = range.iter().map(Reg::value).collect();
        assert_eq!(regs, vec![65535]);
        assert_eq!(format!("{range}"), "{v65535 .. v65535}");
        assert_eq!(Reg::from(u16::MAX).next().value(), u16::MAX);
    }

    #[test]
    fn list_display() {
        let list = RegList::from(vec![1u16, 3u16]);
        assert_eq!(format!("{list}"), "{v1, v3}");
        assert_eq!(list.len(), 2);
    }
}
