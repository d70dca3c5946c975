//! Code address representation.
//!
//! Addresses count 16-bit code units from the start of a method body.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Addr(pub usize);

impl Addr {
    #[inline]
    #[must_use]
    pub const fn entry() -> Self {
        Self(0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Addr {
    /// Computes the target of a branch located at `base_addr`.
    ///
    /// Returns `None` when a negative offset would go before the method entry,
    /// such a branch has no valid target.
    #[must_use]
    pub const fn from_offset(base_addr: Self, offset: i32) -> Option<Self> {
        if offset.is_negative() {
            match base_addr.0.checked_sub(offset.unsigned_abs() as usize) {
                Some(a) => Some(Self(a)),
                None => None,
            }
        } else {
            Some(Self(base_addr.0 + offset.unsigned_abs() as usize))
        }
    }

    #[must_use]
    pub const fn offset(self, offset: i32) -> Option<Self> {
        Self::from_offset(self, offset)
    }

    /// Returns the address following an instruction of `size` code units.
    #[inline]
    #[must_use]
    pub const fn advance(self, size: usize) -> Self {
        Self(self.0 + size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_and_backward_offsets() {
        assert_eq!(Addr(10).offset(4), Some(Addr(14)));
        assert_eq!(Addr(10).offset(-10), Some(Addr(0)));
        assert_eq!(Addr(10).offset(-11), None);
        assert_eq!(Addr::entry().advance(3), Addr(3));
    }
}
