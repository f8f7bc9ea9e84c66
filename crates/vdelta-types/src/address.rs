use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle correlating a stashed node with its later reinsertion or discard.
///
/// Addresses are minted by an [`AddressCounter`] that lives for exactly one
/// diff pass. Two patches may reuse the same address values; within one
/// patch every address is unique.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(u32);

impl Address {
    /// Wrap a raw address value (used by decoders).
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw address value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Monotonic address source scoped to a single diff pass.
#[derive(Debug, Default)]
pub struct AddressCounter {
    next: u32,
}

impl AddressCounter {
    /// Start a fresh counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next address.
    pub fn mint(&mut self) -> Address {
        let address = Address(self.next);
        self.next += 1;
        address
    }

    /// Number of addresses minted so far.
    pub fn minted(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic() {
        let mut counter = AddressCounter::new();
        let a = counter.mint();
        let b = counter.mint();
        let c = counter.mint();
        assert!(a < b && b < c);
        assert_eq!(counter.minted(), 3);
    }

    #[test]
    fn fresh_counters_restart_at_zero() {
        let mut first = AddressCounter::new();
        first.mint();
        first.mint();
        let mut second = AddressCounter::new();
        assert_eq!(second.mint(), Address::new(0));
    }

    #[test]
    fn display_and_debug() {
        let addr = Address::new(7);
        assert_eq!(addr.to_string(), "@7");
        assert_eq!(format!("{addr:?}"), "Address(7)");
        assert_eq!(addr.get(), 7);
    }
}
