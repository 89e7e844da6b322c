use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Represent address in the inferior process space.
/// Zero value is reserved as an "invalid/unset" address.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Address(u64);

impl Address {
    pub const INVALID: Address = Address(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Parse address from a hex string, `0x` prefix is optional.
    /// Returns [`Address::INVALID`] if string is not a hex number.
    pub fn parse(s: &str) -> Address {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u64::from_str_radix(digits, 16)
            .map(Address)
            .unwrap_or(Address::INVALID)
    }
}

impl FromStr for Address {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Address::parse(s))
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Address(addr)
    }
}

impl From<usize> for Address {
    fn from(addr: usize) -> Self {
        Address(addr as u64)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("{:#016X}", self.0))
    }
}

/// Half-open `[from, to)` range of addresses.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Default)]
pub struct AddressRange {
    pub from: Address,
    pub to: Address,
}

impl AddressRange {
    pub fn new(from: impl Into<Address>, to: impl Into<Address>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.from && addr < self.to
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}
