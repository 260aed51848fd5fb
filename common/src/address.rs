use std::fmt::{Display, Formatter};

use alloy::primitives::Address;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("address pattern is valid"));

/// A `0x`-prefixed, 40 hex digit account address, always stored lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalAddress(String);

impl CanonicalAddress {
    pub fn parse(s: &str) -> crate::Result<Self> {
        if is_canonical(s) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(crate::Error::InvalidAddress(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `s` has the shape of an address, in any letter case.
pub fn is_canonical(s: &str) -> bool {
    ADDRESS_PATTERN.is_match(s)
}

impl From<Address> for CanonicalAddress {
    fn from(address: Address) -> Self {
        Self(address.to_string().to_lowercase())
    }
}

impl Display for CanonicalAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
