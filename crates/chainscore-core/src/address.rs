//! Account addresses.
//!
//! An address is 20 bytes written as `0x` followed by exactly 40 hex digits, either case.
//! The canonical text form is lower-case.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "0x";
const HEX_DIGITS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must have 40 hex digits, got {0}")]
    BadLength(usize),
    #[error("address contains a non-hex character")]
    NonHex,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Literal pattern check: `^0x[0-9a-fA-F]{40}$`. No trimming, no `0X`.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let digits = s.strip_prefix(PREFIX).ok_or(AddressError::MissingPrefix)?;
        if digits.len() != HEX_DIGITS {
            return Err(AddressError::BadLength(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::NonHex);
        }
        let mut out = [0u8; 20];
        hex::decode_to_slice(digits, &mut out).map_err(|_| AddressError::NonHex)?;
        Ok(Self(out))
    }

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lower-case `0x…` form.
    pub fn to_canonical(&self) -> String {
        format!("{PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_canonical())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_case_and_canonicalizes() {
        let a = Address::parse("0xC2Dd389015255B31c58F47bd421b1510bbD15860").unwrap();
        assert_eq!(a.to_canonical(), "0xc2dd389015255b31c58f47bd421b1510bbd15860");
        assert_eq!(a, "0xc2dd389015255b31c58f47bd421b1510bbd15860".parse().unwrap());
    }

    #[test]
    fn rejects_everything_outside_the_pattern() {
        let zeros = |n: usize| "0".repeat(n);
        let cases = [
            (String::new(), AddressError::MissingPrefix),
            ("not-an-address".to_string(), AddressError::MissingPrefix),
            (format!("0X{}aa", zeros(38)), AddressError::MissingPrefix),
            (format!(" 0x{}aa", zeros(38)), AddressError::MissingPrefix),
            ("0x".to_string(), AddressError::BadLength(0)),
            (format!("0x{}a", zeros(38)), AddressError::BadLength(39)),
            (format!("0x{}aaa", zeros(38)), AddressError::BadLength(41)),
            (format!("0x{}ag", zeros(38)), AddressError::NonHex),
            (format!("0x{}a ", zeros(38)), AddressError::NonHex),
        ];
        for (input, expected) in cases {
            assert_eq!(Address::parse(&input), Err(expected), "input {input:?}");
            assert!(!Address::is_valid(&input));
        }
    }

    #[test]
    fn every_hex_digit_is_accepted_in_every_position() {
        for c in "0123456789abcdefABCDEF".chars() {
            let s = format!("0x{}", c.to_string().repeat(40));
            assert!(Address::is_valid(&s), "{s}");
        }
    }

    #[test]
    fn serde_uses_canonical_string() {
        let a = Address::parse("0xABCDEF0000000000000000000000000000000001").unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"0xabcdef0000000000000000000000000000000001\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
