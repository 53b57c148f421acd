//! # Account Identities
//!
//! An [`Address`] is the only notion of "who" the ledger understands. It is
//! an opaque 20-byte key rendered as `0x` followed by 40 lowercase hex
//! digits, the shape every wallet already knows how to paste.
//!
//! Addresses come from four places:
//!
//! ```text
//! raw bytes           -> Address::from_bytes
//! "0xab12..."         -> "0xab12...".parse::<Address>()
//! "alice"             -> Address::from_label   (BLAKE3 derive_key, truncated)
//! thin air            -> Address::random
//! ```
//!
//! Label derivation is deterministic, which is what lets the CLI and scripted
//! sessions refer to `alice` and `bob` instead of hex blobs.
//!
//! There is no signature scheme here. Callers assert their identity; the
//! ledger checks whether that identity is *allowed*, not whether it is
//! *authentic*. Authentication belongs to whatever transport sits in front.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ADDRESS_DERIVATION_CONTEXT, ADDRESS_LENGTH};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string is not valid hexadecimal.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded bytes have the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An opaque account identity.
///
/// `Copy`, hashable, and totally ordered so it can key `HashMap`s and
/// `BTreeMap`s alike. Serializes as its `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Derives a stable address from a human-readable label.
    ///
    /// Uses BLAKE3 in key-derivation mode with a fixed context string, then
    /// keeps the first 20 bytes. Same label, same address, on every machine.
    pub fn from_label(label: &str) -> Self {
        let key = blake3::derive_key(ADDRESS_DERIVATION_CONTEXT, label.as_bytes());
        Self::truncate(&key)
    }

    /// Derives an address for a component from a domain tag and a seed.
    ///
    /// Used to give system components (the vault, for example) an identity
    /// that depends only on how they were constructed.
    pub fn derive(domain: &str, seed: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(seed);
        Self::truncate(hasher.finalize().as_bytes())
    }

    /// Draws a uniformly random address.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// A short form for log lines: `0xab12cd…ef90`.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..6], &full[full.len() - 4..])
    }

    fn truncate(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[..ADDRESS_LENGTH]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let raw = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; ADDRESS_LENGTH] =
            raw.as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_LENGTH,
                    got: raw.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_derivation_is_deterministic() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }

    #[test]
    fn derive_separates_domains() {
        let seed = b"same seed";
        assert_ne!(Address::derive("vault", seed), Address::derive("issuer", seed));
    }

    #[test]
    fn hex_round_trip() {
        let addr = Address::from_label("carol");
        let parsed: Address = addr.to_hex().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn parse_accepts_missing_prefix() {
        let addr = Address::from_label("dave");
        let bare = hex::encode(addr.as_bytes());
        assert_eq!(bare.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0xabcd".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: 2
            }
        );
    }

    #[test]
    fn parse_rejects_non_hex() {
        let err = "0xzz".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidHex(_)));
    }

    #[test]
    fn serializes_as_hex_string() {
        let addr = Address::from_label("erin");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn random_addresses_differ() {
        assert_ne!(Address::random(), Address::random());
    }

    #[test]
    fn short_form_is_abbreviated() {
        let addr = Address::from_label("frank");
        let short = addr.short();
        assert!(short.starts_with("0x"));
        assert!(short.len() < addr.to_hex().len());
    }
}
