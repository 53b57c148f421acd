//! # Protocol Configuration & Constants
//!
//! Every magic number in Lockbox lives here. Runtime knobs (the ones an
//! operator may flip per deployment) live in `lockbox_contracts::config`
//! instead; these are the values that define the ledger itself.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the ledger format.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Number of decimal places in one whole unit of custody value.
/// 8 decimals, same as Bitcoin. We're not reinventing this wheel.
pub const AMOUNT_DECIMALS: u32 = 8;

/// Smallest units per whole unit. Keep in sync with [`AMOUNT_DECIMALS`].
pub const UNIT: u64 = 100_000_000;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Id assigned to the very first deposit (and its receipt token).
pub const FIRST_DEPOSIT_ID: u64 = 0;

/// Default collection name for receipt tokens.
pub const DEFAULT_RECEIPT_NAME: &str = "Time-Locked Deposit";

/// Default ticker symbol for receipt tokens.
pub const DEFAULT_RECEIPT_SYMBOL: &str = "TLD";

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Length of an [`Address`](crate::identity::Address) in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Domain-separation context for label-derived addresses. Changing this
/// changes every address the CLI derives from a label.
pub const ADDRESS_DERIVATION_CONTEXT: &str = "lockbox 2026 address-from-label v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_matches_decimals() {
        assert_eq!(UNIT, 10u64.pow(AMOUNT_DECIMALS));
    }

    #[test]
    fn test_receipt_metadata_non_empty() {
        assert!(!DEFAULT_RECEIPT_NAME.is_empty());
        assert!(!DEFAULT_RECEIPT_SYMBOL.is_empty());
    }
}
