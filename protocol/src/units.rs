//! # Amount Units
//!
//! All custody values are `u64` counts of the smallest unit. One whole unit
//! is [`UNIT`] smallest units ([`AMOUNT_DECIMALS`] decimal places). The
//! ledger never divides, so the decimal point only exists here, at the
//! boundary where humans type numbers in and read them back.

use thiserror::Error;

use crate::config::{AMOUNT_DECIMALS, UNIT};

/// A custody value in smallest units.
pub type Amount = u64;

/// Errors produced while parsing a decimal amount string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    /// Empty input or a lone decimal point.
    #[error("empty amount")]
    Empty,

    /// A character other than digits and a single `.`.
    #[error("malformed amount: {0:?}")]
    Malformed(String),

    /// More fractional digits than the ledger can represent.
    #[error("too many decimal places: {got} (max {max})")]
    TooPrecise {
        /// Fractional digits supplied.
        got: usize,
        /// Maximum supported.
        max: u32,
    },

    /// The value does not fit in a `u64` of smallest units.
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// Parses a decimal string such as `"1"`, `"0.5"` or `"12.00000001"` into
/// smallest units.
pub fn parse_units(input: &str) -> Result<Amount, UnitsError> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::Malformed(input.to_string()));
    }
    if frac.len() > AMOUNT_DECIMALS as usize {
        return Err(UnitsError::TooPrecise {
            got: frac.len(),
            max: AMOUNT_DECIMALS,
        });
    }

    let out_of_range = || UnitsError::OutOfRange(input.to_string());

    let whole_units: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range())?
    };

    // Right-pad the fraction to exactly AMOUNT_DECIMALS digits.
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = AMOUNT_DECIMALS as usize);
        padded.parse().map_err(|_| out_of_range())?
    };

    whole_units
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(frac_units))
        .ok_or_else(out_of_range)
}

/// Formats smallest units as a decimal string with trailing zeros trimmed.
pub fn format_units(amount: Amount) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = AMOUNT_DECIMALS as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
