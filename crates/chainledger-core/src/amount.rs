//! Raw integer amounts → decimal quantities.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ClassifyError;

/// Significant digits a `Decimal` always holds without overflow.
const MAX_DIGITS: usize = 28;

/// Scale a raw on-chain integer by `10^decimals`.
///
/// Exact whenever the result fits in 28 significant digits. Beyond that the
/// least significant fractional digits are truncated; an integer part wider
/// than 28 digits is an [`ClassifyError::AmountOverflow`].
pub fn format_units(raw: U256, decimals: u8) -> Result<Decimal, ClassifyError> {
    let digits = raw.to_string();
    let scale = decimals as usize;

    let (int_part, frac_part) = if digits.len() > scale {
        let (i, f) = digits.split_at(digits.len() - scale);
        (i.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>scale$}"))
    };

    let int_part = int_part.trim_start_matches('0');
    if int_part.len() > MAX_DIGITS {
        return Err(ClassifyError::AmountOverflow { raw: digits, decimals });
    }

    // Leading fractional zeros of a sub-unit amount don't count against
    // precision, but they do count against the 28-place scale limit.
    let budget = if int_part.is_empty() {
        MAX_DIGITS
    } else {
        MAX_DIGITS - int_part.len()
    };
    let frac = &frac_part[..frac_part.len().min(budget)];
    let frac = frac.trim_end_matches('0');

    let text = match (int_part.is_empty(), frac.is_empty()) {
        (true, true) => "0".to_string(),
        (true, false) => format!("0.{frac}"),
        (false, true) => int_part.to_string(),
        (false, false) => format!("{int_part}.{frac}"),
    };
    Decimal::from_str(&text).map_err(|_| ClassifyError::AmountOverflow { raw: digits, decimals })
}

/// Relative closeness: `|a - b| <= |b| * tolerance`.
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= b.abs() * tolerance
}
