//! Quantity parsing and display of native-currency amounts.

use crate::error::WalletError;

/// Parses an EIP-1474 hex quantity (`0x1bc16d674ec80000`) or a plain decimal string.
pub fn parse_quantity(s: &str) -> Result<u128, WalletError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => Ok(0),
        Some(hex) => u128::from_str_radix(hex, 16),
        None => s.parse::<u128>(),
    };
    parsed.map_err(|e| WalletError::Decode(format!("bad quantity {s:?}: {e}")))
}

/// Renders `amount` smallest units as a decimal string with `precision` fractional digits.
/// Extra digits are truncated, not rounded.
pub fn format_units(amount: u128, decimals: u32, precision: u32) -> String {
    let Some(unit) = 10u128.checked_pow(decimals) else {
        return amount.to_string();
    };
    let whole = amount / unit;
    if precision == 0 {
        return whole.to_string();
    }
    let frac = amount % unit;
    let shown = if precision <= decimals {
        frac / 10u128.pow(decimals - precision)
    } else {
        // decimals < precision here, so the scale stays under 10^precision.
        match 10u128.checked_pow(precision - decimals) {
            Some(scale) => frac * scale,
            None => 0,
        }
    };
    let width = usize::try_from(precision).unwrap_or(usize::MAX);
    format!("{whole}.{shown:0width$}")
}
