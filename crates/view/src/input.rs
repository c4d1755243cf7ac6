//! Form input validation and human amount <-> base unit conversion.

use crate::Failure;
use alloy_primitives::{
    utils::{format_units, parse_units},
    Address, U256,
};

pub const INVALID_AMOUNT: &str = "Amount must be greater than zero";

/// Parse a 20-byte hex address, with or without `0x`.
///
/// All-lowercase and all-uppercase input is accepted as is; mixed case must
/// be a valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex = input.strip_prefix("0x").unwrap_or(input);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let prefixed = format!("0x{hex}");
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());

    if has_upper && has_lower {
        Address::parse_checksummed(&prefixed, None).ok()
    } else {
        prefixed.parse().ok()
    }
}

pub fn is_valid_address(input: &str) -> bool {
    parse_address(input).is_some()
}

/// Parse an address field, failing with `message` as a validation error.
pub fn require_address(input: &str, message: &str) -> Result<Address, Failure> {
    parse_address(input).ok_or_else(|| Failure::Validation(message.to_string()))
}

/// Split a plain decimal (`12`, `12.5`, `.5`, `12.`) into integer and
/// fraction digits. Signs, exponents and separators are rejected.
fn split_decimal(input: &str) -> Option<(&str, &str)> {
    let (integer, fraction) = input.split_once('.').unwrap_or((input, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    (digits(integer) && digits(fraction)).then_some((integer, fraction))
}

/// Whether `input` is a decimal amount strictly greater than zero.
pub fn is_positive_amount(input: &str) -> bool {
    split_decimal(input.trim()).is_some_and(|(integer, fraction)| {
        integer.bytes().chain(fraction.bytes()).any(|b| b != b'0')
    })
}

/// Check an amount field: present, numeric and positive.
pub fn require_amount(input: &str) -> Result<(), Failure> {
    if is_positive_amount(input) {
        Ok(())
    } else {
        Err(Failure::Validation(INVALID_AMOUNT.to_string()))
    }
}

/// Convert a human amount into base units using `decimals`.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, Failure> {
    let Some((integer, fraction)) = split_decimal(input.trim()) else {
        return Err(Failure::Validation(INVALID_AMOUNT.to_string()));
    };
    if fraction.len() > decimals as usize {
        return Err(Failure::Validation(format!(
            "Amount has more than {decimals} decimal places"
        )));
    }

    let integer = if integer.is_empty() { "0" } else { integer };
    let normalized = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    };

    parse_units(&normalized, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| Failure::Validation(format!("Invalid amount: {e}")))
}

/// Render base units as a human amount, without trailing fractional zeros.
pub fn format_amount(value: U256, decimals: u8) -> Result<String, Failure> {
    let formatted = format_units(value, decimals).map_err(|e| Failure::Unknown(e.to_string()))?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}
