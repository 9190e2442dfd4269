// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes resource quantity parsing and comparison.
//!
//! Quantities are compared by value, never as strings: `1` equals `1000m`,
//! `1Gi` is larger than `1G`. The grammar follows the API machinery:
//!
//! ```text
//! <quantity> ::= <signedNumber><suffix>
//! <suffix>   ::= <binarySI> | <decimalExponent> | <decimalSI>
//! <binarySI> ::= Ki | Mi | Gi | Ti | Pi | Ei
//! <decimalSI> ::= n | u | m | "" | k | M | G | T | P | E
//! <decimalExponent> ::= "e" <signedNumber> | "E" <signedNumber>
//! ```
//!
//! Values are held as nano-units in an `i128`; anything finer than one nano-unit
//! is rounded up, the same rounding the API server applies.

use std::fmt;
use std::str::FromStr;

/// Number of decimal digits below one unit kept by [`Quantity`]
const NANO_DIGITS: i32 = 9;

/// Largest power of ten that fits in an `i128`
const MAX_POW10: u32 = 38;

/// Errors produced while parsing a quantity string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid quantity {0:?}")]
    Invalid(String),

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

/// A parsed resource quantity, ordered by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    nanos: i128,
}

impl Quantity {
    /// Value expressed in nano-units.
    #[must_use]
    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}n", self.nanos)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_quantity(s)
    }
}

enum Scale {
    Decimal(i32),
    Binary(u32),
}

/// Parse a Kubernetes quantity string.
///
/// # Errors
///
/// Returns [`QuantityError`] when the string is empty, does not follow the
/// quantity grammar, or does not fit in the internal representation.
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }
    let invalid = || QuantityError::Invalid(input.to_string());
    let out_of_range = || QuantityError::OutOfRange(input.to_string());

    let (negative, rest) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let number_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (number, suffix) = rest.split_at(number_len);

    let (int_digits, frac_digits) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if frac_digits.contains('.') || (int_digits.is_empty() && frac_digits.is_empty()) {
        return Err(invalid());
    }

    let mut mantissa: i128 = 0;
    for digit in int_digits.bytes().chain(frac_digits.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(digit - b'0')))
            .ok_or_else(out_of_range)?;
    }

    let scale = parse_suffix(suffix).ok_or_else(invalid)?;
    let frac_len = i32::try_from(frac_digits.len()).map_err(|_| out_of_range())?;

    let (numerator, exp10) = match scale {
        Scale::Decimal(exp) => (mantissa, exp),
        Scale::Binary(pow) => (
            mantissa
                .checked_mul(1_i128 << pow)
                .ok_or_else(out_of_range)?,
            0,
        ),
    };

    let exp10 = exp10
        .checked_sub(frac_len)
        .and_then(|e| e.checked_add(NANO_DIGITS))
        .ok_or_else(out_of_range)?;

    let magnitude = if exp10 >= 0 {
        let factor = pow10(exp10.unsigned_abs()).ok_or_else(out_of_range)?;
        numerator.checked_mul(factor).ok_or_else(out_of_range)?
    } else {
        match pow10(exp10.unsigned_abs()) {
            Some(divisor) => ceil_div(numerator, divisor),
            None => i128::from(numerator > 0),
        }
    };

    Ok(Quantity {
        nanos: if negative { -magnitude } else { magnitude },
    })
}

fn parse_suffix(suffix: &str) -> Option<Scale> {
    let scale = match suffix {
        "" => Scale::Decimal(0),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        "Ki" => Scale::Binary(10),
        "Mi" => Scale::Binary(20),
        "Gi" => Scale::Binary(30),
        "Ti" => Scale::Binary(40),
        "Pi" => Scale::Binary(50),
        "Ei" => Scale::Binary(60),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Scale::Decimal(exponent.parse().ok()?)
        }
    };
    Some(scale)
}

fn pow10(exp: u32) -> Option<i128> {
    if exp > MAX_POW10 {
        return None;
    }
    10_i128.checked_pow(exp)
}

fn ceil_div(numerator: i128, divisor: i128) -> i128 {
    let quotient = numerator / divisor;
    if numerator % divisor == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Returns `true` when `value` does not exceed `max`.
///
/// # Errors
///
/// Returns [`QuantityError`] when either side fails to parse.
pub fn quantity_le(value: &str, max: &str) -> Result<bool, QuantityError> {
    Ok(parse_quantity(value)? <= parse_quantity(max)?)
}

#[cfg(test)]
#[path = "quantity_tests.rs"]
mod quantity_tests;
