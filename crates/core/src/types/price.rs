//! Type-safe price representation using decimal arithmetic.
//!
//! The showroom API transmits prices as decimal strings ("249999.00") to
//! preserve precision; `Price` parses them into `rust_decimal` and owns the
//! storefront display format (whole dollars with thousands separators).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a price from its wire representation.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("invalid decimal amount: {0}")]
    InvalidAmount(String),
}

/// A price in the currency's standard unit (dollars, not cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Parse a price from the API's decimal-string representation.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::InvalidAmount` if the string is not a decimal.
    pub fn parse(amount: &str) -> Result<Self, PriceError> {
        amount
            .trim()
            .parse::<Decimal>()
            .map(Self)
            .map_err(|_| PriceError::InvalidAmount(amount.to_string()))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Format for display as whole dollars with thousands separators,
    /// e.g. `$249,999`.
    #[must_use]
    pub fn display_whole(&self) -> String {
        let rounded = self.0.round();
        let digits = rounded.abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i).is_multiple_of(3) {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.is_negative() {
            format!("-${grouped}")
        } else {
            format!("${grouped}")
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_whole())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let price = Price::parse("249999.00").expect("valid price");
        assert_eq!(price.display_whole(), "$249,999");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Price::parse("not-a-price").is_err());
        assert!(Price::parse("").is_err());
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::parse("0").expect("zero").display_whole(), "$0");
        assert_eq!(Price::parse("999").expect("price").display_whole(), "$999");
        assert_eq!(
            Price::parse("1000").expect("price").display_whole(),
            "$1,000"
        );
    }

    #[test]
    fn test_display_rounds_cents() {
        assert_eq!(
            Price::parse("68000.49").expect("price").display_whole(),
            "$68,000"
        );
    }

    #[test]
    fn test_negative_detected() {
        let price = Price::parse("-5.00").expect("valid decimal");
        assert!(price.is_negative());
        assert!(!Price::parse("0.00").expect("zero").is_negative());
    }
}
