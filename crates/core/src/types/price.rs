//! Type-safe price representation using decimal arithmetic.
//!
//! The shop only sells in US dollars, so a price is a bare non-negative
//! amount. The Product API exchanges prices as JSON numbers; a missing price
//! is treated as zero.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when constructing or parsing a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative USD amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a dollar amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The dollar amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero (the admin form treats that as "not entered").
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for Price {
    type Err = PriceError;

    /// Parse user input such as `36.99`, `$36.99` or `1,299.00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let amount =
            Decimal::from_str(&cleaned).map_err(|_| PriceError::Invalid(s.trim().to_string()))?;
        Self::new(amount)
    }
}

/// Formats as US currency, e.g. `$1,234.50`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let text = format!("{:.2}", rounded.abs());
        let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        write!(f, "{sign}${grouped}.{cents}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_usd() {
        assert_eq!(Price::from_cents(3699).to_string(), "$36.99");
        assert_eq!(Price::from_cents(0).to_string(), "$0.00");
        assert_eq!(Price::from_cents(123_450).to_string(), "$1,234.50");
        assert_eq!(Price::from_cents(100_000_000).to_string(), "$1,000,000.00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(10_005, 3)).unwrap();
        assert_eq!(price.to_string(), "$10.01");
    }

    #[test]
    fn test_display_groups_digits_of_negative_api_amount() {
        // Deserialization does not enforce the sign
        let price: Price = serde_json::from_str("-1500").unwrap();
        assert_eq!(price.to_string(), "-$1,500.00");

        let price: Price = serde_json::from_str("-0.001").unwrap();
        assert_eq!(price.to_string(), "$0.00");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(Decimal::new(-1, 2)), Err(PriceError::Negative));
        assert_eq!("-5".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_accepts_currency_input() {
        assert_eq!("$1,299.00".parse::<Price>().unwrap(), Price::from_cents(129_900));
        assert_eq!(" 36.99 ".parse::<Price>().unwrap(), Price::from_cents(3699));
        assert!(matches!("abc".parse::<Price>(), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_serde_uses_json_numbers() {
        let json = serde_json::to_string(&Price::from_cents(2999)).unwrap();
        assert_eq!(json, "29.99");

        let from_number: Price = serde_json::from_str("36.99").unwrap();
        assert_eq!(from_number, Price::from_cents(3699));

        let from_string: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(from_string, Price::from_cents(1250));
    }
}
