//! Money value object and the centralized supported-currency set.
//!
//! Amounts are stored as integer minor units (kopecks, cents) and converted
//! to/from the payment provider's two-decimal string representation at the
//! adapter boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Currencies accepted at checkout.
///
/// This enum is the single source of truth for currency validation; adding a
/// currency means adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rub,
    Usd,
    Eur,
}

impl Currency {
    /// All supported currencies.
    pub const SUPPORTED: [Currency; 3] = [Currency::Rub, Currency::Usd, Currency::Eur];

    /// Returns the ISO-4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Parses an ISO-4217 code, case-insensitively.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        match code.to_uppercase().as_str() {
            "RUB" => Ok(Currency::Rub),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(ValidationError::invalid_format(
                "currency",
                format!("unsupported currency code '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A positive monetary amount in a supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    minor_units: i64,
    currency: Currency,
}

impl Money {
    /// Creates a Money from whole major units (e.g. rubles).
    pub fn from_major(major: i64, currency: Currency) -> Result<Self, ValidationError> {
        Self::from_minor_units(major * 100, currency)
    }

    /// Creates a Money from minor units (e.g. kopecks).
    pub fn from_minor_units(minor_units: i64, currency: Currency) -> Result<Self, ValidationError> {
        if minor_units <= 0 {
            return Err(ValidationError::not_positive("amount", minor_units));
        }
        Ok(Self {
            minor_units,
            currency,
        })
    }

    /// Creates a Money from a checkout request amount.
    ///
    /// The amount is expressed in major units and must be positive, finite,
    /// and have at most two decimal places.
    pub fn from_request(amount: f64, currency: Currency) -> Result<Self, ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::not_positive("amount", amount));
        }
        let scaled = amount * 100.0;
        let minor_units = scaled.round();
        if (scaled - minor_units).abs() > 1e-6 {
            return Err(ValidationError::invalid_format(
                "amount",
                "at most two decimal places",
            ));
        }
        Self::from_minor_units(minor_units as i64, currency)
    }

    /// Parses the provider's decimal string (e.g. `"1000.00"`).
    pub fn parse_decimal(value: &str, currency: Currency) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::invalid_format("amount", format!("'{}'", value));

        let (int_part, frac_part) = match value.split_once('.') {
            Some((i, f)) => (i, f),
            None => (value, ""),
        };
        if int_part.is_empty()
            || frac_part.len() > 2
            || !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let major: i64 = int_part.parse().map_err(|_| invalid())?;
        let mut frac: i64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };
        if frac_part.len() == 1 {
            frac *= 10;
        }

        Self::from_minor_units(major * 100 + frac, currency)
    }

    /// Formats the amount as the provider's two-decimal string.
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.minor_units / 100, self.minor_units % 100)
    }

    /// Returns the amount in minor units.
    pub fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Returns the amount in major units, truncating sub-unit remainder.
    pub fn major_units(&self) -> i64 {
        self.minor_units / 100
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.currency)
    }
}
