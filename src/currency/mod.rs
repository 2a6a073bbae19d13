use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{PlanError, Result};

/// Code every goal amount is normalised to before summation.
pub const DEFAULT_BASE_CURRENCY: &str = "UAH";

static DEFAULT_RATES: Lazy<BTreeMap<String, f64>> = Lazy::new(|| {
    [("USD", 41.0), ("EUR", 44.0)]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect()
});

/// Built-in mock rates, expressed as base-currency units per one unit of the code.
pub fn default_rates() -> BTreeMap<String, f64> {
    DEFAULT_RATES.clone()
}

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_CURRENCY)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed multiplicative conversion table into a single base currency.
///
/// The base currency always converts at 1. Any other code must be present in
/// the table; lookups for unknown codes fail with
/// [`PlanError::UnsupportedCurrency`] instead of falling back to parity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateTable {
    base: CurrencyCode,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Creates a table that only knows its base currency.
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Registers (or replaces) the multiplier for `code`.
    pub fn set_rate(&mut self, code: &str, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "rate for {} must be a positive number, got {}",
                code, rate
            )));
        }
        let code = CurrencyCode::new(code);
        if code == self.base {
            return Ok(());
        }
        self.rates.insert(code.0, rate);
        Ok(())
    }

    pub fn supports(&self, code: &CurrencyCode) -> bool {
        *code == self.base || self.rates.contains_key(code.as_str())
    }

    /// Lists every convertible code, base first.
    pub fn codes(&self) -> Vec<&str> {
        std::iter::once(self.base.as_str())
            .chain(self.rates.keys().map(String::as_str))
            .collect()
    }

    pub fn rate_for(&self, code: &CurrencyCode) -> Result<f64> {
        if *code == self.base {
            return Ok(1.0);
        }
        self.rates
            .get(code.as_str())
            .copied()
            .ok_or_else(|| PlanError::UnsupportedCurrency(code.0.clone()))
    }

    /// Converts `amount` expressed in `code` into the base currency.
    pub fn to_base(&self, amount: f64, code: &CurrencyCode) -> Result<f64> {
        Ok(amount * self.rate_for(code)?)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            base: CurrencyCode::default(),
            rates: default_rates(),
        }
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "UAH" => "₴".into(),
        "GBP" => "£".into(),
        _ => code.into(),
    }
}

/// Formats `value` with two decimals and comma thousands grouping.
pub fn format_number(value: f64) -> String {
    let body = format!("{:.2}", value.abs());
    let (int_part, fraction) = body.split_once('.').unwrap_or((body.as_str(), "00"));
    let grouped = group_digits(int_part, ',');
    if value < 0.0 && body != "0.00" {
        format!("-{}.{}", grouped, fraction)
    } else {
        format!("{}.{}", grouped, fraction)
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

pub fn format_amount(amount: f64, code: &CurrencyCode) -> String {
    format!("{}{}", symbol_for(code.as_str()), format_number(amount))
}
