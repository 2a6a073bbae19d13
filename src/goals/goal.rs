use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time_interval::{FrequencyUnit, TimeInterval};
use crate::{
    currency::CurrencyCode,
    errors::{PlanError, Result},
};

/// A savings target, optionally repeating on a monthly or yearly cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalDefinition {
    pub key: String,
    pub name: String,
    pub target_amount: f64,
    /// Already saved toward this goal only; nets out of every occurrence.
    #[serde(default)]
    pub accumulated_amount: f64,
    pub currency: CurrencyCode,
    /// First (or only) due date.
    pub target_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl GoalDefinition {
    pub fn new(
        name: impl Into<String>,
        target_amount: f64,
        currency: CurrencyCode,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            key: Uuid::new_v4().to_string(),
            name: name.into(),
            target_amount,
            accumulated_amount: 0.0,
            currency,
            target_date,
            category: None,
            recurrence: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_accumulated(mut self, amount: f64) -> Self {
        self.accumulated_amount = amount;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Portion of `amount_due` not yet covered by the goal's own savings.
    pub fn net_of_accumulated(&self, amount_due: f64) -> f64 {
        (amount_due - self.accumulated_amount).max(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(PlanError::InvalidInput("goal key cannot be empty".into()));
        }
        if !self.target_amount.is_finite() || self.target_amount <= 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "goal `{}` needs a positive target amount",
                self.name
            )));
        }
        if !self.accumulated_amount.is_finite() || self.accumulated_amount < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "goal `{}` has a negative accumulated amount",
                self.name
            )));
        }
        match &self.recurrence {
            Some(recurrence) => recurrence.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GrowthRule {
    #[default]
    None,
    /// Adds a flat amount after every occurrence.
    FixedIncrement,
    /// Grows by a percentage after every occurrence.
    PercentPerPeriod,
    /// Annual percentage, prorated to the recurrence period.
    PercentPerYear,
}

impl GrowthRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(GrowthRule::None),
            "fixed" => Some(GrowthRule::FixedIncrement),
            "percent" => Some(GrowthRule::PercentPerPeriod),
            "annual" => Some(GrowthRule::PercentPerYear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recurrence {
    pub interval: TimeInterval,
    /// Last date an occurrence may fall on. Absent means "until the horizon".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub growth: GrowthRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_value: Option<f64>,
}

impl Recurrence {
    pub fn new(interval: TimeInterval) -> Self {
        Self {
            interval,
            end_date: None,
            growth: GrowthRule::None,
            growth_value: None,
        }
    }

    pub fn every(count: u32, unit: FrequencyUnit) -> Self {
        Self::new(TimeInterval::new(count, unit))
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_growth(mut self, growth: GrowthRule, value: f64) -> Self {
        self.growth = growth;
        self.growth_value = Some(value);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.every == 0 {
            return Err(PlanError::InvalidRecurrence(
                "frequency count must be at least 1".into(),
            ));
        }
        if self.growth != GrowthRule::None {
            match self.growth_value {
                Some(value) if value.is_finite() && value != 0.0 => {}
                _ => {
                    return Err(PlanError::InvalidRecurrence(format!(
                        "growth rule {:?} needs a non-zero growth value",
                        self.growth
                    )))
                }
            }
        }
        Ok(())
    }

    /// Amount due on the occurrence following one that was due `amount`.
    pub fn next_amount(&self, amount: f64) -> f64 {
        let value = self.growth_value.unwrap_or(0.0);
        match self.growth {
            GrowthRule::None => amount,
            GrowthRule::FixedIncrement => amount + value,
            GrowthRule::PercentPerPeriod => amount + amount * value / 100.0,
            GrowthRule::PercentPerYear => {
                let effective_rate = value * (f64::from(self.interval.period_months()) / 12.0);
                amount + amount * effective_rate / 100.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_growth_is_prorated_to_the_period() {
        let quarterly = Recurrence::every(3, FrequencyUnit::Month)
            .with_growth(GrowthRule::PercentPerYear, 12.0);
        assert!((quarterly.next_amount(1000.0) - 1030.0).abs() < 1e-9);

        let biennial = Recurrence::every(2, FrequencyUnit::Year)
            .with_growth(GrowthRule::PercentPerYear, 5.0);
        assert!((biennial.next_amount(1000.0) - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn percent_per_period_compounds_on_current_amount() {
        let rule = Recurrence::every(1, FrequencyUnit::Month)
            .with_growth(GrowthRule::PercentPerPeriod, 10.0);
        let second = rule.next_amount(200.0);
        assert!((second - 220.0).abs() < 1e-9);
        assert!((rule.next_amount(second) - 242.0).abs() < 1e-9);
    }

    #[test]
    fn growth_without_value_is_rejected() {
        let mut rule = Recurrence::every(1, FrequencyUnit::Year);
        rule.growth = GrowthRule::FixedIncrement;
        assert!(matches!(
            rule.validate(),
            Err(PlanError::InvalidRecurrence(_))
        ));
        rule.growth_value = Some(0.0);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn zero_frequency_is_rejected() {
        let rule = Recurrence::every(0, FrequencyUnit::Month);
        assert!(matches!(
            rule.validate(),
            Err(PlanError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn validate_checks_amounts() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let goal = GoalDefinition::new("Laptop", 0.0, CurrencyCode::default(), date);
        assert!(matches!(goal.validate(), Err(PlanError::InvalidInput(_))));
        let goal = GoalDefinition::new("Laptop", 900.0, CurrencyCode::default(), date)
            .with_accumulated(-1.0);
        assert!(goal.validate().is_err());
    }
}
