use chrono::NaiveDate;
use tracing::warn;

use crate::{
    errors::Result,
    goals::{GoalDefinition, Installment},
};

/// Upper bound on occurrences produced for a single goal.
pub const MAX_OCCURRENCES: usize = 1000;

/// Installments generated for one goal.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub installments: Vec<Installment>,
    /// Set when the occurrence cap stopped the expansion before the end date.
    pub truncated: bool,
}

/// Turns goal definitions into dated installments.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    max_occurrences: usize,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(MAX_OCCURRENCES)
    }
}

impl RecurrenceExpander {
    pub fn new(max_occurrences: usize) -> Self {
        Self {
            max_occurrences: max_occurrences.max(1),
        }
    }

    pub fn max_occurrences(&self) -> usize {
        self.max_occurrences
    }

    /// Expands `goal` into installments due no later than the lesser of its
    /// own end date and `horizon`.
    ///
    /// A one-off goal always yields exactly one installment. The first
    /// occurrence of a recurring goal uses the unmodified target amount; the
    /// growth rule is applied between consecutive occurrences.
    pub fn expand(&self, goal: &GoalDefinition, horizon: NaiveDate) -> Result<Expansion> {
        let Some(recurrence) = goal.recurrence.as_ref() else {
            return Ok(Expansion {
                installments: vec![Installment::for_goal(
                    goal,
                    0,
                    goal.target_date,
                    goal.target_amount,
                )],
                truncated: false,
            });
        };
        recurrence.validate()?;

        let effective_end = recurrence
            .end_date
            .map_or(horizon, |end_date| end_date.min(horizon));
        let mut installments = Vec::new();
        let mut truncated = false;
        let mut amount = goal.target_amount;
        let mut step = 0u32;

        while let Some(due_date) = recurrence.interval.nth_after(goal.target_date, step) {
            if due_date > effective_end {
                break;
            }
            if installments.len() >= self.max_occurrences {
                truncated = true;
                break;
            }
            installments.push(Installment::for_goal(goal, step, due_date, amount));
            amount = recurrence.next_amount(amount);
            step += 1;
        }

        if truncated {
            warn!(
                goal = %goal.key,
                emitted = installments.len(),
                "recurrence expansion stopped at the occurrence cap"
            );
        }

        Ok(Expansion {
            installments,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        currency::CurrencyCode,
        errors::PlanError,
        goals::{FrequencyUnit, GrowthRule, Recurrence},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(amount: f64, due: NaiveDate) -> GoalDefinition {
        GoalDefinition::new("Rent", amount, CurrencyCode::default(), due).with_key("rent")
    }

    #[test]
    fn one_off_goal_yields_single_installment() {
        let expansion = RecurrenceExpander::default()
            .expand(&goal(500.0, date(2030, 1, 1)), date(2026, 6, 1))
            .unwrap();
        assert_eq!(expansion.installments.len(), 1);
        assert_eq!(expansion.installments[0].due_date, date(2030, 1, 1));
        assert!(!expansion.truncated);
    }

    #[test]
    fn fixed_growth_applies_after_each_occurrence() {
        let goal = goal(100.0, date(2026, 1, 10)).with_recurrence(
            Recurrence::every(1, FrequencyUnit::Month)
                .until(date(2026, 3, 10))
                .with_growth(GrowthRule::FixedIncrement, 10.0),
        );
        let expansion = RecurrenceExpander::default()
            .expand(&goal, date(2031, 1, 1))
            .unwrap();
        let amounts: Vec<f64> = expansion
            .installments
            .iter()
            .map(|item| item.amount_due)
            .collect();
        assert_eq!(amounts, vec![100.0, 110.0, 120.0]);
        let indexes: Vec<u32> = expansion
            .installments
            .iter()
            .map(|item| item.occurrence_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn horizon_caps_open_ended_recurrence() {
        let goal = goal(50.0, date(2026, 1, 15))
            .with_recurrence(Recurrence::every(1, FrequencyUnit::Year));
        let expansion = RecurrenceExpander::default()
            .expand(&goal, date(2028, 1, 14))
            .unwrap();
        let dates: Vec<NaiveDate> = expansion
            .installments
            .iter()
            .map(|item| item.due_date)
            .collect();
        assert_eq!(dates, vec![date(2026, 1, 15), date(2027, 1, 15)]);
    }

    #[test]
    fn cap_truncates_and_flags_expansion() {
        let goal = goal(1.0, date(2026, 1, 1))
            .with_recurrence(Recurrence::every(1, FrequencyUnit::Month));
        let expansion = RecurrenceExpander::new(12)
            .expand(&goal, date(2030, 1, 1))
            .unwrap();
        assert_eq!(expansion.installments.len(), 12);
        assert!(expansion.truncated);
    }

    #[test]
    fn cap_reached_exactly_is_not_truncation() {
        let goal = goal(1.0, date(2026, 1, 1))
            .with_recurrence(Recurrence::every(1, FrequencyUnit::Month).until(date(2026, 12, 1)));
        let expansion = RecurrenceExpander::new(12)
            .expand(&goal, date(2030, 1, 1))
            .unwrap();
        assert_eq!(expansion.installments.len(), 12);
        assert!(!expansion.truncated);
    }

    #[test]
    fn accumulated_amount_nets_every_occurrence() {
        let goal = goal(100.0, date(2026, 1, 1))
            .with_accumulated(30.0)
            .with_recurrence(Recurrence::every(6, FrequencyUnit::Month).until(date(2026, 12, 31)));
        let expansion = RecurrenceExpander::default()
            .expand(&goal, date(2030, 1, 1))
            .unwrap();
        assert_eq!(expansion.installments.len(), 2);
        assert!(expansion
            .installments
            .iter()
            .all(|item| (item.outstanding_amount - 70.0).abs() < 1e-9));
    }

    #[test]
    fn invalid_recurrence_is_rejected() {
        let goal = goal(100.0, date(2026, 1, 1))
            .with_recurrence(Recurrence::every(0, FrequencyUnit::Month));
        let err = RecurrenceExpander::default()
            .expand(&goal, date(2027, 1, 1))
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidRecurrence(_)));
    }
}
