use chrono::NaiveDate;

use super::GoalDefinition;
use crate::{
    currency::{CurrencyCode, RateTable},
    errors::Result,
};

/// One dated occurrence of a goal, produced fresh for every plan run.
#[derive(Debug, Clone, PartialEq)]
pub struct Installment {
    pub source_goal_key: String,
    pub occurrence_index: u32,
    pub due_date: NaiveDate,
    /// Amount due in the goal's own currency, after growth.
    pub amount_due: f64,
    /// Still uncovered, in the goal's own currency. Never negative.
    pub outstanding_amount: f64,
    pub currency: CurrencyCode,
}

impl Installment {
    /// Builds occurrence `occurrence_index` of `goal`, netting out the goal's
    /// own accumulated savings.
    pub fn for_goal(
        goal: &GoalDefinition,
        occurrence_index: u32,
        due_date: NaiveDate,
        amount_due: f64,
    ) -> Self {
        Self {
            source_goal_key: goal.key.clone(),
            occurrence_index,
            due_date,
            amount_due,
            outstanding_amount: goal.net_of_accumulated(amount_due),
            currency: goal.currency.clone(),
        }
    }

    pub fn outstanding_in_base(&self, rates: &RateTable) -> Result<f64> {
        rates.to_base(self.outstanding_amount, &self.currency)
    }
}
