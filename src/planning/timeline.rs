use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    currency::RateTable,
    errors::Result,
    goals::{
        time_interval::{first_of_month, month_label, months_between, shift_month},
        Installment,
    },
};

/// One month of the savings plan, amounts in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPlanRow {
    pub month_label: String,
    /// First day of the calendar month this row covers.
    pub month: NaiveDate,
    /// 1-based position counted from the start month.
    pub month_index: u32,
    pub expense_amount: f64,
    pub cumulative_expense: f64,
    /// Flat monthly rate that would cover everything due up to this month.
    pub proposed_savings: f64,
    /// Safe monthly rate from this month on; filled in by the projector.
    pub required_savings: f64,
}

/// Buckets the outstanding installment amounts into calendar months.
///
/// Row `i` covers the `i`-th calendar month starting with `start_month`'s
/// own month, and the timeline runs through the month of the latest
/// installment. Installments due before the start month are not bucketed.
pub fn build_timeline(
    installments: &[Installment],
    start_month: NaiveDate,
    rates: &RateTable,
) -> Result<Vec<MonthlyPlanRow>> {
    let Some(last_due) = installments.iter().map(|item| item.due_date).max() else {
        return Ok(Vec::new());
    };
    let horizon = months_between(start_month, last_due) + 1;
    if horizon <= 0 {
        return Ok(Vec::new());
    }

    let mut expenses: BTreeMap<i32, f64> = BTreeMap::new();
    for installment in installments {
        let offset = months_between(start_month, installment.due_date);
        if !(0..horizon).contains(&offset) {
            continue;
        }
        *expenses.entry(offset).or_insert(0.0) += installment.outstanding_in_base(rates)?;
    }

    let first_month = first_of_month(start_month);
    let mut rows = Vec::with_capacity(horizon as usize);
    let mut cumulative_expense = 0.0;
    for offset in 0..horizon {
        let month = shift_month(first_month, offset).unwrap_or(first_month);
        let expense_amount = expenses.get(&offset).copied().unwrap_or(0.0);
        cumulative_expense += expense_amount;
        let month_index = offset as u32 + 1;
        rows.push(MonthlyPlanRow {
            month_label: month_label(month),
            month,
            month_index,
            expense_amount,
            cumulative_expense,
            proposed_savings: cumulative_expense / f64::from(month_index),
            required_savings: 0.0,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn due(on: NaiveDate, amount: f64, currency: &str) -> Installment {
        Installment {
            source_goal_key: "goal".into(),
            occurrence_index: 0,
            due_date: on,
            amount_due: amount,
            outstanding_amount: amount,
            currency: CurrencyCode::new(currency),
        }
    }

    #[test]
    fn empty_schedule_builds_no_rows() {
        let rows = build_timeline(&[], date(2026, 1, 1), &RateTable::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rows_run_through_last_due_month() {
        let schedule = vec![due(date(2026, 3, 20), 1200.0, "UAH")];
        let rows = build_timeline(&schedule, date(2026, 1, 1), &RateTable::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].month_label, "January 2026");
        assert_eq!(rows[2].month_label, "March 2026");
        let expenses: Vec<f64> = rows.iter().map(|row| row.expense_amount).collect();
        assert_eq!(expenses, vec![0.0, 0.0, 1200.0]);
        let proposed: Vec<f64> = rows.iter().map(|row| row.proposed_savings).collect();
        assert_eq!(proposed, vec![0.0, 0.0, 400.0]);
    }

    #[test]
    fn same_month_installments_are_summed_in_base() {
        let schedule = vec![
            due(date(2026, 2, 1), 100.0, "USD"),
            due(date(2026, 2, 28), 10.0, "EUR"),
        ];
        let rows = build_timeline(&schedule, date(2026, 1, 15), &RateTable::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[1].expense_amount - 4540.0).abs() < 1e-9);
        assert!((rows[1].cumulative_expense - 4540.0).abs() < 1e-9);
        assert!((rows[1].proposed_savings - 2270.0).abs() < 1e-9);
    }

    #[test]
    fn installments_before_start_are_ignored() {
        let schedule = vec![
            due(date(2025, 12, 1), 999.0, "UAH"),
            due(date(2026, 1, 1), 100.0, "UAH"),
        ];
        let rows = build_timeline(&schedule, date(2026, 1, 1), &RateTable::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].expense_amount, 100.0);
    }

    #[test]
    fn schedule_entirely_in_the_past_is_empty() {
        let schedule = vec![due(date(2025, 6, 1), 10.0, "UAH")];
        let rows = build_timeline(&schedule, date(2026, 1, 1), &RateTable::default()).unwrap();
        assert!(rows.is_empty());
    }
}
