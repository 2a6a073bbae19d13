use crate::{currency::RateTable, errors::Result, goals::Installment};

/// Result of spreading the global pool over the installment schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub installments: Vec<Installment>,
    /// Base-currency amount of the pool that was consumed.
    pub pool_applied: f64,
    pub pool_remaining: f64,
}

/// Applies `pool` (base currency) to `installments` in the given order.
///
/// Callers sort by due date first; the earliest obligations are covered
/// before later ones. Each covered installment is scaled down in its own
/// currency by the covered fraction of its base-currency cost. The input is
/// left untouched and a new schedule is returned.
pub fn allocate(installments: &[Installment], pool: f64, rates: &RateTable) -> Result<Allocation> {
    let starting_pool = pool.max(0.0);
    let (allocated, remaining) = installments.iter().try_fold(
        (Vec::with_capacity(installments.len()), starting_pool),
        |(mut allocated, remaining), installment| -> Result<_> {
            let (next, remaining) = cover(installment, remaining, rates)?;
            allocated.push(next);
            Ok((allocated, remaining))
        },
    )?;

    Ok(Allocation {
        installments: allocated,
        pool_applied: starting_pool - remaining,
        pool_remaining: remaining,
    })
}

fn cover(installment: &Installment, pool: f64, rates: &RateTable) -> Result<(Installment, f64)> {
    let mut next = installment.clone();
    if pool <= 0.0 || next.outstanding_amount <= 0.0 {
        return Ok((next, pool));
    }
    let cost = next.outstanding_in_base(rates)?;
    if cost <= 0.0 {
        return Ok((next, pool));
    }
    let covered = cost.min(pool);
    let ratio = covered / cost;
    next.outstanding_amount = if ratio >= 1.0 {
        0.0
    } else {
        next.outstanding_amount * (1.0 - ratio)
    };
    Ok((next, pool - covered))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{currency::CurrencyCode, errors::PlanError};

    fn installment(key: &str, month: u32, amount: f64, currency: &str) -> Installment {
        Installment {
            source_goal_key: key.into(),
            occurrence_index: 0,
            due_date: NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            amount_due: amount,
            outstanding_amount: amount,
            currency: CurrencyCode::new(currency),
        }
    }

    #[test]
    fn pool_covers_earliest_installments_first() {
        let schedule = vec![
            installment("a", 1, 300.0, "UAH"),
            installment("b", 2, 300.0, "UAH"),
            installment("c", 3, 300.0, "UAH"),
        ];
        let result = allocate(&schedule, 450.0, &RateTable::default()).unwrap();
        let outstanding: Vec<f64> = result
            .installments
            .iter()
            .map(|item| item.outstanding_amount)
            .collect();
        assert_eq!(outstanding, vec![0.0, 150.0, 300.0]);
        assert!((result.pool_applied - 450.0).abs() < 1e-9);
        assert_eq!(result.pool_remaining, 0.0);
    }

    #[test]
    fn partial_cover_scales_foreign_amount_proportionally() {
        let schedule = vec![installment("usd", 1, 100.0, "USD")];
        let result = allocate(&schedule, 2050.0, &RateTable::default()).unwrap();
        assert!((result.installments[0].outstanding_amount - 50.0).abs() < 1e-9);
        assert_eq!(result.installments[0].currency.as_str(), "USD");
    }

    #[test]
    fn surplus_pool_is_reported() {
        let schedule = vec![installment("a", 1, 200.0, "UAH")];
        let result = allocate(&schedule, 500.0, &RateTable::default()).unwrap();
        assert_eq!(result.installments[0].outstanding_amount, 0.0);
        assert!((result.pool_remaining - 300.0).abs() < 1e-9);
    }

    #[test]
    fn input_schedule_is_not_mutated() {
        let schedule = vec![installment("a", 1, 200.0, "UAH")];
        let _ = allocate(&schedule, 500.0, &RateTable::default()).unwrap();
        assert_eq!(schedule[0].outstanding_amount, 200.0);
    }

    #[test]
    fn empty_pool_skips_conversion() {
        let schedule = vec![installment("x", 1, 10.0, "XYZ")];
        let result = allocate(&schedule, 0.0, &RateTable::default()).unwrap();
        assert_eq!(result.installments, schedule);
    }

    #[test]
    fn unsupported_currency_fails_while_pool_remains() {
        let schedule = vec![installment("x", 1, 10.0, "XYZ")];
        let err = allocate(&schedule, 5.0, &RateTable::default()).unwrap_err();
        assert!(matches!(err, PlanError::UnsupportedCurrency(_)));
    }
}
