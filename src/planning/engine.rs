use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info_span};

use super::{
    allocation::allocate,
    expander::{RecurrenceExpander, MAX_OCCURRENCES},
    projector::project,
    timeline::{build_timeline, MonthlyPlanRow},
};
use crate::{
    currency::RateTable,
    errors::{PlanError, Result},
    goals::{time_interval::shift_month, GoalDefinition, Installment},
};

/// Years the horizon always extends past the start month.
pub const MINIMUM_HORIZON_YEARS: u32 = 1;
/// Horizon used for recurring goals that have no end date.
pub const DEFAULT_RECURRENCE_YEARS: u32 = 5;

/// A goal whose expansion hit the occurrence cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncatedExpansion {
    pub goal_key: String,
    pub emitted: usize,
}

/// Full outcome of one planning run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlanReport {
    pub rows: Vec<MonthlyPlanRow>,
    pub truncated: Vec<TruncatedExpansion>,
    pub pool_applied: f64,
    pub pool_remaining: f64,
}

impl PlanReport {
    /// The amount to put aside in the start month.
    pub fn current_target(&self) -> Option<f64> {
        self.rows.first().map(|row| row.required_savings)
    }
}

/// Turns a snapshot of goals and the global pool into a monthly savings plan.
///
/// The engine holds configuration only; every call works on its own inputs
/// and produces a fresh plan.
#[derive(Debug, Clone)]
pub struct PlanningEngine {
    rates: RateTable,
    expander: RecurrenceExpander,
    minimum_horizon_years: u32,
    default_recurrence_years: u32,
}

impl Default for PlanningEngine {
    fn default() -> Self {
        Self::new(RateTable::default())
    }
}

impl PlanningEngine {
    pub fn new(rates: RateTable) -> Self {
        Self {
            rates,
            expander: RecurrenceExpander::new(MAX_OCCURRENCES),
            minimum_horizon_years: MINIMUM_HORIZON_YEARS,
            default_recurrence_years: DEFAULT_RECURRENCE_YEARS,
        }
    }

    pub fn with_max_occurrences(mut self, max_occurrences: usize) -> Self {
        self.expander = RecurrenceExpander::new(max_occurrences);
        self
    }

    pub fn with_horizon_years(mut self, minimum: u32, default_recurrence: u32) -> Self {
        self.minimum_horizon_years = minimum;
        self.default_recurrence_years = default_recurrence;
        self
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Latest date the plan must model: at least the minimum horizon past
    /// `start`, every goal's first due date, and every recurrence's end date
    /// (or the default recurrence cap when it has none).
    ///
    /// A year count too large to represent as a calendar date is a
    /// `ConfigError`.
    pub fn horizon_date(&self, goals: &[GoalDefinition], start: NaiveDate) -> Result<NaiveDate> {
        let years_after = |years: u32| {
            i32::try_from(years)
                .ok()
                .and_then(|years| years.checked_mul(12))
                .and_then(|months| shift_month(start, months))
                .ok_or_else(|| {
                    PlanError::ConfigError(format!(
                        "a horizon of {} years past {} is out of range",
                        years, start
                    ))
                })
        };
        let recurrence_cap = years_after(self.default_recurrence_years)?;

        Ok(goals.iter().fold(
            years_after(self.minimum_horizon_years)?,
            |horizon, goal| {
                let recurrence_end = goal
                    .recurrence
                    .as_ref()
                    .map(|recurrence| recurrence.end_date.unwrap_or(recurrence_cap));
                horizon
                    .max(goal.target_date)
                    .max(recurrence_end.unwrap_or(horizon))
            },
        ))
    }

    /// Expands every goal up to `horizon` and orders the installments by due
    /// date. The sort is stable: equal dates keep goal order, then
    /// occurrence order.
    pub(crate) fn schedule(
        &self,
        goals: &[GoalDefinition],
        horizon: NaiveDate,
    ) -> Result<(Vec<Installment>, Vec<TruncatedExpansion>)> {
        let mut installments = Vec::new();
        let mut truncated = Vec::new();
        for goal in goals {
            let expansion = self.expander.expand(goal, horizon)?;
            if expansion.truncated {
                truncated.push(TruncatedExpansion {
                    goal_key: goal.key.clone(),
                    emitted: expansion.installments.len(),
                });
            }
            installments.extend(expansion.installments);
        }
        installments.sort_by_key(|installment| installment.due_date);
        Ok((installments, truncated))
    }

    /// Computes the monthly plan rows, index 0 being `start`'s month.
    pub fn compute_plan(
        &self,
        goals: &[GoalDefinition],
        global_pool: f64,
        start: NaiveDate,
    ) -> Result<Vec<MonthlyPlanRow>> {
        Ok(self.compute_plan_report(goals, global_pool, start)?.rows)
    }

    /// Same as [`compute_plan`](Self::compute_plan) but also reports pool
    /// usage and any goal whose expansion was truncated.
    pub fn compute_plan_report(
        &self,
        goals: &[GoalDefinition],
        global_pool: f64,
        start: NaiveDate,
    ) -> Result<PlanReport> {
        let span = info_span!("compute_plan", goals = goals.len(), %start);
        let _guard = span.enter();

        if goals.is_empty() {
            return Ok(PlanReport::default());
        }
        if !global_pool.is_finite() || global_pool < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "global pool must be a non-negative amount, got {}",
                global_pool
            )));
        }
        for goal in goals {
            self.rates.rate_for(&goal.currency)?;
        }

        let horizon = self.horizon_date(goals, start)?;
        let (installments, truncated) = self.schedule(goals, horizon)?;
        debug!(installments = installments.len(), %horizon, "expanded goals");

        let allocation = allocate(&installments, global_pool, &self.rates)?;
        debug!(
            applied = allocation.pool_applied,
            remaining = allocation.pool_remaining,
            "allocated global pool"
        );

        let rows = project(build_timeline(&allocation.installments, start, &self.rates)?);
        debug!(rows = rows.len(), "built savings timeline");

        Ok(PlanReport {
            rows,
            truncated,
            pool_applied: allocation.pool_applied,
            pool_remaining: allocation.pool_remaining,
        })
    }
}

/// Plans with the built-in rate table and default caps.
pub fn compute_plan(
    goals: &[GoalDefinition],
    global_pool: f64,
    start: NaiveDate,
) -> Result<Vec<MonthlyPlanRow>> {
    PlanningEngine::default().compute_plan(goals, global_pool, start)
}
