#![doc(test(attr(deny(warnings))))]

//! Goal Planner turns a set of dated, possibly recurring, multi-currency
//! savings goals into a month-by-month plan of how much to put aside.
//!
//! The core is [`planning::PlanningEngine`]; the remaining modules supply its
//! inputs (goal definitions, configuration, persistence) and a small shell.

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod goals;
pub mod planning;
pub mod storage;
pub mod utils;

pub use errors::{PlanError, Result};
pub use goals::{GoalDefinition, GrowthRule, Recurrence};
pub use planning::{compute_plan, MonthlyPlanRow, PlanReport, PlanningEngine};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Goal planner tracing initialized.");
    });
}
