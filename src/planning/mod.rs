//! The planning pipeline: expand goals into installments, apply the global
//! pool, bucket by month, and derive the safe monthly savings rate.

pub mod allocation;
pub mod engine;
pub mod expander;
pub mod projector;
pub mod timeline;

pub use allocation::{allocate, Allocation};
pub use engine::{compute_plan, PlanReport, PlanningEngine, TruncatedExpansion};
pub use expander::{Expansion, RecurrenceExpander, MAX_OCCURRENCES};
pub use projector::project;
pub use timeline::{build_timeline, MonthlyPlanRow};
