//! Goal definitions, their recurrence rules, and calendar helpers.

pub mod goal;
pub mod installment;
pub mod time_interval;

pub use goal::{GoalDefinition, GrowthRule, Recurrence};
pub use installment::Installment;
pub use time_interval::{FrequencyUnit, TimeInterval};
