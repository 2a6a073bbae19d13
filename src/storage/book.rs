use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{PlanError, Result},
    goals::GoalDefinition,
    planning::{PlanReport, PlanningEngine},
};

pub const BOOK_SCHEMA_VERSION: u32 = 1;

/// Everything a user keeps between sessions: goals, their categories, and
/// the savings pool shared by all goals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalBook {
    #[serde(default = "GoalBook::schema_version_default")]
    pub schema_version: u32,
    #[serde(default)]
    pub goals: Vec<GoalDefinition>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub global_pool: f64,
}

impl Default for GoalBook {
    fn default() -> Self {
        Self {
            schema_version: BOOK_SCHEMA_VERSION,
            goals: Vec::new(),
            categories: Vec::new(),
            global_pool: 0.0,
        }
    }
}

impl GoalBook {
    fn schema_version_default() -> u32 {
        BOOK_SCHEMA_VERSION
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_goal(&mut self, goal: GoalDefinition) -> Result<&GoalDefinition> {
        goal.validate()?;
        if self.goals.iter().any(|existing| existing.key == goal.key) {
            return Err(PlanError::InvalidInput(format!(
                "goal key `{}` already exists",
                goal.key
            )));
        }
        self.register_category(goal.category.as_deref());
        self.goals.push(goal);
        let index = self.goals.len() - 1;
        Ok(&self.goals[index])
    }

    pub fn update_goal(&mut self, goal: GoalDefinition) -> Result<()> {
        goal.validate()?;
        let category = goal.category.clone();
        let slot = self
            .goals
            .iter_mut()
            .find(|existing| existing.key == goal.key)
            .ok_or_else(|| PlanError::InvalidInput(format!("goal `{}` not found", goal.key)))?;
        *slot = goal;
        self.register_category(category.as_deref());
        Ok(())
    }

    pub fn remove_goal(&mut self, key: &str) -> Result<GoalDefinition> {
        let index = self
            .goals
            .iter()
            .position(|goal| goal.key == key)
            .ok_or_else(|| PlanError::InvalidInput(format!("goal `{}` not found", key)))?;
        Ok(self.goals.remove(index))
    }

    /// Finds a goal by its full key or by a prefix that matches exactly one key.
    pub fn find_goal(&self, reference: &str) -> Result<&GoalDefinition> {
        let reference = reference.trim();
        if let Some(goal) = self.goals.iter().find(|goal| goal.key == reference) {
            return Ok(goal);
        }
        let mut matches = self
            .goals
            .iter()
            .filter(|goal| !reference.is_empty() && goal.key.starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some(goal), None) => Ok(goal),
            (Some(_), Some(_)) => Err(PlanError::InvalidInput(format!(
                "`{}` matches more than one goal",
                reference
            ))),
            _ => Err(PlanError::InvalidInput(format!(
                "goal `{}` not found",
                reference
            ))),
        }
    }

    pub fn set_global_pool(&mut self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "global pool must be a non-negative amount, got {}",
                amount
            )));
        }
        self.global_pool = amount;
        Ok(())
    }

    /// Plans the current snapshot of goals and pool.
    pub fn plan(&self, engine: &PlanningEngine, start: NaiveDate) -> Result<PlanReport> {
        engine.compute_plan_report(&self.goals, self.global_pool, start)
    }

    fn register_category(&mut self, category: Option<&str>) {
        let Some(trimmed) = category.map(str::trim).filter(|value| !value.is_empty()) else {
            return;
        };
        if !self.categories.iter().any(|existing| existing == trimmed) {
            self.categories.push(trimmed.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;

    fn goal(key: &str, category: Option<&str>) -> GoalDefinition {
        let mut goal = GoalDefinition::new(
            "Trip",
            1000.0,
            CurrencyCode::default(),
            NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        )
        .with_key(key);
        goal.category = category.map(String::from);
        goal
    }

    #[test]
    fn categories_are_registered_once_and_trimmed() {
        let mut book = GoalBook::new();
        book.add_goal(goal("a", Some(" Travel "))).unwrap();
        book.add_goal(goal("b", Some("Travel"))).unwrap();
        book.add_goal(goal("c", Some("   "))).unwrap();
        book.add_goal(goal("d", None)).unwrap();
        assert_eq!(book.categories, vec!["Travel".to_string()]);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut book = GoalBook::new();
        book.add_goal(goal("a", None)).unwrap();
        assert!(book.add_goal(goal("a", None)).is_err());
    }

    #[test]
    fn update_replaces_by_key() {
        let mut book = GoalBook::new();
        book.add_goal(goal("a", None)).unwrap();
        let mut changed = goal("a", Some("Home"));
        changed.target_amount = 1500.0;
        book.update_goal(changed).unwrap();
        assert_eq!(book.goals[0].target_amount, 1500.0);
        assert_eq!(book.categories, vec!["Home".to_string()]);
        assert!(book.update_goal(goal("missing", None)).is_err());
    }

    #[test]
    fn find_goal_accepts_unique_prefix() {
        let mut book = GoalBook::new();
        book.add_goal(goal("abc-1", None)).unwrap();
        book.add_goal(goal("abd-2", None)).unwrap();
        assert_eq!(book.find_goal("abc").unwrap().key, "abc-1");
        assert!(book.find_goal("ab").is_err());
        assert!(book.find_goal("zzz").is_err());
    }

    #[test]
    fn remove_goal_returns_removed_entry() {
        let mut book = GoalBook::new();
        book.add_goal(goal("a", None)).unwrap();
        assert_eq!(book.remove_goal("a").unwrap().key, "a");
        assert!(book.goals.is_empty());
        assert!(book.remove_goal("a").is_err());
    }

    #[test]
    fn pool_must_be_non_negative() {
        let mut book = GoalBook::new();
        assert!(book.set_global_pool(-5.0).is_err());
        assert!(book.set_global_pool(f64::INFINITY).is_err());
        book.set_global_pool(750.0).unwrap();
        assert_eq!(book.global_pool, 750.0);
    }
}
