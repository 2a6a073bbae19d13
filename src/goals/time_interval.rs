use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FrequencyUnit {
    Month,
    Year,
}

impl FrequencyUnit {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "month" | "months" | "monthly" => Some(FrequencyUnit::Month),
            "y" | "year" | "years" | "yearly" => Some(FrequencyUnit::Year),
            _ => None,
        }
    }
}

/// "Every N months/years" cadence of a recurring goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: FrequencyUnit,
}

impl TimeInterval {
    pub fn new(every: u32, unit: FrequencyUnit) -> Self {
        Self { every, unit }
    }

    pub fn monthly() -> Self {
        Self::new(1, FrequencyUnit::Month)
    }

    pub fn yearly() -> Self {
        Self::new(1, FrequencyUnit::Year)
    }

    /// Length of one period expressed in months.
    pub fn period_months(&self) -> u32 {
        match self.unit {
            FrequencyUnit::Month => self.every,
            FrequencyUnit::Year => self.every.saturating_mul(12),
        }
    }

    pub fn next_date(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.nth_after(from, 1)
    }

    /// Date of the `steps`-th occurrence counted from `anchor`.
    ///
    /// Stepping always starts from the anchor, so a day clamped in a short
    /// month (Jan 31 -> Feb 28) returns to the 31st once a month allows it.
    pub fn nth_after(&self, anchor: NaiveDate, steps: u32) -> Option<NaiveDate> {
        let months = i32::try_from(u64::from(self.period_months()) * u64::from(steps)).ok()?;
        shift_month(anchor, months)
    }

    pub fn label(&self) -> String {
        match (self.every, self.unit) {
            (1, FrequencyUnit::Month) => "Monthly".into(),
            (1, FrequencyUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {:?}{}", n, unit, if n > 1 { "s" } else { "" }),
        }
    }
}

/// Moves `date` by `months`, clamping the day to the last valid day of the
/// target month.
pub fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = month_index(date).checked_add(months)?;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Absolute month number (`year * 12 + month0`) used for month arithmetic.
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Number of calendar months from `from`'s month to `to`'s month.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    month_index(to) - month_index(from)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}
