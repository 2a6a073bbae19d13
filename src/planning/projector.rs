use super::timeline::MonthlyPlanRow;

/// Fills in `required_savings` as the largest proposed rate from each month
/// onward, so committing to it never falls short of a later cumulative total.
pub fn project(mut rows: Vec<MonthlyPlanRow>) -> Vec<MonthlyPlanRow> {
    let mut running_max = 0.0_f64;
    for row in rows.iter_mut().rev() {
        running_max = running_max.max(row.proposed_savings);
        row.required_savings = running_max;
    }
    rows
}
