use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use goal_planner::{
    currency::CurrencyCode, goals::FrequencyUnit, GoalDefinition, GrowthRule, PlanningEngine,
    Recurrence,
};

fn build_goals(count: usize) -> Vec<GoalDefinition> {
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let currencies = ["UAH", "USD", "EUR"];
    (0..count)
        .map(|index| {
            let due = start + chrono::Duration::days((index as i64 * 37) % 900);
            let goal = GoalDefinition::new(
                format!("Goal {}", index),
                100.0 + index as f64,
                CurrencyCode::new(currencies[index % currencies.len()]),
                due,
            )
            .with_key(format!("goal-{}", index));
            if index % 3 == 0 {
                goal.with_recurrence(
                    Recurrence::every(1 + (index % 4) as u32, FrequencyUnit::Month)
                        .with_growth(GrowthRule::PercentPerYear, 5.0),
                )
            } else {
                goal
            }
        })
        .collect()
}

fn bench_compute_plan(c: &mut Criterion) {
    let engine = PlanningEngine::default();
    let goals = build_goals(250);
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    c.bench_function("compute_plan_250_goals", |b| {
        b.iter(|| {
            engine
                .compute_plan(black_box(&goals), black_box(25_000.0), start)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_compute_plan);
criterion_main!(benches);
