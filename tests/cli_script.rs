use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("goal_planner_cli").unwrap();
    cmd.env("GOAL_PLANNER_CLI_SCRIPT", "1")
        .env("GOAL_PLANNER_HOME", home)
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn script_mode_plans_a_goal() {
    let home = tempdir().unwrap();
    cli(home.path())
        .write_stdin("goal add Laptop 1200 UAH 2026-03-15 --category Tech\nplan 2026-01\nexit\n")
        .assert()
        .success()
        .stdout(contains("Goal `Laptop` added"))
        .stdout(contains("March 2026"))
        .stdout(contains("Put aside ₴400.00 per month starting January 2026."));

    let json = std::fs::read_to_string(home.path().join("goals.json")).unwrap();
    assert!(json.contains("\"Laptop\""));
    assert!(json.contains("\"Tech\""));
}

#[test]
fn goals_survive_between_sessions() {
    let home = tempdir().unwrap();
    cli(home.path())
        .write_stdin("goal add Trip 900 EUR 2026-07-01\npool 1000\n")
        .assert()
        .success();

    cli(home.path())
        .write_stdin("goal list\npool\n")
        .assert()
        .success()
        .stdout(contains("Trip"))
        .stdout(contains("€900.00"))
        .stdout(contains("Savings pool: ₴1,000.00"));
}

#[test]
fn mistakes_are_reported_without_aborting() {
    let home = tempdir().unwrap();
    cli(home.path())
        .write_stdin("plna\ngoal add Sushi 10 JPY 2026-02-01\nversion\n")
        .assert()
        .success()
        .stdout(contains("Suggestion: `plan`?"))
        .stderr(contains("Unsupported currency"))
        .stdout(contains("goal_planner"));
}
