use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pennywise(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pennywise").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("PENNYWISE_DATA_DIR")
        .env("NO_COLOR", "1");
    cmd
}

fn setup() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    pennywise(&home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized pennywise"));
    pennywise(&home)
        .args(["accounts", "add", "Checking", "--type", "PERSONAL", "--initial-balance", "1000"])
        .assert()
        .success();
    home
}

fn add_rent(home: &TempDir) {
    pennywise(home)
        .args([
            "recurring", "add", "--account", "Checking", "--type", "EXPENSE", "--label", "Rent",
            "--amount", "850", "--frequency", "MONTHLY", "--moment", "31", "--category", "Rent",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("monthly on day 31"));
}

#[test]
fn commands_require_init() {
    let home = tempfile::tempdir().unwrap();
    pennywise(&home)
        .args(["materialize", "--date", "2024-04-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pennywise init"));
}

#[test]
fn materialize_is_idempotent_from_the_cli() {
    let home = setup();
    add_rent(&home);

    pennywise(&home)
        .args(["materialize", "--date", "2024-04-30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created:        1"));
    pennywise(&home)
        .args(["materialize", "--date", "2024-04-30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created:        0"))
        .stdout(predicate::str::contains("Already there:  1"));

    pennywise(&home)
        .args(["operations", "list", "--month", "2024-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rent"))
        .stdout(predicate::str::contains("recurring #1"))
        .stdout(predicate::str::contains("Net: -850.00 EUR"));
}

#[test]
fn invalid_weekly_moment_is_rejected() {
    let home = setup();
    pennywise(&home)
        .args([
            "recurring", "add", "--account", "Checking", "--type", "EXPENSE", "--label", "Market",
            "--amount", "60", "--frequency", "WEEKLY", "--moment", "9", "--category", "Groceries",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid moment 9 for WEEKLY"));
}

#[test]
fn deactivated_template_stops_materializing() {
    let home = setup();
    add_rent(&home);
    pennywise(&home)
        .args(["recurring", "deactivate", "1"])
        .assert()
        .success();
    pennywise(&home)
        .args(["materialize", "--date", "2024-05-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Templates:      0"));
    pennywise(&home)
        .args(["recurring", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rent"));
}

#[test]
fn manual_operation_updates_balance() {
    let home = setup();
    pennywise(&home)
        .args([
            "operations", "add", "--account", "Checking", "--type", "INCOME", "--label", "Bonus",
            "--amount", "250", "--date", "2024-06-01", "--category", "Salary",
            "--payment-method", "Transfer",
        ])
        .assert()
        .success();
    pennywise(&home)
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,250.00 EUR"));
}

#[test]
fn unknown_category_is_reported() {
    let home = setup();
    pennywise(&home)
        .args([
            "operations", "add", "--account", "Checking", "--type", "EXPENSE", "--label", "Toy",
            "--amount", "15", "--category", "Toys",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category: Toys"));
}

#[test]
fn deleted_category_can_no_longer_be_used() {
    let home = setup();
    pennywise(&home)
        .args(["categories", "delete", "Leisure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted categories: Leisure"));
    pennywise(&home)
        .args(["categories", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leisure").not());
    pennywise(&home)
        .args([
            "operations", "add", "--account", "Checking", "--type", "EXPENSE", "--label", "Cinema",
            "--amount", "12", "--category", "Leisure",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category: Leisure"));
    pennywise(&home)
        .args(["payment-methods", "delete", "Cheque"])
        .assert()
        .success();
    pennywise(&home)
        .args(["payment-methods", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cheque").not());
}
