use assert_cmd::Command;
use predicates::prelude::*;

fn recur() -> Command {
    Command::cargo_bin("recur").unwrap()
}

// ============================================================
// Expansion
// ============================================================

#[test]
fn test_basic_rule() {
    recur()
        .args(["FREQ=DAILY;COUNT=2", "--start", "19970902T090000"])
        .assert()
        .success()
        .stdout("19970902T090000\n19970903T090000\n");
}

#[test]
fn test_n_flag() {
    recur()
        .args(["-n", "3", "FREQ=WEEKLY", "--start", "20240101"])
        .assert()
        .success()
        .stdout("20240101\n20240108\n20240115\n");
}

#[test]
fn test_default_start_is_now() {
    recur()
        .args(["-n", "1", "FREQ=DAILY"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Z\n"));
}

#[test]
fn test_time_zone() {
    recur()
        .args([
            "FREQ=DAILY;COUNT=2",
            "--start",
            "20240309T023000",
            "--tz",
            "America/New_York",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("20240311T023000[America/New_York]"))
        .stdout(predicate::str::contains("20240310").not());
}

#[test]
fn test_fixed_offset_zone() {
    recur()
        .args([
            "-n",
            "1",
            "FREQ=WEEKLY;BYDAY=FR,SU;UNTIL=20220430T170000Z",
            "--start",
            "20211215T160000Z",
            "--tz",
            "GMT+8",
        ])
        .assert()
        .success()
        .stdout("20211217T000000[+08:00]\n");
}

#[test]
fn test_after_flag() {
    recur()
        .args([
            "-n",
            "2",
            "FREQ=MONTHLY;BYMONTHDAY=1",
            "--start",
            "20240101",
            "--after",
            "20240615",
        ])
        .assert()
        .success()
        .stdout("20240701\n20240801\n");
}

#[test]
fn test_sync_start() {
    recur()
        .args([
            "FREQ=WEEKLY;COUNT=2;BYDAY=TH",
            "--start",
            "19970902T090000",
            "--sync-start",
        ])
        .assert()
        .success()
        .stdout("19970902T090000\n19970904T090000\n");
}

#[test]
fn test_empty_expansion() {
    recur()
        .args(["FREQ=DAILY;UNTIL=20200101", "--start", "20240101"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no instances"));
}

// ============================================================
// Flags
// ============================================================

#[test]
fn test_check_valid() {
    recur()
        .args(["--check", "freq=weekly;byday=mo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid: FREQ=WEEKLY;BYDAY=MO"));
}

#[test]
fn test_check_invalid() {
    recur()
        .args(["--check", "FREQ=DAILY;BYFOO=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[unknown-part]"));
}

#[test]
fn test_lax_accepts_unknown_parts() {
    recur()
        .args(["--check", "--lax", "FREQ=DAILY;BYFOO=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FREQ=DAILY"))
        .stderr(predicate::str::contains("BYFOO"));
}

#[test]
fn test_rfc2445_compat() {
    recur()
        .args(["--check", "--rfc2445", "FREQ=MONTHLY;BYWEEKNO=1"])
        .assert()
        .success();
    recur()
        .args(["--check", "FREQ=MONTHLY;BYWEEKNO=1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("incompatible-parts"));
}

#[test]
fn test_parse_json() {
    recur()
        .args(["--parse", "FREQ=MONTHLY;BYDAY=-1FR;COUNT=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"freq\": \"MONTHLY\""))
        .stdout(predicate::str::contains("\"-1FR\""))
        .stdout(predicate::str::contains("\"count\": 3"));
}

#[test]
fn test_json_output() {
    recur()
        .args(["-n", "2", "--json", "FREQ=DAILY", "--start", "20240101"])
        .assert()
        .success()
        .stdout("[\"20240101\",\"20240102\"]\n");
}

#[test]
fn test_rust_log_shows_debug_output() {
    recur()
        .env("RUST_LOG", "debug")
        .args(["FREQ=DAILY;COUNT=1", "--start", "20240101"])
        .assert()
        .success()
        .stdout("20240101\n")
        .stderr(predicate::str::contains("parsed rule"));
}

// ============================================================
// Membership
// ============================================================

#[test]
fn test_matches_true() {
    recur()
        .args([
            "FREQ=MONTHLY;BYMONTHDAY=1,15,17;UNTIL=20230430T170000Z",
            "--start",
            "20211215T160000Z",
            "--tz",
            "GMT+8",
            "--matches",
            "2022-12-17",
        ])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn test_matches_false() {
    recur()
        .args([
            "FREQ=DAILY;UNTIL=20210430T180000Z",
            "--start",
            "20211215T160000Z",
            "--tz",
            "GMT+8",
            "--matches",
            "2021-12-22",
        ])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn test_matches_bad_date() {
    recur()
        .args(["FREQ=DAILY", "--start", "20240101", "--matches", "tomorrow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --matches date"));
}

// ============================================================
// Error cases
// ============================================================

#[test]
fn test_no_rule() {
    recur().assert().failure();
}

#[test]
fn test_bad_start() {
    recur()
        .args(["FREQ=DAILY", "--start", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed-value"));
}

#[test]
fn test_unknown_zone() {
    recur()
        .args(["FREQ=DAILY", "--start", "20240101T090000", "--tz", "Nowhere/City"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown time zone"));
}

#[test]
fn test_non_ascii_zone() {
    recur()
        .args(["FREQ=DAILY", "--start", "20240101T090000", "--tz", "+\u{e9}A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown time zone"));
}
