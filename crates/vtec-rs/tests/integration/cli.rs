//! End-to-end runs of the `vtec` binary against temp config and data dirs.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::fixtures::script_path;

fn vtec(home: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vtec");
    cmd.current_dir(home);
    cmd.env("VTEC_CONFIG_DIR", home.join("config"));
    cmd.env("VTEC_DATA_DIR", home.join("data"));
    cmd.env_remove("VTEC_OFFICE");
    cmd.env_remove("VTEC_TABLE");
    cmd.env_remove("VTEC_LOG");
    cmd
}

#[test]
fn ugc_compresses_runs() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .args(["ugc", "FLZ050", "FLZ039", "FLZ048", "FLZ042", "FLZ049"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FLZ039-042-048>050-"));
}

#[test]
fn ugc_decode_expands_ranges() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .args(["ugc", "--decode", "FLZ039-042-048>050-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FLZ049"))
        .stdout(predicate::str::contains("FLZ042"));
}

#[test]
fn parse_prints_json_fields() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .args(["parse", "/O.NEW.KTBW.WS.A.0001.100101T0510Z-100103T0500Z/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"NEW\""))
        .stdout(predicate::str::contains("KTBW"));
}

#[test]
fn parse_rejects_garbage() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .args(["parse", "/O.NEW.KTBW/"])
        .assert()
        .code(1);
}

#[test]
fn run_prints_each_product() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .arg("run")
        .arg(script_path("s3_watch_to_warning.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("== step 3 (warning takes the whole range)"))
        .stdout(predicate::str::contains(
            "/O.EXT.KTBW.WS.W.0001.000000T0000Z-100103T0500Z/",
        ));
}

#[test]
fn run_fails_on_unmet_expectation() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("wrong.toml");
    fs::write(
        &script,
        r#"
office = "KTBW"
base_time = "2010-01-01T00:00:00Z"

[[steps]]
expect = ["/O.CON.KTBW.WS.W.0001."]

[[steps.hazards]]
phen_sig = "WS.W"
zones = ["FLZ039"]
start = 0
end = 12
"#,
    )
    .unwrap();

    vtec(home.path())
        .arg("run")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));

    // Without checks the same script only prints.
    vtec(home.path())
        .arg("run")
        .arg(&script)
        .arg("--no-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("/O.NEW.KTBW.WS.W.0001."));
}

#[test]
fn run_against_table_then_show_and_purge() {
    let home = TempDir::new().unwrap();
    let table = home.path().join("active.jsonl");

    vtec(home.path())
        .arg("run")
        .arg(script_path("upgrade.toml"))
        .arg("--table")
        .arg(&table)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&table).unwrap().lines().count(), 3);

    vtec(home.path())
        .args(["table", "show", "--table"])
        .arg(&table)
        .assert()
        .success()
        .stdout(predicate::str::contains("KTBW.HW.W.0001/2010"))
        .stdout(predicate::str::contains("3 records"));

    // Replaying the first product against the stored table is a duplicate.
    vtec(home.path())
        .arg("run")
        .arg(script_path("upgrade.toml"))
        .arg("--table")
        .arg(&table)
        .assert()
        .failure();

    vtec(home.path())
        .args(["table", "purge", "--before", "2010-01-05T00:00:00Z", "--table"])
        .arg(&table)
        .assert()
        .success()
        .stdout(predicate::str::contains("purged 3 records, 0 remain"));
}

#[test]
fn unreadable_table_exits_with_io_status() {
    let home = TempDir::new().unwrap();
    // A directory where the table file should be.
    let table = home.path().join("active.jsonl");
    fs::create_dir(&table).unwrap();

    vtec(home.path())
        .arg("run")
        .arg(script_path("upgrade.toml"))
        .arg("--table")
        .arg(&table)
        .assert()
        .code(74)
        .stderr(predicate::str::contains("active.jsonl"));
}

#[test]
fn persist_uses_configured_table() {
    let home = TempDir::new().unwrap();
    vtec(home.path())
        .arg("run")
        .arg(script_path("correction.toml"))
        .arg("--persist")
        .assert()
        .success();
    assert!(home.path().join("data").join("active_table.jsonl").exists());

    vtec(home.path())
        .args(["table", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"COR\""));
}

#[test]
fn site_config_supplies_default_office() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("vtec.toml"),
        "[defaults]\noffice = \"KMFL\"\n",
    )
    .unwrap();
    let script = home.path().join("no_office.toml");
    fs::write(
        &script,
        r#"
base_time = "2010-01-01T00:00:00Z"

[[steps]]
expect = ["/O.NEW.KMFL.WS.W.0001."]

[[steps.hazards]]
phen_sig = "WS.W"
zones = ["FLZ039"]
start = 0
end = 12
"#,
    )
    .unwrap();

    vtec(home.path()).arg("run").arg(&script).assert().success();

    vtec(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KMFL"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    vtec(home.path()).args(["config", "init"]).assert().success();
    assert!(home.path().join("config").join("config.toml").exists());
    vtec(home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    vtec(home.path())
        .args(["config", "init", "--force"])
        .assert()
        .success();
}
