//! The JSON-lines table must behave exactly like the in-memory one, across reopen.

use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use vtec_rs::core::{ActiveTable, ClassifyOptions, HOUR_MS, Windows};
use vtec_rs::harness::{Runner, Script};
use vtec_rs::store::JsonlActiveTable;

use crate::fixtures::{lines, load_script, memory_runner, office};

fn jsonl_runner(table: JsonlActiveTable) -> Runner<JsonlActiveTable> {
    let pool = table.pool();
    Runner::new(office(), table, pool, ClassifyOptions::default())
}

#[test]
fn reopened_table_continues_the_script() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.jsonl");
    let script = load_script("s1_year_crossing.toml");

    let mut first = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
    for (index, step) in script.steps.iter().enumerate().take(2) {
        first
            .step(index, step, script.base_time)
            .unwrap()
            .verify(step)
            .unwrap();
    }
    let stored = first.into_table().len();

    let reopened = JsonlActiveTable::open(&path, Windows::default()).unwrap();
    assert_eq!(reopened.len(), stored);
    let mut second = jsonl_runner(reopened);
    let outcome = second.step(2, &script.steps[2], script.base_time).unwrap();
    outcome.verify(&script.steps[2]).unwrap();
    assert_eq!(
        lines(&outcome),
        vec!["/O.EXP.KTBW.DU.Y.0001.000000T0000Z-100101T1200Z/"]
    );
}

#[test]
fn reopened_pool_does_not_reuse_numbers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.jsonl");
    let script = Script::from_toml(
        r#"
        base_time = "2010-01-01T00:00:00Z"

        [[steps]]
        [[steps.hazards]]
        phen_sig = "WS.W"
        zones = ["FLZ039"]
        start = 0
        end = 6

        [[steps]]
        offset_hours = 12
        [[steps.hazards]]
        phen_sig = "WS.W"
        zones = ["FLZ039"]
        start = 12
        end = 18
        "#,
    )
    .unwrap();

    let mut first = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
    first.step(0, &script.steps[0], script.base_time).unwrap();
    drop(first);

    let mut second = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
    let outcome = second.step(1, &script.steps[1], script.base_time).unwrap();
    assert_eq!(
        lines(&outcome),
        vec!["/O.NEW.KTBW.WS.W.0002.100101T1200Z-100101T1800Z/"]
    );
}

#[test]
fn purged_event_numbers_are_not_reissued() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.jsonl");
    let script = Script::from_toml(
        r#"
        base_time = "2010-01-01T00:00:00Z"

        [[steps]]
        [[steps.hazards]]
        phen_sig = "WS.W"
        zones = ["FLZ039"]
        start = 0
        end = 6

        [[steps]]
        offset_hours = 48
        [[steps.hazards]]
        phen_sig = "WS.W"
        zones = ["FLZ039"]
        start = 48
        end = 54
        "#,
    )
    .unwrap();

    let mut first = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
    first.step(0, &script.steps[0], script.base_time).unwrap();
    let mut table = first.into_table();
    let removed = table
        .purge(script.base_time.saturating_add_ms(24 * HOUR_MS))
        .unwrap();
    assert_eq!(removed, 1);
    drop(table);

    let reopened = JsonlActiveTable::open(&path, Windows::default()).unwrap();
    assert!(reopened.is_empty());
    let mut second = jsonl_runner(reopened);
    let outcome = second.step(1, &script.steps[1], script.base_time).unwrap();
    assert_eq!(
        lines(&outcome),
        vec!["/O.NEW.KTBW.WS.W.0002.100103T0000Z-100103T0600Z/"]
    );
}

#[test]
fn purge_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.jsonl");
    let script = load_script("upgrade.toml");
    let mut runner = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
    runner.run(&script).unwrap();
    let mut table = runner.into_table();
    assert_eq!(table.len(), 3);

    let later = script.base_time.saturating_add_ms(48 * HOUR_MS);
    assert_eq!(table.purge(later).unwrap(), 3);
    let reopened = JsonlActiveTable::open(&path, Windows::default()).unwrap();
    assert!(reopened.is_empty());
}

const ZONES: [&str; 3] = ["FLZ039", "FLZ042", "FLZ048"];
const PHEN_SIGS: [&str; 2] = ["WS.A", "WS.W"];

#[derive(Debug, Clone)]
struct GenHazard {
    phen_sig: usize,
    zones: Vec<usize>,
    start: u8,
    hours: u8,
}

fn gen_hazard() -> impl Strategy<Value = GenHazard> {
    (
        0..PHEN_SIGS.len(),
        proptest::sample::subsequence((0..ZONES.len()).collect::<Vec<_>>(), 1..=ZONES.len()),
        0u8..24,
        1u8..24,
    )
        .prop_map(|(phen_sig, zones, start, hours)| GenHazard {
            phen_sig,
            zones,
            start,
            hours,
        })
}

fn build_script(steps: &[Vec<GenHazard>]) -> Script {
    let steps: Vec<_> = steps
        .iter()
        .enumerate()
        .map(|(index, hazards)| {
            let hazards: Vec<_> = hazards
                .iter()
                .map(|h| {
                    let zones: Vec<&str> = h.zones.iter().map(|z| ZONES[*z]).collect();
                    json!({
                        "phen_sig": PHEN_SIGS[h.phen_sig],
                        "zones": zones,
                        "start": h.start,
                        "end": u16::from(h.start) + u16::from(h.hours),
                    })
                })
                .collect();
            json!({ "offset_hours": index * 2, "hazards": hazards })
        })
        .collect();
    let raw = json!({ "base_time": "2010-01-01T00:00:00Z", "steps": steps });
    Script::from_json(&raw.to_string()).expect("generated script")
}

/// Products per step, or the first error's message.
fn drive<T>(runner: &mut Runner<T>, script: &Script) -> Vec<Result<String, String>>
where
    T: ActiveTable,
    vtec_rs::Error: From<T::Error>,
{
    let mut products = Vec::new();
    for (index, step) in script.steps.iter().enumerate() {
        match runner.step(index, step, script.base_time) {
            Ok(outcome) => products.push(Ok(outcome.product)),
            Err(e) => {
                products.push(Err(e.to_string()));
                break;
            }
        }
    }
    products
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn jsonl_table_matches_memory_table(
        steps in proptest::collection::vec(proptest::collection::vec(gen_hazard(), 0..3), 1..5)
    ) {
        let script = build_script(&steps);
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("active.jsonl");

        let mut memory = memory_runner();
        let mut jsonl = jsonl_runner(JsonlActiveTable::open(&path, Windows::default()).unwrap());
        prop_assert_eq!(drive(&mut memory, &script), drive(&mut jsonl, &script));

        // Whatever was written reloads into the same records.
        let reloaded = JsonlActiveTable::open(&path, Windows::default()).unwrap();
        prop_assert_eq!(reloaded.records(), memory.table().records());
        prop_assert_eq!(reloaded.pool(), memory.pool().clone());
    }
}
