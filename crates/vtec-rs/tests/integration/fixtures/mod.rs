//! Shared helpers: script lookup and runners over fresh tables.

#![allow(dead_code)]

use std::path::PathBuf;

use vtec_rs::core::{ClassifyOptions, EtnPool, MemoryActiveTable, Office};
use vtec_rs::harness::{Runner, Script, StepOutcome};

pub fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("scripts")
}

pub fn script_path(name: &str) -> PathBuf {
    scripts_dir().join(name)
}

pub fn load_script(name: &str) -> Script {
    Script::load(&script_path(name)).unwrap_or_else(|e| panic!("load {name}: {e}"))
}

pub fn office() -> Office {
    Office::new("KTBW").expect("office")
}

pub fn memory_runner() -> Runner<MemoryActiveTable> {
    Runner::new(
        office(),
        MemoryActiveTable::new(),
        EtnPool::new(),
        ClassifyOptions::default(),
    )
}

/// Runs a bundled script to completion, panicking with the failed expectation.
pub fn run_script(name: &str) -> (Runner<MemoryActiveTable>, Vec<StepOutcome>) {
    let script = load_script(name);
    let mut runner = memory_runner();
    let outcomes = runner
        .run(&script)
        .unwrap_or_else(|e| panic!("{name}: {e}"));
    (runner, outcomes)
}

/// VTEC lines of one step, in product order.
pub fn lines(outcome: &StepOutcome) -> Vec<&str> {
    outcome.segments.iter().map(|s| s.vtec.as_str()).collect()
}
