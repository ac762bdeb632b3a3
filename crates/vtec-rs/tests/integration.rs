#[path = "integration/fixtures/mod.rs"]
mod fixtures;

#[path = "integration/scenarios.rs"]
mod scenarios;
#[path = "integration/features.rs"]
mod features;
#[path = "integration/storage.rs"]
mod storage;
#[path = "integration/cli.rs"]
mod cli;
