//! File-backed active tables.

mod jsonl;

pub use jsonl::JsonlActiveTable;
