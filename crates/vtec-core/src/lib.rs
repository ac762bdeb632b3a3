//! VTEC event-tracking engine (Layers 0-6)
//!
//! Module hierarchy follows type dependency order:
//! - time: Timestamp and VTEC time rendering (Layer 0)
//! - identity: Office, ZoneId, Etn, EventId (Layer 1)
//! - domain: Significance, PhenSig, Action, HazardStatus, ProductClass (Layer 2)
//! - zone: ZoneSet algebra and UGC header codec (Layer 3)
//! - hazard / record: proposed hazards and active-table records (Layer 4)
//! - active_table / etn / merge / vtec: storage seam, ETN pool, segment merger,
//!   line codec (Layer 5)
//! - engine: classify + commit (Layer 6)

#![forbid(unsafe_code)]

// Re-export enum_str! macro from vtec-macros for internal use and downstream consumers
pub use vtec_macros::enum_str;

pub mod active_table;
pub mod domain;
pub mod effect;
pub mod engine;
pub mod error;
pub mod etn;
pub mod hazard;
pub mod identity;
pub mod merge;
pub mod record;
pub mod time;
pub mod vtec;
pub mod windows;
pub mod zone;

pub use active_table::{ActiveTable, MemoryActiveTable};
pub use domain::{Action, HazardStatus, PhenSig, ProductClass, Significance};
pub use effect::{Effect, Transience};
pub use engine::{ClassifyOptions, Segment, classify, commit};
pub use error::{
    ActiveTableError, ClassifyError, CoreError, EtnExhausted, HazardProblem, InvalidId,
    InvalidTime, VtecParseError, ZoneHeaderError,
};
pub use etn::{EtnKey, EtnPool, EtnReservations, etn_year};
pub use hazard::Hazard;
pub use identity::{Etn, EventId, Office, ZoneId};
pub use merge::{MergeKey, MergedSegment, merge_segments};
pub use record::{ActiveRecord, EventKey};
pub use time::{HOUR_MS, MINUTE_MS, SECOND_MS, Timestamp};
pub use vtec::VtecLine;
pub use windows::Windows;
pub use zone::{DEFAULT_HEADER_WIDTH, ZoneSet};
