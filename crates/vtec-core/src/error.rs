//! Core capability errors (parsing, validation, classification).
//!
//! These are bounded and stable: core errors describe refused inputs and
//! inconsistent state, never library implementation details.

use thiserror::Error;

use crate::effect::{Effect, Transience};
use crate::identity::ZoneId;
use crate::time::Timestamp;

/// Invalid identifier or code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("office `{raw}` is invalid: {reason}")]
    Office { raw: String, reason: String },
    #[error("zone id `{raw}` is invalid: {reason}")]
    Zone { raw: String, reason: String },
    #[error("etn `{raw}` is invalid: {reason}")]
    Etn { raw: String, reason: String },
    #[error("phen/sig `{raw}` is invalid: {reason}")]
    PhenSig { raw: String, reason: String },
    #[error("action `{raw}` is invalid: {reason}")]
    Action { raw: String, reason: String },
    #[error("event id `{raw}` is invalid: {reason}")]
    EventId { raw: String, reason: String },
}

/// Unparseable or out-of-range time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("time `{raw}` is invalid: {reason}")]
pub struct InvalidTime {
    pub raw: String,
    pub reason: String,
}

/// What is wrong with one proposed hazard.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HazardProblem {
    #[error("zone set is empty")]
    EmptyZones,
    #[error("start {start} is after end {end}")]
    NonMonotonic { start: Timestamp, end: Timestamp },
    #[error("time {at} cannot be written as a two-digit VTEC year")]
    OutOfRange { at: Timestamp },
    #[error("forced etn {etn} is already in use by a live event")]
    EtnInUse { etn: String },
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
}

/// Malformed VTEC line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("vtec line `{raw}` is invalid: {reason}")]
pub struct VtecParseError {
    pub raw: String,
    pub reason: String,
}

/// Malformed UGC zone header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("zone header `{raw}` is invalid: {reason}")]
pub struct ZoneHeaderError {
    pub raw: String,
    pub reason: String,
}

/// Active-table write refusals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActiveTableError {
    #[error("duplicate record for {event} zone {zone} ({start} - {end}) issued {issued}")]
    DuplicateRecord {
        event: String,
        zone: ZoneId,
        start: Timestamp,
        end: Timestamp,
        issued: Timestamp,
    },
    #[error("record for {event} zone {zone} is invalid: {reason}")]
    InvalidRecord {
        event: String,
        zone: ZoneId,
        reason: String,
    },
}

impl ActiveTableError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// ETN space for (office, phen/sig, year) is used up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("etn space exhausted for {office}.{phen_sig} in {year}")]
pub struct EtnExhausted {
    pub office: String,
    pub phen_sig: String,
    pub year: i32,
}

/// Fatal classification failure. Partial output is never returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassifyError {
    #[error("hazard #{index} ({hazard}) is invalid: {problem}")]
    InvalidHazard {
        index: usize,
        hazard: String,
        problem: HazardProblem,
    },
    #[error("active table is inconsistent for {event} zone {zone}: {reason}")]
    StateInconsistency {
        event: String,
        zone: ZoneId,
        reason: String,
    },
    #[error(transparent)]
    EtnExhaustion(#[from] EtnExhausted),
}

impl ClassifyError {
    pub fn transience(&self) -> Transience {
        // Recovery is a forecaster correcting inputs, never a blind retry.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Canonical error enum for core capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    InvalidTime(#[from] InvalidTime),
    #[error(transparent)]
    VtecParse(#[from] VtecParseError),
    #[error(transparent)]
    ZoneHeader(#[from] ZoneHeaderError),
    #[error(transparent)]
    ActiveTable(#[from] ActiveTableError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        match self {
            CoreError::ActiveTable(e) => e.effect(),
            CoreError::Classify(e) => e.effect(),
            _ => Effect::None,
        }
    }
}
