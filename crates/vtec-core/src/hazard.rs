//! Proposed hazards: the forecaster's intent for the next issuance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{HazardStatus, PhenSig};
use crate::error::HazardProblem;
use crate::identity::{Etn, EventId};
use crate::time::Timestamp;
use crate::zone::ZoneSet;

/// An intent to issue one phen/sig over a zone set and time range.
///
/// Hazards are created by callers and never mutated by the engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    pub phen_sig: PhenSig,
    pub zones: ZoneSet,
    pub start: Timestamp,
    pub end: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HazardStatus>,
    /// Forced-segment grouping key; hazards with different tags never share a segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_tag: Option<u32>,
    /// Caller-forced ETN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etn: Option<Etn>,
    #[serde(default)]
    pub ufn: bool,
}

impl Hazard {
    pub fn new(phen_sig: PhenSig, zones: ZoneSet, start: Timestamp, end: Timestamp) -> Self {
        Self {
            phen_sig,
            zones,
            start,
            end,
            event_id: None,
            status: None,
            segment_tag: None,
            etn: None,
            ufn: false,
        }
    }

    /// An until-further-notice hazard starting at `start`.
    pub fn until_further_notice(phen_sig: PhenSig, zones: ZoneSet, start: Timestamp) -> Self {
        Self {
            ufn: true,
            ..Self::new(phen_sig, zones, start, Timestamp::MAX)
        }
    }

    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn with_status(mut self, status: HazardStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_segment_tag(mut self, tag: u32) -> Self {
        self.segment_tag = Some(tag);
        self
    }

    pub fn with_etn(mut self, etn: Etn) -> Self {
        self.etn = Some(etn);
        self
    }

    /// Effective end: `Timestamp::MAX` for UFN hazards.
    pub fn effective_end(&self) -> Timestamp {
        if self.ufn { Timestamp::MAX } else { self.end }
    }

    pub fn is_ending(&self) -> bool {
        self.status == Some(HazardStatus::Ending)
    }

    pub fn is_withdrawn(&self) -> bool {
        self.status.is_some_and(HazardStatus::is_withdrawn)
    }

    /// Structural checks that do not depend on the active table.
    pub fn check(&self) -> Result<(), HazardProblem> {
        if self.zones.is_empty() {
            return Err(HazardProblem::EmptyZones);
        }
        if self.start > self.effective_end() {
            return Err(HazardProblem::NonMonotonic {
                start: self.start,
                end: self.end,
            });
        }
        for at in [self.start, self.effective_end()] {
            if !at.is_vtec_encodable() {
                return Err(HazardProblem::OutOfRange { at });
            }
        }
        if self.etn.is_some_and(Etn::is_routine) {
            return Err(HazardProblem::EtnInUse {
                etn: Etn::ROUTINE.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hazard({self})")
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} - {}",
            self.phen_sig,
            self.zones,
            self.start,
            self.effective_end()
        )?;
        if let Some(event_id) = &self.event_id {
            write!(f, " event {event_id}")?;
        }
        if let Some(status) = self.status {
            write!(f, " [{status}]")?;
        }
        Ok(())
    }
}
