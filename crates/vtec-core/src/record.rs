//! Active-table records and event identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Action, PhenSig};
use crate::error::ActiveTableError;
use crate::identity::{Etn, EventId, Office, ZoneId};
use crate::time::Timestamp;

/// Identity of one event: ETNs are only unique per (office, phen/sig, year).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub office: Office,
    pub phen_sig: PhenSig,
    pub etn_year: i32,
    pub etn: Etn,
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKey({self})")
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}/{}",
            self.office, self.phen_sig, self.etn, self.etn_year
        )
    }
}

/// One issued VTEC action for one zone. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRecord {
    pub office: Office,
    pub phen_sig: PhenSig,
    pub etn: Etn,
    /// Pool year the ETN was drawn from; carried unchanged from NEW onwards.
    pub etn_year: i32,
    pub zone: ZoneId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub issue_time: Timestamp,
    pub action: Action,
    #[serde(default)]
    pub ufn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_action: Option<Action>,
}

impl ActiveRecord {
    pub fn key(&self) -> EventKey {
        EventKey {
            office: self.office.clone(),
            phen_sig: self.phen_sig,
            etn_year: self.etn_year,
            etn: self.etn,
        }
    }

    /// True once a CAN/EXP/UPG closed the event in this zone.
    pub fn is_closed(&self) -> bool {
        self.action.is_closing()
    }

    /// End of the record's in-play life: closures stop counting at issue time.
    pub fn effective_end(&self) -> Timestamp {
        if self.is_closed() {
            self.end.min(self.issue_time)
        } else {
            self.end
        }
    }

    /// Same (event, zone, start, end, issue time): the duplicate key.
    pub fn duplicates(&self, other: &ActiveRecord) -> bool {
        self.key() == other.key()
            && self.zone == other.zone
            && self.start == other.start
            && self.end == other.end
            && self.issue_time == other.issue_time
    }

    /// Invariants checked on append.
    pub fn check(&self) -> Result<(), ActiveTableError> {
        let invalid = |reason: &str| ActiveTableError::InvalidRecord {
            event: self.key().to_string(),
            zone: self.zone.clone(),
            reason: reason.to_string(),
        };
        if self.etn.is_routine() {
            return Err(invalid("etn 0000 is reserved"));
        }
        if !self.action.is_recorded() {
            return Err(invalid("ROU actions are never recorded"));
        }
        if self.start > self.end {
            return Err(invalid("start is after end"));
        }
        if self.ufn != self.end.is_ufn() {
            return Err(invalid("ufn flag disagrees with end time"));
        }
        if self.prev_action.is_some() && self.action != Action::Cor {
            return Err(invalid("only COR carries a previous action"));
        }
        Ok(())
    }
}
