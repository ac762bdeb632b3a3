//! Canonical per-zone hazard intervals.

use std::collections::BTreeMap;

use crate::domain::{HazardStatus, PhenSig};
use crate::hazard::Hazard;
use crate::identity::{Etn, EventId, ZoneId};
use crate::time::Timestamp;
use crate::zone::ZoneSet;

/// A single-zone hazard plus the input position it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Canonical {
    pub origin: usize,
    pub hazard: Hazard,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct IntervalKey {
    zone: ZoneId,
    phen_sig: PhenSig,
    event_id: Option<EventId>,
    segment_tag: Option<u32>,
    ending: bool,
    etn: Option<Etn>,
}

/// Drops withdrawn and already-ended hazards, then unions overlapping or
/// abutting intervals per (zone, phen/sig, event id, tag, ending, ETN).
///
/// Disjoint intervals (waves) stay separate.
pub(crate) fn canonicalize(hazards: &[Hazard], issue_time: Timestamp) -> Vec<Canonical> {
    let mut intervals: BTreeMap<IntervalKey, Vec<(Timestamp, Timestamp, usize)>> =
        BTreeMap::new();
    for (origin, hazard) in hazards.iter().enumerate() {
        if hazard.is_withdrawn() {
            tracing::debug!(%hazard, "dropping withdrawn hazard");
            continue;
        }
        if hazard.effective_end() <= issue_time {
            tracing::debug!(%hazard, "dropping hazard that has already ended");
            continue;
        }
        for zone in &hazard.zones {
            let key = IntervalKey {
                zone: zone.clone(),
                phen_sig: hazard.phen_sig,
                event_id: hazard.event_id.clone(),
                segment_tag: hazard.segment_tag,
                ending: hazard.is_ending(),
                etn: hazard.etn,
            };
            intervals
                .entry(key)
                .or_default()
                .push((hazard.start, hazard.effective_end(), origin));
        }
    }

    let mut out = Vec::new();
    for (key, mut spans) in intervals {
        spans.sort();
        let mut merged: Vec<(Timestamp, Timestamp, usize)> = Vec::new();
        for (start, end, origin) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => {
                    last.1 = last.1.max(end);
                    last.2 = last.2.min(origin);
                }
                _ => merged.push((start, end, origin)),
            }
        }
        for (start, end, origin) in merged {
            let mut hazard = Hazard::new(
                key.phen_sig,
                ZoneSet::single(key.zone.clone()),
                start,
                end,
            );
            hazard.ufn = end.is_ufn();
            hazard.event_id = key.event_id.clone();
            hazard.segment_tag = key.segment_tag;
            hazard.etn = key.etn;
            if key.ending {
                hazard.status = Some(HazardStatus::Ending);
            }
            out.push(Canonical { origin, hazard });
        }
    }
    out
}
