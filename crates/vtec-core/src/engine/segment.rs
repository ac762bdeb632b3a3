//! Output segments and their ordering.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Action, PhenSig, ProductClass};
use crate::identity::{Etn, EventId, Office, ZoneId};
use crate::time::Timestamp;
use crate::vtec::VtecLine;
use crate::zone::ZoneSet;

/// One output unit: a zone set sharing a single VTEC line.
///
/// Structured fields are carried next to the rendered line so formatters never
/// need to reparse it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub zones: ZoneSet,
    pub phen_sig: PhenSig,
    pub etn: Etn,
    pub etn_year: i32,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_action: Option<Action>,
    pub start: Timestamp,
    pub end: Timestamp,
    pub ufn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_tag: Option<u32>,
    pub line: VtecLine,
    pub vtec: String,
}

impl Segment {
    pub fn is_closing(&self) -> bool {
        self.action.is_closing()
    }
}

/// Per-zone outcome before regrouping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Decision {
    pub zone: ZoneId,
    pub phen_sig: PhenSig,
    pub etn: Etn,
    pub etn_year: i32,
    pub action: Action,
    pub prev_action: Option<Action>,
    pub start: Timestamp,
    pub end: Timestamp,
    pub ufn: bool,
    pub event_id: Option<EventId>,
    pub segment_tag: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    phen_sig: PhenSig,
    etn_year: i32,
    etn: Etn,
    action: Action,
    prev_action: Option<Action>,
    start: Timestamp,
    end: Timestamp,
    ufn: bool,
    event_id: Option<EventId>,
    segment_tag: Option<u32>,
}

/// Regroups per-zone decisions into ordered segments.
pub(crate) fn assemble(
    decisions: Vec<Decision>,
    office: &Office,
    class: ProductClass,
    issue_time: Timestamp,
) -> Vec<Segment> {
    let mut groups: BTreeMap<GroupKey, ZoneSet> = BTreeMap::new();
    for d in decisions {
        let key = GroupKey {
            phen_sig: d.phen_sig,
            etn_year: d.etn_year,
            etn: d.etn,
            action: d.action,
            prev_action: d.prev_action,
            start: d.start,
            end: d.end,
            ufn: d.ufn,
            event_id: d.event_id,
            segment_tag: d.segment_tag,
        };
        groups.entry(key).or_default().insert(d.zone);
    }
    let mut segments: Vec<Segment> = groups
        .into_iter()
        .map(|(key, zones)| {
            let line = VtecLine {
                class,
                action: key.action,
                office: office.clone(),
                phen_sig: key.phen_sig,
                etn: key.etn,
                start: rendered_start(key.action, key.start, issue_time),
                end: (!key.ufn).then(|| key.end.floor_minute()),
            };
            Segment {
                zones,
                phen_sig: key.phen_sig,
                etn: key.etn,
                etn_year: key.etn_year,
                action: key.action,
                prev_action: key.prev_action,
                start: key.start,
                end: key.end,
                ufn: key.ufn,
                event_id: key.event_id,
                segment_tag: key.segment_tag,
                vtec: line.render(),
                line,
            }
        })
        .collect();
    segments.sort_by(product_order);
    segments
}

/// NEW always shows its start; everything else shows zeros once under way.
fn rendered_start(action: Action, start: Timestamp, issue_time: Timestamp) -> Option<Timestamp> {
    if action == Action::New || start > issue_time {
        Some(start.floor_minute())
    } else {
        None
    }
}

/// Closing actions lead; then descending end, descending start, phen/sig,
/// forced tag, ETN.
fn product_order(a: &Segment, b: &Segment) -> Ordering {
    b.is_closing()
        .cmp(&a.is_closing())
        .then_with(|| b.end.cmp(&a.end))
        .then_with(|| b.start.cmp(&a.start))
        .then_with(|| a.phen_sig.cmp(&b.phen_sig))
        .then_with(|| a.segment_tag.cmp(&b.segment_tag))
        .then_with(|| a.etn.cmp(&b.etn))
        .then_with(|| a.zones.cmp(&b.zones))
        .then_with(|| a.action.cmp(&b.action))
}
