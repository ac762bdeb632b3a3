//! Segment merger: groups proposed hazards that can share one VTEC line.

use std::collections::BTreeMap;

use crate::domain::PhenSig;
use crate::hazard::Hazard;
use crate::identity::{Etn, EventId};
use crate::time::Timestamp;
use crate::zone::ZoneSet;

/// Everything two hazards must agree on to share a segment.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MergeKey {
    pub phen_sig: PhenSig,
    pub start: Timestamp,
    pub end: Timestamp,
    pub ufn: bool,
    pub segment_tag: Option<u32>,
    pub event_id: Option<EventId>,
    pub ending: bool,
    pub etn: Option<Etn>,
}

impl MergeKey {
    pub fn of(hazard: &Hazard) -> Self {
        Self {
            phen_sig: hazard.phen_sig,
            start: hazard.start,
            end: hazard.effective_end(),
            ufn: hazard.ufn,
            segment_tag: hazard.segment_tag,
            event_id: hazard.event_id.clone(),
            ending: hazard.is_ending(),
            etn: hazard.etn,
        }
    }
}

/// Hazards sharing one key, with the union of their zones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedSegment {
    pub key: MergeKey,
    pub zones: ZoneSet,
    /// Input positions of the contributing hazards, ascending.
    pub sources: Vec<usize>,
}

/// Merges hazards into the minimal list of segments.
///
/// Output order: descending end, descending start, ascending phen/sig, then
/// forced-segment tag. Waves of one phen/sig over the same zone at different
/// times stay separate segments.
pub fn merge_segments(hazards: &[Hazard]) -> Vec<MergedSegment> {
    let mut groups: BTreeMap<MergeKey, (ZoneSet, Vec<usize>)> = BTreeMap::new();
    for (index, hazard) in hazards.iter().enumerate() {
        let (zones, sources) = groups.entry(MergeKey::of(hazard)).or_default();
        *zones = zones.union(&hazard.zones);
        sources.push(index);
    }
    let mut segments: Vec<MergedSegment> = groups
        .into_iter()
        .map(|(key, (zones, sources))| MergedSegment {
            key,
            zones,
            sources,
        })
        .collect();
    segments.sort_by(|a, b| {
        b.key
            .end
            .cmp(&a.key.end)
            .then_with(|| b.key.start.cmp(&a.key.start))
            .then_with(|| a.key.phen_sig.cmp(&b.key.phen_sig))
            .then_with(|| a.key.segment_tag.cmp(&b.key.segment_tag))
            .then_with(|| a.key.cmp(&b.key))
    });
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::HOUR_MS;

    fn hazard(ps: &str, zones: &[&str], start: i64, end: i64) -> Hazard {
        Hazard::new(
            PhenSig::parse(ps).unwrap(),
            ZoneSet::parse(zones).unwrap(),
            Timestamp::from_millis(start * HOUR_MS),
            Timestamp::from_millis(end * HOUR_MS),
        )
    }

    #[test]
    fn identical_timing_merges_zones() {
        let merged = merge_segments(&[
            hazard("WS.W", &["FLZ039"], 0, 12),
            hazard("WS.W", &["FLZ042"], 0, 12),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].zones.encode(), "FLZ039-042-");
        assert_eq!(merged[0].sources, vec![0, 1]);
    }

    #[test]
    fn forced_tag_blocks_merging() {
        let merged = merge_segments(&[
            hazard("WS.W", &["FLZ039"], 0, 12).with_segment_tag(1),
            hazard("WS.W", &["FLZ042"], 0, 12).with_segment_tag(2),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].key.segment_tag, Some(1));
    }

    #[test]
    fn waves_stay_separate_and_order_by_end_desc() {
        let merged = merge_segments(&[
            hazard("WW.Y", &["FLZ039"], 0, 6),
            hazard("WW.Y", &["FLZ039"], 12, 18),
            hazard("WW.Y", &["FLZ039"], 24, 30),
            hazard("WS.A", &["FLZ039"], 24, 30),
        ]);
        let order: Vec<(String, i64)> = merged
            .iter()
            .map(|s| (s.key.phen_sig.to_string(), s.key.end.millis() / HOUR_MS))
            .collect();
        assert_eq!(
            order,
            vec![
                ("WS.A".to_string(), 30),
                ("WW.Y".to_string(), 30),
                ("WW.Y".to_string(), 18),
                ("WW.Y".to_string(), 6),
            ]
        );
    }
}
