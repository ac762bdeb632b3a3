//! Property tests over random issuance sequences.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use crate::active_table::{ActiveTable, MemoryActiveTable};
use crate::domain::{Action, PhenSig};
use crate::etn::EtnPool;
use crate::hazard::Hazard;
use crate::identity::{Etn, Office, ZoneId};
use crate::time::{HOUR_MS, Timestamp};
use crate::vtec::VtecLine;
use crate::zone::ZoneSet;

use super::{ClassifyOptions, classify, commit};

const ZONES: [&str; 4] = ["FLZ039", "FLZ042", "FLZ048", "FLZ049"];
const PHEN_SIGS: [&str; 4] = ["WS.A", "WS.W", "WI.Y", "FL.W"];

#[derive(Clone, Debug)]
struct RawHazard {
    phen_sig: usize,
    zones: Vec<usize>,
    start_h: i64,
    len_h: i64,
}

#[derive(Clone, Debug)]
struct RawStep {
    advance_h: i64,
    hazards: Vec<RawHazard>,
}

fn hazard_strategy() -> impl Strategy<Value = RawHazard> {
    (
        0..PHEN_SIGS.len(),
        prop::collection::vec(0..ZONES.len(), 1..4),
        -2i64..36,
        1i64..24,
    )
        .prop_map(|(phen_sig, zones, start_h, len_h)| RawHazard {
            phen_sig,
            zones,
            start_h,
            len_h,
        })
}

fn steps_strategy() -> impl Strategy<Value = Vec<RawStep>> {
    prop::collection::vec(
        (1i64..8, prop::collection::vec(hazard_strategy(), 0..4))
            .prop_map(|(advance_h, hazards)| RawStep { advance_h, hazards }),
        1..6,
    )
}

fn base() -> Timestamp {
    // Sequences start late on Dec 31 so most of them cross a year boundary.
    Timestamp::from_utc(2009, 12, 31, 12, 0).unwrap()
}

fn build(now: Timestamp, raw: &RawHazard) -> Hazard {
    let start = now.saturating_add_ms(raw.start_h * HOUR_MS);
    Hazard::new(
        PhenSig::parse(PHEN_SIGS[raw.phen_sig]).unwrap(),
        ZoneSet::make(raw.zones.iter().map(|z| ZoneId::new(ZONES[*z]).unwrap())),
        start,
        start.saturating_add_ms(raw.len_h * HOUR_MS),
    )
}

proptest! {
    #[test]
    fn issuance_sequences_hold_invariants(steps in steps_strategy()) {
        let office = Office::new("KTBW").unwrap();
        let options = ClassifyOptions::default();
        let mut table = MemoryActiveTable::new();
        let mut pool = EtnPool::new();
        let mut issued: BTreeSet<(PhenSig, i32, Etn)> = BTreeSet::new();
        let mut now = base();
        let mut latest_end = now;

        for step in &steps {
            now = now.saturating_add_ms(step.advance_h * HOUR_MS);
            let hazards: Vec<Hazard> = step.hazards.iter().map(|h| build(now, h)).collect();
            for h in &hazards {
                latest_end = latest_end.max(h.end);
            }

            let first = classify(&office, &hazards, &table, &pool, now, &options).unwrap();
            let second = classify(&office, &hazards, &table, &pool, now, &options).unwrap();
            prop_assert_eq!(&first, &second);

            let mut closures: BTreeMap<(ZoneId, PhenSig, i32, Etn), Action> = BTreeMap::new();
            for segment in &first {
                let parsed = VtecLine::parse(&segment.vtec).unwrap();
                prop_assert_eq!(&parsed, &segment.line);
                prop_assert_eq!(parsed.etn, segment.etn);

                let event = (segment.phen_sig, segment.etn_year, segment.etn);
                if segment.action == Action::New {
                    prop_assert_eq!(Some(segment.etn_year), now.year());
                    issued.insert(event);
                } else {
                    prop_assert!(issued.contains(&event), "{} refers to an unknown event", segment.vtec);
                }
                if matches!(segment.action, Action::Can | Action::Exp) {
                    for zone in &segment.zones {
                        let key = (zone.clone(), segment.phen_sig, segment.etn_year, segment.etn);
                        let previous = closures.insert(key, segment.action);
                        prop_assert!(previous.is_none(), "zone closed twice in {}", segment.vtec);
                    }
                }
            }
            commit(&mut table, &mut pool, &office, now, &first).unwrap();
        }

        // Long after everything ended nothing is in play and nothing is emitted.
        let later = latest_end.saturating_add_ms(6 * HOUR_MS);
        let segments = classify(&office, &[], &table, &pool, later, &options).unwrap();
        prop_assert!(segments.is_empty());
        let stored = table.len();
        prop_assert_eq!(table.purge(later).unwrap(), stored);
        prop_assert!(table.is_empty());
    }
}
