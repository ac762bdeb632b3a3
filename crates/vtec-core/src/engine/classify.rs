//! Classification: pair proposals with live records and decide each zone's action.
//!
//! Two phases. The merger fixes the segmentation of the proposed hazards; then
//! every (segment, zone) proposal is paired against the live records of its
//! phen/sig in four passes (exact timing, overlap, area expansion, NEW) and
//! every live record left unclaimed is closed.

use std::collections::{BTreeMap, BTreeSet};

use crate::active_table::ActiveTable;
use crate::domain::{Action, PhenSig};
use crate::error::{ClassifyError, HazardProblem};
use crate::etn::{EtnKey, EtnPool, EtnReservations, etn_year};
use crate::hazard::Hazard;
use crate::identity::{Etn, EventId, Office, ZoneId};
use crate::merge::merge_segments;
use crate::record::ActiveRecord;
use crate::time::Timestamp;
use crate::zone::ZoneSet;

use super::ClassifyOptions;
use super::canonical::{Canonical, canonicalize};
use super::segment::{Decision, Segment, assemble};

/// Computes the VTEC segments for one issuance.
///
/// Pure with respect to `table` and `pool`: nothing is written until the
/// caller commits the returned segments. Any invalid hazard fails the whole
/// call.
pub fn classify<T: ActiveTable>(
    office: &Office,
    hazards: &[Hazard],
    table: &T,
    pool: &EtnPool,
    issue_time: Timestamp,
    options: &ClassifyOptions,
) -> Result<Vec<Segment>, ClassifyError> {
    let span = tracing::info_span!(
        "classify",
        office = %office,
        issue_time = %issue_time,
        hazards = hazards.len()
    );
    let _guard = span.enter();

    for (index, hazard) in hazards.iter().enumerate() {
        hazard
            .check()
            .map_err(|problem| invalid_hazard(index, hazard, problem))?;
    }

    let canonical = canonicalize(hazards, issue_time);
    let decisions = if options.routine {
        routine(&canonical, issue_time)
    } else {
        let mut run = Classifier::new(office, hazards, table, pool, issue_time, options);
        run.propose(&canonical);
        run.load()?;
        run.pair_exact();
        run.pair_overlapping();
        run.expand_areas();
        run.issue_new()?;
        run.close();
        run.upgrade();
        run.correct();
        run.decisions
    };

    let segments = assemble(decisions, office, options.product_class, issue_time);
    tracing::debug!(segments = segments.len(), "classified");
    Ok(segments)
}

fn invalid_hazard(index: usize, hazard: &Hazard, problem: HazardProblem) -> ClassifyError {
    ClassifyError::InvalidHazard {
        index,
        hazard: hazard.to_string(),
        problem,
    }
}

/// Routine products: every merged segment goes out as ROU with ETN 0000.
fn routine(canonical: &[Canonical], issue_time: Timestamp) -> Vec<Decision> {
    let hazards: Vec<Hazard> = canonical.iter().map(|c| c.hazard.clone()).collect();
    let year = etn_year(issue_time);
    let mut decisions = Vec::new();
    for segment in merge_segments(&hazards) {
        for zone in &segment.zones {
            decisions.push(Decision {
                zone: zone.clone(),
                phen_sig: segment.key.phen_sig,
                etn: Etn::ROUTINE,
                etn_year: year,
                action: Action::Rou,
                prev_action: None,
                start: segment.key.start,
                end: segment.key.end,
                ufn: segment.key.ufn,
                event_id: segment.key.event_id.clone(),
                segment_tag: segment.key.segment_tag,
            });
        }
    }
    decisions
}

/// One (merged segment, zone) pair awaiting a decision.
#[derive(Clone, Debug)]
struct Proposal {
    segment: usize,
    origin: usize,
    zone: ZoneId,
    phen_sig: PhenSig,
    event_id: Option<EventId>,
    segment_tag: Option<u32>,
    etn: Option<Etn>,
    start: Timestamp,
    end: Timestamp,
    ufn: bool,
    ending: bool,
    done: bool,
}

/// (phen/sig, etn year, etn): one event.
type FamilyKey = (PhenSig, i32, Etn);

/// A continuing time range of a family in this product.
#[derive(Clone, Copy, Debug)]
struct Continuing {
    start: Timestamp,
    end: Timestamp,
    unchanged: bool,
}

/// Live records sharing one ETN.
#[derive(Debug, Default)]
struct Family {
    /// Authoritative live record per zone.
    records: BTreeMap<ZoneId, ActiveRecord>,
    /// Proposal index claiming each zone's record.
    claims: BTreeMap<ZoneId, usize>,
    /// Every zone the event has ever covered.
    ever: BTreeSet<ZoneId>,
    /// Zones the event covers in this product.
    current: BTreeSet<ZoneId>,
    continuing: Vec<Continuing>,
    event_id: Option<EventId>,
}

/// Events issued NEW in this call.
#[derive(Debug)]
struct NewGroup {
    phen_sig: PhenSig,
    event_id: Option<EventId>,
    etn: Etn,
    zones: BTreeSet<ZoneId>,
    start: Timestamp,
    end: Timestamp,
}

struct Classifier<'a, T: ActiveTable> {
    office: &'a Office,
    hazards: &'a [Hazard],
    table: &'a T,
    issue_time: Timestamp,
    options: &'a ClassifyOptions,
    reservations: EtnReservations<'a, T>,
    segment_zones: Vec<ZoneSet>,
    proposals: Vec<Proposal>,
    families: BTreeMap<FamilyKey, Family>,
    closable: BTreeSet<PhenSig>,
    decisions: Vec<Decision>,
}

impl<'a, T: ActiveTable> Classifier<'a, T> {
    fn new(
        office: &'a Office,
        hazards: &'a [Hazard],
        table: &'a T,
        pool: &'a EtnPool,
        issue_time: Timestamp,
        options: &'a ClassifyOptions,
    ) -> Self {
        Self {
            office,
            hazards,
            table,
            issue_time,
            options,
            reservations: EtnReservations::new(pool, table),
            segment_zones: Vec::new(),
            proposals: Vec::new(),
            families: BTreeMap::new(),
            closable: BTreeSet::new(),
            decisions: Vec::new(),
        }
    }

    /// Explodes merged segments into per-zone proposals.
    fn propose(&mut self, canonical: &[Canonical]) {
        let hazards: Vec<Hazard> = canonical.iter().map(|c| c.hazard.clone()).collect();
        for (index, segment) in merge_segments(&hazards).into_iter().enumerate() {
            let origin = segment
                .sources
                .iter()
                .map(|i| canonical[*i].origin)
                .min()
                .unwrap_or_default();
            for zone in &segment.zones {
                self.proposals.push(Proposal {
                    segment: index,
                    origin,
                    zone: zone.clone(),
                    phen_sig: segment.key.phen_sig,
                    event_id: segment.key.event_id.clone(),
                    segment_tag: segment.key.segment_tag,
                    etn: segment.key.etn,
                    start: segment.key.start,
                    end: segment.key.end,
                    ufn: segment.key.ufn,
                    ending: segment.key.ending,
                    done: false,
                });
            }
            self.segment_zones.push(segment.zones);
        }
    }

    /// Loads live families for every phen/sig this product touches.
    fn load(&mut self) -> Result<(), ClassifyError> {
        let proposed: BTreeSet<PhenSig> = self.proposals.iter().map(|p| p.phen_sig).collect();
        let responsible = match &self.options.hazard_filter {
            Some(filter) => filter.clone(),
            None => self.table.live_phen_sigs(self.office, self.issue_time),
        };
        self.closable = proposed.union(&responsible).copied().collect();

        for phen_sig in self.closable.clone() {
            for record in self.table.query(self.office, phen_sig, self.issue_time) {
                let key = (phen_sig, record.etn_year, record.etn);
                let family = self.families.entry(key).or_default();
                if family.event_id.is_none() {
                    family.event_id = record.event_id.clone();
                }
                family.records.insert(record.zone.clone(), record);
            }
        }

        for (&(phen_sig, year, etn), family) in &mut self.families {
            let mut seen: BTreeSet<(ZoneId, Timestamp)> = BTreeSet::new();
            for record in self
                .table
                .query_by_etn(self.office, phen_sig, etn)
                .into_iter()
                .filter(|r| r.etn_year == year)
            {
                if !seen.insert((record.zone.clone(), record.issue_time)) {
                    return Err(ClassifyError::StateInconsistency {
                        event: record.key().to_string(),
                        zone: record.zone,
                        reason: format!("two records issued at {}", record.issue_time),
                    });
                }
                family.ever.insert(record.zone);
            }
        }
        tracing::debug!(
            families = self.families.len(),
            proposals = self.proposals.len(),
            "loaded live events"
        );
        Ok(())
    }

    /// Starts are equal when identical or when both are already under way.
    fn same_start(&self, a: Timestamp, b: Timestamp) -> bool {
        a == b || (a <= self.issue_time && b <= self.issue_time)
    }

    fn same_timing(&self, proposal: &Proposal, start: Timestamp, end: Timestamp) -> bool {
        self.same_start(proposal.start, start) && proposal.end == end
    }

    fn start_distance(&self, a: Timestamp, b: Timestamp) -> i64 {
        if self.same_start(a, b) {
            0
        } else {
            a.distance_ms(b)
        }
    }

    /// Proposal indices in (start, end, segment, zone) order.
    fn pending_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.proposals.len())
            .filter(|i| !self.proposals[*i].done)
            .collect();
        order.sort_by(|a, b| {
            let (pa, pb) = (&self.proposals[*a], &self.proposals[*b]);
            (pa.start, pa.end, pa.segment, &pa.zone).cmp(&(pb.start, pb.end, pb.segment, &pb.zone))
        });
        order
    }

    /// Unclaimed family records in `proposal`'s zone it may pair with directly.
    fn direct_candidates(&self, proposal: &Proposal) -> Vec<FamilyKey> {
        self.families
            .iter()
            .filter(|((ps, _, etn), family)| {
                *ps == proposal.phen_sig
                    && proposal.etn.is_none_or(|forced| forced == *etn)
                    && family.event_id == proposal.event_id
                    && family.records.contains_key(&proposal.zone)
                    && !family.claims.contains_key(&proposal.zone)
            })
            .map(|(key, _)| *key)
            .collect()
    }

    /// First pass: proposals whose timing equals a live record's.
    fn pair_exact(&mut self) {
        for index in self.pending_order() {
            let proposal = self.proposals[index].clone();
            let best = self
                .direct_candidates(&proposal)
                .into_iter()
                .filter(|key| {
                    let record = &self.families[key].records[&proposal.zone];
                    self.same_timing(&proposal, record.start, record.end)
                })
                .min_by_key(|(_, year, etn)| (*etn, *year));
            if let Some(key) = best {
                self.claim(index, key);
            }
        }
    }

    /// Second pass: remaining proposals, in start order, claim the closest
    /// overlapping record. A record claimed once is never claimed again.
    fn pair_overlapping(&mut self) {
        for index in self.pending_order() {
            let proposal = self.proposals[index].clone();
            let candidates: Vec<(i64, Etn, FamilyKey)> = self
                .direct_candidates(&proposal)
                .into_iter()
                .filter_map(|key| {
                    let record = &self.families[&key].records[&proposal.zone];
                    let overlaps = proposal.start < record.end && record.start < proposal.end;
                    overlaps.then(|| {
                        (
                            self.start_distance(proposal.start, record.start),
                            key.2,
                            key,
                        )
                    })
                })
                .collect();
            if candidates.len() > 1 {
                tracing::warn!(
                    zone = %proposal.zone,
                    phen_sig = %proposal.phen_sig,
                    candidates = candidates.len(),
                    "ambiguous family match; taking closest start, then lowest etn"
                );
            }
            if let Some((_, _, key)) = candidates.into_iter().min_by_key(|c| (c.0, c.1, c.2.1)) {
                self.claim(index, key);
            }
        }
    }

    /// Records `index` as the direct continuation of `key` in its zone.
    fn claim(&mut self, index: usize, key: FamilyKey) {
        let proposal = self.proposals[index].clone();
        self.proposals[index].done = true;
        let issue_time = self.issue_time;
        let Some(family) = self.families.get_mut(&key) else {
            return;
        };
        family.claims.insert(proposal.zone.clone(), index);
        if proposal.ending {
            return;
        }
        let Some(record) = family.records.get(&proposal.zone) else {
            return;
        };
        let both_under_way = proposal.start <= issue_time && record.start <= issue_time;
        let unchanged =
            (proposal.start == record.start || both_under_way) && proposal.end == record.end;
        let start = if both_under_way {
            record.start
        } else {
            proposal.start.max(issue_time)
        };
        let decision = Decision {
            zone: proposal.zone.clone(),
            phen_sig: proposal.phen_sig,
            etn: key.2,
            etn_year: key.1,
            action: if unchanged { Action::Con } else { Action::Ext },
            prev_action: unchanged.then_some(record.action),
            start,
            end: proposal.end,
            ufn: proposal.ufn,
            event_id: proposal.event_id.clone(),
            segment_tag: proposal.segment_tag,
        };
        family.current.insert(proposal.zone);
        family.continuing.push(Continuing {
            start,
            end: proposal.end,
            unchanged,
        });
        self.decisions.push(decision);
    }

    /// Third pass: zones joining an event that continues in this product.
    fn expand_areas(&mut self) {
        for index in self.pending_order() {
            let proposal = self.proposals[index].clone();
            if proposal.ending {
                continue;
            }
            let segment_zones = &self.segment_zones[proposal.segment];
            let candidates: Vec<((i64, usize, Etn), FamilyKey)> = self
                .families
                .iter()
                .filter(|((ps, _, etn), family)| {
                    *ps == proposal.phen_sig
                        && proposal.etn.is_none_or(|forced| forced == *etn)
                        && family.event_id == proposal.event_id
                        && !family.continuing.is_empty()
                        && !family.ever.contains(&proposal.zone)
                        && !family.current.contains(&proposal.zone)
                        && family
                            .continuing
                            .iter()
                            .any(|c| c.start <= proposal.end && proposal.start <= c.end)
                })
                .map(|(key, family)| {
                    let distance = family
                        .continuing
                        .iter()
                        .map(|c| self.start_distance(proposal.start, c.start))
                        .min()
                        .unwrap_or(i64::MAX);
                    let missing = segment_zones
                        .iter()
                        .filter(|z| !family.ever.contains(*z) && !family.current.contains(*z))
                        .count();
                    ((distance, missing, key.2), *key)
                })
                .collect();
            if candidates.len() > 1 {
                tracing::warn!(
                    zone = %proposal.zone,
                    phen_sig = %proposal.phen_sig,
                    candidates = candidates.len(),
                    "ambiguous area expansion; taking closest event"
                );
            }
            let Some((_, key)) = candidates.into_iter().min_by_key(|(score, _)| *score) else {
                continue;
            };

            let issue_time = self.issue_time;
            let matched = self.families[&key]
                .continuing
                .iter()
                .find(|c| c.unchanged && self.same_timing(&proposal, c.start, c.end))
                .copied();
            let (action, start) = match matched {
                Some(c) => (Action::Exa, c.start),
                None => (Action::Exb, proposal.start.max(issue_time)),
            };
            if let Some(family) = self.families.get_mut(&key) {
                family.current.insert(proposal.zone.clone());
                family.ever.insert(proposal.zone.clone());
                family.continuing.push(Continuing {
                    start,
                    end: proposal.end,
                    unchanged: false,
                });
            }
            self.proposals[index].done = true;
            self.decisions.push(Decision {
                zone: proposal.zone,
                phen_sig: proposal.phen_sig,
                etn: key.2,
                etn_year: key.1,
                action,
                prev_action: None,
                start,
                end: proposal.end,
                ufn: proposal.ufn,
                event_id: proposal.event_id,
                segment_tag: proposal.segment_tag,
            });
        }
    }

    /// Fourth pass: everything left becomes NEW, sharing ETNs across zones
    /// whose ranges touch and never reusing an ETN within one zone.
    fn issue_new(&mut self) -> Result<(), ClassifyError> {
        let year = etn_year(self.issue_time);
        let mut groups: Vec<NewGroup> = Vec::new();
        for index in self.pending_order() {
            let proposal = self.proposals[index].clone();
            if proposal.ending {
                tracing::debug!(zone = %proposal.zone, phen_sig = %proposal.phen_sig, "ending hazard matched no live event");
                continue;
            }
            if self.options.windows.stale_start(proposal.start, self.issue_time) {
                tracing::warn!(
                    zone = %proposal.zone,
                    phen_sig = %proposal.phen_sig,
                    start = %proposal.start,
                    "NEW event starts well before issue time; clipping"
                );
            }
            let start = proposal.start.max(self.issue_time);
            let end = proposal.end;

            let reuse = groups
                .iter_mut()
                .filter(|g| {
                    g.phen_sig == proposal.phen_sig
                        && g.event_id == proposal.event_id
                        && proposal.etn.is_none_or(|forced| forced == g.etn)
                        && g.start <= end
                        && start <= g.end
                        && !g.zones.contains(&proposal.zone)
                })
                .min_by_key(|g| g.etn);
            let etn = match reuse {
                Some(group) => {
                    group.zones.insert(proposal.zone.clone());
                    group.start = group.start.min(start);
                    group.end = group.end.max(end);
                    group.etn
                }
                None => {
                    let key = EtnKey::new(self.office, proposal.phen_sig, year);
                    let etn = match proposal.etn {
                        Some(forced) => {
                            if self.families.contains_key(&(proposal.phen_sig, year, forced)) {
                                let hazard = &self.hazards[proposal.origin];
                                return Err(invalid_hazard(
                                    proposal.origin,
                                    hazard,
                                    HazardProblem::EtnInUse {
                                        etn: forced.to_string(),
                                    },
                                ));
                            }
                            self.reservations.claim(key, forced);
                            forced
                        }
                        None => self.reservations.reserve(key)?,
                    };
                    groups.push(NewGroup {
                        phen_sig: proposal.phen_sig,
                        event_id: proposal.event_id.clone(),
                        etn,
                        zones: BTreeSet::from([proposal.zone.clone()]),
                        start,
                        end,
                    });
                    etn
                }
            };
            self.proposals[index].done = true;
            self.decisions.push(Decision {
                zone: proposal.zone,
                phen_sig: proposal.phen_sig,
                etn,
                etn_year: year,
                action: Action::New,
                prev_action: None,
                start,
                end,
                ufn: proposal.ufn,
                event_id: proposal.event_id,
                segment_tag: proposal.segment_tag,
            });
        }
        Ok(())
    }

    /// Closes every live record the product no longer continues.
    fn close(&mut self) {
        let windows = &self.options.windows;
        for ((phen_sig, year, etn), family) in &self.families {
            if !self.closable.contains(phen_sig) {
                continue;
            }
            for (zone, record) in &family.records {
                let claimed_by_ending = match family.claims.get(zone) {
                    Some(index) => self.proposals[*index].ending,
                    None => true,
                };
                if !claimed_by_ending {
                    continue;
                }
                if windows.long_gone(record.end, self.issue_time) {
                    tracing::debug!(%zone, %phen_sig, %etn, "record ended long ago; nothing to close");
                    continue;
                }
                let action = if windows.expires(record.end, self.issue_time) {
                    Action::Exp
                } else {
                    Action::Can
                };
                self.decisions.push(Decision {
                    zone: zone.clone(),
                    phen_sig: *phen_sig,
                    etn: *etn,
                    etn_year: *year,
                    action,
                    prev_action: None,
                    start: record.start,
                    end: record.end,
                    ufn: record.ufn,
                    event_id: record.event_id.clone(),
                    segment_tag: None,
                });
            }
        }
    }

    /// CAN becomes UPG where the zone receives an upgrading hazard that overlaps it.
    fn upgrade(&mut self) {
        let issued: Vec<(ZoneId, PhenSig, Timestamp, Timestamp)> = self
            .decisions
            .iter()
            .filter(|d| d.action.is_issuing())
            .map(|d| (d.zone.clone(), d.phen_sig, d.start, d.end))
            .collect();
        for decision in &mut self.decisions {
            if decision.action != Action::Can {
                continue;
            }
            let upgraded = issued.iter().any(|(zone, phen_sig, start, end)| {
                *zone == decision.zone
                    && phen_sig.upgrades(&decision.phen_sig)
                    && *start < decision.end
                    && decision.start < *end
            });
            if upgraded {
                decision.action = Action::Upg;
            }
        }
    }

    /// Correction products turn CON into COR carrying the record's last action.
    /// Only CON keeps `prev_action` up to here; everything else drops it.
    fn correct(&mut self) {
        let correction = self.options.correction;
        for decision in &mut self.decisions {
            if correction && decision.action == Action::Con {
                decision.action = Action::Cor;
            } else {
                decision.prev_action = None;
            }
        }
    }
}
