//! The active table: append-only log of issued VTEC records.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::PhenSig;
use crate::error::ActiveTableError;
use crate::identity::{Etn, Office, ZoneId};
use crate::record::ActiveRecord;
use crate::time::Timestamp;
use crate::windows::Windows;

/// Capability: store and query previously issued VTEC records.
///
/// # Laws
/// - Queries never fail and reflect every successful `append` (read-after-write).
/// - The latest record (by issue time, then append order) for a given
///   (etn year, etn, zone) is authoritative.
/// - `append` rejects invariant breaches and duplicates without writing.
pub trait ActiveTable {
    type Error: From<ActiveTableError>;

    /// Authoritative records still in play at `at`: issued at or before `at`,
    /// not closed, and `at < end + purge window`. Covers active, pending and
    /// recently ended records. Sorted by (etn year, etn, zone).
    fn query(&self, office: &Office, phen_sig: PhenSig, at: Timestamp) -> Vec<ActiveRecord>;

    /// Full timeline of every event numbered `etn`, across years, in issue order.
    fn query_by_etn(&self, office: &Office, phen_sig: PhenSig, etn: Etn) -> Vec<ActiveRecord>;

    fn append(&mut self, record: ActiveRecord) -> Result<(), Self::Error>;

    /// Validates `records` against the table and against each other without
    /// writing anything.
    fn check_batch(&self, records: &[ActiveRecord]) -> Result<(), Self::Error>;

    /// Appends every record or none of them.
    fn append_batch(&mut self, records: Vec<ActiveRecord>) -> Result<(), Self::Error> {
        self.check_batch(&records)?;
        for record in records {
            self.append(record)?;
        }
        Ok(())
    }

    /// Drops every (event, zone) timeline whose in-play life ended before
    /// `before`. Returns the number of records removed.
    fn purge(&mut self, before: Timestamp) -> Result<usize, Self::Error>;

    /// Highest ETN drawn from the `year` pool, if any record remains.
    fn highest_etn(&self, office: &Office, phen_sig: PhenSig, year: i32) -> Option<Etn>;

    /// Phen/sigs with at least one record in play at `at`.
    fn live_phen_sigs(&self, office: &Office, at: Timestamp) -> BTreeSet<PhenSig> {
        PhenSig::all()
            .filter(|ps| !self.query(office, *ps, at).is_empty())
            .collect()
    }
}

/// In-memory active table for deterministic tests and as the index behind
/// file-backed tables.
#[derive(Clone, Debug, Default)]
pub struct MemoryActiveTable {
    windows: Windows,
    records: Vec<ActiveRecord>,
}

type TimelineKey = (i32, Etn, ZoneId);

impl MemoryActiveTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows(windows: Windows) -> Self {
        Self {
            windows,
            records: Vec::new(),
        }
    }

    /// Loads records without re-checking duplicates (already validated on write).
    pub fn from_records(windows: Windows, records: Vec<ActiveRecord>) -> Self {
        Self { windows, records }
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    /// All records in append order.
    pub fn records(&self) -> &[ActiveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates `record` against the table without writing it.
    pub fn check_append(&self, record: &ActiveRecord) -> Result<(), ActiveTableError> {
        record.check()?;
        if self.records.iter().any(|r| r.duplicates(record)) {
            return Err(duplicate(record));
        }
        Ok(())
    }

    /// `check_append` for a batch, also rejecting duplicates within it.
    pub fn check_append_all(&self, records: &[ActiveRecord]) -> Result<(), ActiveTableError> {
        for (index, record) in records.iter().enumerate() {
            self.check_append(record)?;
            if records[..index].iter().any(|r| r.duplicates(record)) {
                return Err(duplicate(record));
            }
        }
        Ok(())
    }

    /// Latest record per timeline, considering only records issued at or before `at`.
    fn latest(
        &self,
        office: &Office,
        phen_sig: PhenSig,
        at: Timestamp,
    ) -> BTreeMap<TimelineKey, &ActiveRecord> {
        let mut latest: BTreeMap<TimelineKey, &ActiveRecord> = BTreeMap::new();
        for record in self
            .records
            .iter()
            .filter(|r| &r.office == office && r.phen_sig == phen_sig && r.issue_time <= at)
        {
            let key = (record.etn_year, record.etn, record.zone.clone());
            match latest.get(&key) {
                Some(current) if current.issue_time > record.issue_time => {}
                _ => {
                    latest.insert(key, record);
                }
            }
        }
        latest
    }

    /// Removes whole timelines whose end plus purge window is strictly
    /// before `before`; returns how many records went.
    pub fn purge_before(&mut self, before: Timestamp) -> usize {
        let mut latest: BTreeMap<FullTimelineKey, &ActiveRecord> = BTreeMap::new();
        for record in &self.records {
            let key = full_timeline_key(record);
            match latest.get(&key) {
                Some(current) if current.issue_time > record.issue_time => {}
                _ => {
                    latest.insert(key, record);
                }
            }
        }
        let expired: BTreeSet<FullTimelineKey> = latest
            .into_iter()
            .filter(|(_, r)| r.effective_end().saturating_add_ms(self.windows.purge_ms) < before)
            .map(|(key, _)| key)
            .collect();
        let before_len = self.records.len();
        self.records
            .retain(|r| !expired.contains(&full_timeline_key(r)));
        before_len - self.records.len()
    }
}

fn duplicate(record: &ActiveRecord) -> ActiveTableError {
    ActiveTableError::DuplicateRecord {
        event: record.key().to_string(),
        zone: record.zone.clone(),
        start: record.start,
        end: record.end,
        issued: record.issue_time,
    }
}

type FullTimelineKey = (Office, PhenSig, TimelineKey);

fn full_timeline_key(record: &ActiveRecord) -> FullTimelineKey {
    (
        record.office.clone(),
        record.phen_sig,
        (record.etn_year, record.etn, record.zone.clone()),
    )
}

impl ActiveTable for MemoryActiveTable {
    type Error = ActiveTableError;

    fn query(&self, office: &Office, phen_sig: PhenSig, at: Timestamp) -> Vec<ActiveRecord> {
        self.latest(office, phen_sig, at)
            .into_values()
            .filter(|r| !r.is_closed() && self.windows.in_play(r.end, at))
            .cloned()
            .collect()
    }

    fn query_by_etn(&self, office: &Office, phen_sig: PhenSig, etn: Etn) -> Vec<ActiveRecord> {
        let mut timeline: Vec<ActiveRecord> = self
            .records
            .iter()
            .filter(|r| &r.office == office && r.phen_sig == phen_sig && r.etn == etn)
            .cloned()
            .collect();
        timeline.sort_by_key(|r| (r.etn_year, r.issue_time));
        timeline
    }

    fn append(&mut self, record: ActiveRecord) -> Result<(), Self::Error> {
        self.check_append(&record)?;
        self.records.push(record);
        Ok(())
    }

    fn check_batch(&self, records: &[ActiveRecord]) -> Result<(), Self::Error> {
        self.check_append_all(records)
    }

    fn purge(&mut self, before: Timestamp) -> Result<usize, Self::Error> {
        Ok(self.purge_before(before))
    }

    fn highest_etn(&self, office: &Office, phen_sig: PhenSig, year: i32) -> Option<Etn> {
        self.records
            .iter()
            .filter(|r| &r.office == office && r.phen_sig == phen_sig && r.etn_year == year)
            .map(|r| r.etn)
            .max()
    }

    fn live_phen_sigs(&self, office: &Office, at: Timestamp) -> BTreeSet<PhenSig> {
        let candidates: BTreeSet<PhenSig> = self
            .records
            .iter()
            .filter(|r| &r.office == office)
            .map(|r| r.phen_sig)
            .collect();
        candidates
            .into_iter()
            .filter(|ps| !self.query(office, *ps, at).is_empty())
            .collect()
    }
}
