//! ETN pool: per (office, phen/sig, year) event numbering.
//!
//! An event keeps the number drawn from its issue year for its whole life;
//! a new year starts again at 0001 regardless of the previous year's high
//! water mark.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::active_table::ActiveTable;
use crate::domain::PhenSig;
use crate::error::EtnExhausted;
use crate::identity::{Etn, Office};
use crate::record::ActiveRecord;
use crate::time::Timestamp;

/// Pool year for an issue time (UTC calendar year).
pub fn etn_year(issue_time: Timestamp) -> i32 {
    issue_time.year().unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EtnKey {
    pub office: Office,
    pub phen_sig: PhenSig,
    pub year: i32,
}

impl EtnKey {
    pub fn new(office: &Office, phen_sig: PhenSig, year: i32) -> Self {
        Self {
            office: office.clone(),
            phen_sig,
            year,
        }
    }
}

/// Highest ETN issued per key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EtnPool {
    highest: BTreeMap<EtnKey, Etn>,
}

impl EtnPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reseeds a pool from stored records.
    pub fn rebuild<'a>(records: impl IntoIterator<Item = &'a ActiveRecord>) -> Self {
        let mut pool = Self::new();
        for record in records {
            let key = EtnKey::new(&record.office, record.phen_sig, record.etn_year);
            let entry = pool.highest.entry(key).or_insert(record.etn);
            *entry = (*entry).max(record.etn);
        }
        pool
    }

    pub fn highest(&self, key: &EtnKey) -> Option<Etn> {
        self.highest.get(key).copied()
    }

    /// Notes an issued ETN. A number after 9999 restarts the sequence.
    pub fn record(&mut self, key: EtnKey, etn: Etn) {
        match self.highest.get_mut(&key) {
            Some(current) if *current == Etn::MAX || etn > *current => *current = etn,
            Some(_) => {}
            None => {
                self.highest.insert(key, etn);
            }
        }
    }

    /// Draws and records the next ETN for `issue_time`'s year.
    pub fn allocate<T: ActiveTable>(
        &mut self,
        office: &Office,
        phen_sig: PhenSig,
        issue_time: Timestamp,
        table: &T,
    ) -> Result<Etn, EtnExhausted> {
        let key = EtnKey::new(office, phen_sig, etn_year(issue_time));
        let etn = next_etn(self.highest(&key), &key, table)?;
        self.record(key, etn);
        Ok(etn)
    }

    /// Every (key, highest ETN) pair in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&EtnKey, Etn)> {
        self.highest.iter().map(|(key, etn)| (key, *etn))
    }

    /// Folds `other` in, keeping the higher number per key.
    pub fn absorb(&mut self, other: &EtnPool) {
        for (key, etn) in other.entries() {
            let entry = self.highest.entry(key.clone()).or_insert(etn);
            *entry = (*entry).max(etn);
        }
    }

    pub fn len(&self) -> usize {
        self.highest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highest.is_empty()
    }
}

/// Allocation overlay used while classifying: the pool stays untouched until
/// the caller commits.
pub struct EtnReservations<'a, T: ActiveTable> {
    pool: &'a EtnPool,
    table: &'a T,
    reserved: BTreeMap<EtnKey, Etn>,
}

impl<'a, T: ActiveTable> EtnReservations<'a, T> {
    pub fn new(pool: &'a EtnPool, table: &'a T) -> Self {
        Self {
            pool,
            table,
            reserved: BTreeMap::new(),
        }
    }

    /// Next free ETN for `key`, counting reservations already handed out.
    pub fn reserve(&mut self, key: EtnKey) -> Result<Etn, EtnExhausted> {
        let current = self.current(&key);
        let etn = next_etn(current, &key, self.table)?;
        self.reserved.insert(key, etn);
        Ok(etn)
    }

    /// Marks a caller-forced ETN as used so later reservations skip it.
    pub fn claim(&mut self, key: EtnKey, etn: Etn) {
        let current = self.current(&key);
        self.reserved.insert(key, current.map_or(etn, |c| c.max(etn)));
    }

    fn current(&self, key: &EtnKey) -> Option<Etn> {
        self.reserved
            .get(key)
            .copied()
            .or_else(|| self.pool.highest(key))
    }
}

/// `max(pool, table) + 1`, wrapping past 9999 only when the year's records are gone.
fn next_etn<T: ActiveTable>(
    pool_highest: Option<Etn>,
    key: &EtnKey,
    table: &T,
) -> Result<Etn, EtnExhausted> {
    let table_highest = table.highest_etn(&key.office, key.phen_sig, key.year);
    match pool_highest.max(table_highest) {
        None => Ok(Etn::FIRST),
        Some(current) => match current.next() {
            Some(next) => Ok(next),
            None if table_highest.is_none() => {
                tracing::warn!(
                    office = %key.office,
                    phen_sig = %key.phen_sig,
                    year = key.year,
                    "etn space wrapped past 9999; restarting at 0001"
                );
                Ok(Etn::FIRST)
            }
            None => Err(EtnExhausted {
                office: key.office.to_string(),
                phen_sig: key.phen_sig.to_string(),
                year: key.year,
            }),
        },
    }
}
