//! Append-only JSON-lines active table.
//!
//! One `ActiveRecord` per line. The whole file is indexed in memory on open;
//! appends write through, `purge` rewrites the file atomically.
//!
//! Purging drops records but never event numbers: the highest ETN issued per
//! (office, phen/sig, year) is kept in a sidecar (`<stem>.etn.json`) so a
//! reopened table does not hand out a number twice in one year.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{
    ActiveRecord, ActiveTable, Etn, EtnKey, EtnPool, MemoryActiveTable, Office, PhenSig,
    Timestamp, Windows,
};
use crate::{Error, Result};

#[derive(Debug)]
pub struct JsonlActiveTable {
    path: PathBuf,
    index: MemoryActiveTable,
    /// Issued-ETN high-water marks, including purged events.
    marks: EtnPool,
}

#[derive(Debug, Serialize, Deserialize)]
struct EtnMark {
    #[serde(flatten)]
    key: EtnKey,
    etn: Etn,
}

impl JsonlActiveTable {
    /// Opens (or starts) the table at `path`. The file is created on first append.
    pub fn open(path: impl Into<PathBuf>, windows: Windows) -> Result<Self> {
        let path = path.into();
        let mut index = MemoryActiveTable::with_windows(windows);
        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            for (n, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let corrupt = |reason: String| Error::TableCorrupt {
                    path: path.clone(),
                    line: n + 1,
                    reason,
                };
                let record: ActiveRecord =
                    serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
                index.append(record).map_err(|e| corrupt(e.to_string()))?;
            }
        }
        let mut marks = read_marks(&marks_path(&path))?;
        marks.absorb(&EtnPool::rebuild(index.records()));
        tracing::debug!(
            path = %path.display(),
            records = index.len(),
            marks = marks.len(),
            "opened active table"
        );
        Ok(Self { path, index, marks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[ActiveRecord] {
        self.index.records()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// ETN pool reseeded from stored records and the sidecar marks.
    pub fn pool(&self) -> EtnPool {
        self.marks.clone()
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn write_lines(&self, records: &[ActiveRecord]) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let mut buf = String::new();
        for (offset, record) in records.iter().enumerate() {
            let line = serde_json::to_string(record).map_err(|e| Error::TableCorrupt {
                path: self.path.clone(),
                line: self.index.len() + offset + 1,
                reason: e.to_string(),
            })?;
            buf.push_str(&line);
            buf.push('\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(buf.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| Error::io(&self.path, e))
    }

    /// Persists marks when `records` raise any of them.
    fn note_marks(&mut self, records: &[ActiveRecord]) -> Result<()> {
        let mut marks = self.marks.clone();
        marks.absorb(&EtnPool::rebuild(records));
        if marks != self.marks {
            write_marks(&marks_path(&self.path), &marks)?;
            self.marks = marks;
        }
        Ok(())
    }
}

fn marks_path(table: &Path) -> PathBuf {
    table.with_extension("etn.json")
}

fn read_marks(path: &Path) -> Result<EtnPool> {
    let mut pool = EtnPool::new();
    if !path.exists() {
        return Ok(pool);
    }
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let marks: Vec<EtnMark> =
        serde_json::from_str(&contents).map_err(|e| Error::TableCorrupt {
            path: path.to_path_buf(),
            line: e.line(),
            reason: e.to_string(),
        })?;
    for mark in marks {
        pool.record(mark.key, mark.etn);
    }
    Ok(pool)
}

fn write_marks(path: &Path, pool: &EtnPool) -> Result<()> {
    let marks: Vec<EtnMark> = pool
        .entries()
        .map(|(key, etn)| EtnMark {
            key: key.clone(),
            etn,
        })
        .collect();
    let mut data = serde_json::to_vec_pretty(&marks).map_err(|e| Error::io(path, e.into()))?;
    data.push(b'\n');
    atomic_write(path, |file| file.write_all(&data))
}

fn rewrite(path: &Path, records: &[ActiveRecord]) -> Result<()> {
    atomic_write(path, |file| {
        for record in records {
            serde_json::to_writer(&mut *file, record)?;
            file.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// Writes through a temp file in the same directory, then renames over `path`.
fn atomic_write(
    path: &Path,
    fill: impl FnOnce(&mut fs::File) -> std::io::Result<()>,
) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
    fill(temp.as_file_mut())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

impl ActiveTable for JsonlActiveTable {
    type Error = Error;

    fn query(&self, office: &Office, phen_sig: PhenSig, at: Timestamp) -> Vec<ActiveRecord> {
        self.index.query(office, phen_sig, at)
    }

    fn query_by_etn(&self, office: &Office, phen_sig: PhenSig, etn: Etn) -> Vec<ActiveRecord> {
        self.index.query_by_etn(office, phen_sig, etn)
    }

    fn append(&mut self, record: ActiveRecord) -> Result<()> {
        self.append_batch(vec![record])
    }

    fn check_batch(&self, records: &[ActiveRecord]) -> Result<()> {
        self.index.check_append_all(records)?;
        Ok(())
    }

    /// One write and one sync for the whole batch.
    fn append_batch(&mut self, records: Vec<ActiveRecord>) -> Result<()> {
        self.check_batch(&records)?;
        if records.is_empty() {
            return Ok(());
        }
        self.write_lines(&records)?;
        self.note_marks(&records)?;
        for record in records {
            self.index.append(record)?;
        }
        Ok(())
    }

    fn purge(&mut self, before: Timestamp) -> Result<usize> {
        let mut kept = self.index.clone();
        let removed = kept.purge_before(before);
        if removed > 0 {
            // Marks for everything about to go must be on disk first.
            let stored = self.index.records().to_vec();
            self.note_marks(&stored)?;
            rewrite(&self.path, kept.records())?;
            self.index = kept;
            tracing::info!(path = %self.path.display(), removed, "purged active table");
        }
        Ok(removed)
    }

    fn highest_etn(&self, office: &Office, phen_sig: PhenSig, year: i32) -> Option<Etn> {
        self.index.highest_etn(office, phen_sig, year)
    }

    fn live_phen_sigs(&self, office: &Office, at: Timestamp) -> BTreeSet<PhenSig> {
        self.index.live_phen_sigs(office, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::{Action, HOUR_MS, ZoneId};

    fn record(etn: u16, zone: &str, end_h: i64, issued_h: i64, action: Action) -> ActiveRecord {
        ActiveRecord {
            office: Office::new("KTBW").unwrap(),
            phen_sig: PhenSig::parse("WS.A").unwrap(),
            etn: Etn::new(etn).unwrap(),
            etn_year: 1970,
            zone: ZoneId::new(zone).unwrap(),
            start: Timestamp::from_millis(0),
            end: Timestamp::from_millis(end_h * HOUR_MS),
            issue_time: Timestamp::from_millis(issued_h * HOUR_MS),
            action,
            ufn: false,
            event_id: None,
            prev_action: None,
        }
    }

    #[test]
    fn appends_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("table").join("active.jsonl");
        let mut table = JsonlActiveTable::open(&path, Windows::default()).expect("open");
        assert!(table.is_empty());
        table.append(record(1, "FLZ039", 12, 0, Action::New)).expect("append");
        table.append(record(1, "FLZ039", 12, 1, Action::Con)).expect("append");

        let reopened = JsonlActiveTable::open(&path, Windows::default()).expect("reopen");
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.records(), table.records());
        let live = reopened.query(
            &Office::new("KTBW").unwrap(),
            PhenSig::parse("WS.A").unwrap(),
            Timestamp::from_millis(2 * HOUR_MS),
        );
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].action, Action::Con);
        assert_eq!(
            reopened
                .pool()
                .highest(&crate::core::EtnKey::new(&live[0].office, live[0].phen_sig, 1970)),
            Some(Etn::new(1).unwrap())
        );
    }

    #[test]
    fn duplicate_append_leaves_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("active.jsonl");
        let mut table = JsonlActiveTable::open(&path, Windows::default()).expect("open");
        table.append(record(1, "FLZ039", 12, 0, Action::New)).expect("append");
        let before = fs::read_to_string(&path).expect("read");

        let err = table
            .append(record(1, "FLZ039", 12, 0, Action::New))
            .unwrap_err();
        assert!(matches!(err, Error::Core(_)), "{err:?}");
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn purge_rewrites_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("active.jsonl");
        let mut table = JsonlActiveTable::open(&path, Windows::default()).expect("open");
        table.append(record(1, "FLZ039", 2, 0, Action::New)).expect("append");
        table.append(record(2, "FLZ042", 48, 0, Action::New)).expect("append");

        let removed = table.purge(Timestamp::from_millis(10 * HOUR_MS)).expect("purge");
        assert_eq!(removed, 1);
        let reopened = JsonlActiveTable::open(&path, Windows::default()).expect("reopen");
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.records()[0].etn, Etn::new(2).unwrap());
    }

    #[test]
    fn corrupt_line_reports_line_number() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("active.jsonl");
        let good = serde_json::to_string(&record(1, "FLZ039", 12, 0, Action::New)).unwrap();
        fs::write(&path, format!("{good}\n\nnot json\n")).expect("write");

        let err = JsonlActiveTable::open(&path, Windows::default()).unwrap_err();
        assert!(matches!(err, Error::TableCorrupt { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn purged_etns_stay_reserved_after_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("active.jsonl");
        let mut table = JsonlActiveTable::open(&path, Windows::default()).expect("open");
        table.append(record(3, "FLZ039", 2, 0, Action::New)).expect("append");
        assert_eq!(table.purge(Timestamp::from_millis(10 * HOUR_MS)).expect("purge"), 1);
        assert!(path.with_extension("etn.json").exists());

        let reopened = JsonlActiveTable::open(&path, Windows::default()).expect("reopen");
        assert!(reopened.is_empty());
        let office = Office::new("KTBW").unwrap();
        let ws_a = PhenSig::parse("WS.A").unwrap();
        assert_eq!(reopened.highest_etn(&office, ws_a, 1970), None);
        assert_eq!(
            reopened.pool().highest(&EtnKey::new(&office, ws_a, 1970)),
            Some(Etn::new(3).unwrap())
        );
    }

    #[test]
    fn rejected_batch_writes_no_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("active.jsonl");
        let mut table = JsonlActiveTable::open(&path, Windows::default()).expect("open");
        table.append(record(1, "FLZ039", 12, 0, Action::New)).expect("append");
        let before = fs::read_to_string(&path).expect("read");

        let err = table
            .append_batch(vec![
                record(1, "FLZ042", 12, 0, Action::New),
                record(1, "FLZ039", 12, 0, Action::New),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::Core(_)), "{err:?}");
        assert_eq!(table.len(), 1);
        assert_eq!(fs::read_to_string(&path).expect("read"), before);

        table
            .append_batch(vec![
                record(1, "FLZ042", 12, 0, Action::New),
                record(1, "FLZ043", 12, 0, Action::New),
            ])
            .expect("batch");
        let reopened = JsonlActiveTable::open(&path, Windows::default()).expect("reopen");
        assert_eq!(reopened.len(), 3);
    }
}
