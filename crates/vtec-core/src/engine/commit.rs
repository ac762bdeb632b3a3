//! Commit: the only path that writes classification results back.

use crate::active_table::ActiveTable;
use crate::domain::Action;
use crate::etn::{EtnKey, EtnPool};
use crate::identity::Office;
use crate::record::ActiveRecord;
use crate::time::Timestamp;

use super::Segment;

/// Appends one record per (segment, zone) and notes every NEW ETN in the pool.
///
/// ROU segments are skipped. The whole batch is validated before anything is
/// written; on error neither the table nor the pool changes. Returns the
/// number of records written.
pub fn commit<T: ActiveTable>(
    table: &mut T,
    pool: &mut EtnPool,
    office: &Office,
    issue_time: Timestamp,
    segments: &[Segment],
) -> Result<usize, T::Error> {
    let recorded: Vec<&Segment> = segments.iter().filter(|s| s.action.is_recorded()).collect();
    let records: Vec<ActiveRecord> = recorded
        .iter()
        .flat_map(|segment| {
            segment.zones.iter().map(move |zone| ActiveRecord {
                office: office.clone(),
                phen_sig: segment.phen_sig,
                etn: segment.etn,
                etn_year: segment.etn_year,
                zone: zone.clone(),
                start: segment.start,
                end: segment.end,
                issue_time,
                action: segment.action,
                ufn: segment.ufn,
                event_id: segment.event_id.clone(),
                prev_action: segment.prev_action,
            })
        })
        .collect();
    let written = records.len();
    table.append_batch(records)?;

    for segment in recorded.iter().filter(|s| s.action == Action::New) {
        pool.record(
            EtnKey::new(office, segment.phen_sig, segment.etn_year),
            segment.etn,
        );
    }
    tracing::debug!(%office, %issue_time, written, "committed issuance");
    Ok(written)
}
