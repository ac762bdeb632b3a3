//! Human output for CLI commands. Pure formatting.

use crate::core::ActiveRecord;
use crate::harness::StepOutcome;

pub fn render_step_header(outcome: &StepOutcome) -> String {
    format!(
        "== step {} @ {} ({} segments, {} committed) ==",
        outcome.label,
        outcome.issue_time,
        outcome.segments.len(),
        outcome.committed
    )
}

pub fn render_record(record: &ActiveRecord) -> String {
    let mut out = format!(
        "{} {} {} {} -> {} issued {}",
        record.key(),
        record.zone,
        record.action,
        record.start,
        record.end,
        record.issue_time
    );
    if let Some(event_id) = &record.event_id {
        out.push_str(&format!(" event {event_id}"));
    }
    if let Some(prev) = record.prev_action {
        out.push_str(&format!(" (was {prev})"));
    }
    out
}

pub fn render_records(records: &[ActiveRecord]) -> String {
    if records.is_empty() {
        return "active table is empty".into();
    }
    let mut out: Vec<String> = records.iter().map(render_record).collect();
    out.push(format!("{} records", records.len()));
    out.join("\n")
}
