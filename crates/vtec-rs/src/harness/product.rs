//! Plain-text product rendering: one block per zone set.
//!
//! ```text
//! FLZ039-042-
//! /O.NEW.KTBW.WS.W.0001.100102T0500Z-100102T1700Z/
//! /O.EXT.KTBW.WS.A.0001.000000T0000Z-100102T0500Z/
//!
//! $$
//! ```

use crate::core::{DEFAULT_HEADER_WIDTH, Office, Segment, Timestamp, ZoneSet};

/// Groups segments by zone set (first appearance wins the position) and
/// renders each group's header followed by its VTEC lines in engine order.
pub fn render_product(office: &Office, issue_time: Timestamp, segments: &[Segment]) -> String {
    let mut blocks: Vec<(&ZoneSet, Vec<&str>)> = Vec::new();
    for segment in segments {
        match blocks.iter_mut().find(|(zones, _)| **zones == segment.zones) {
            Some((_, lines)) => lines.push(segment.vtec.as_str()),
            None => blocks.push((&segment.zones, vec![segment.vtec.as_str()])),
        }
    }

    let mut out = format!("{office} {issue_time}\n\n");
    if blocks.is_empty() {
        out.push_str("NO HAZARDS\n");
        return out;
    }
    for (zones, lines) in blocks {
        out.push_str(&zones.encode_lines(DEFAULT_HEADER_WIDTH));
        out.push('\n');
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\n$$\n\n");
    }
    out
}
