//! Zone-set algebra and the UGC zone header codec.
//!
//! A `ZoneSet` is sorted and de-duplicated by construction, so equality is
//! order independent and the header encoding is deterministic.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidId, ZoneHeaderError};
use crate::identity::ZoneId;

/// Default line width for wrapped zone headers.
pub const DEFAULT_HEADER_WIDTH: usize = 66;

/// Shortest run of consecutive numbers written as `NNN>MMM`.
const MIN_RANGE_RUN: usize = 3;

/// Ordered set of UGC identifiers.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneSet(BTreeSet<ZoneId>);

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical set from any collection of ids.
    pub fn make(ids: impl IntoIterator<Item = ZoneId>) -> Self {
        ids.into_iter().collect()
    }

    /// Validates and collects raw ids.
    pub fn parse<I, S>(raw: I) -> Result<Self, InvalidId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|s| ZoneId::new(s.as_ref().trim()))
            .collect()
    }

    pub fn single(zone: ZoneId) -> Self {
        Self(BTreeSet::from([zone]))
    }

    pub fn insert(&mut self, zone: ZoneId) -> bool {
        self.0.insert(zone)
    }

    pub fn contains(&self, zone: &ZoneId) -> bool {
        self.0.contains(zone)
    }

    pub fn union(&self, other: &ZoneSet) -> ZoneSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn intersection(&self, other: &ZoneSet) -> ZoneSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn difference(&self, other: &ZoneSet) -> ZoneSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn is_subset(&self, other: &ZoneSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compressed header form, e.g. `FLZ049-052-056>062-`.
    pub fn encode(&self) -> String {
        self.tokens().concat()
    }

    /// Header wrapped to `width` columns. Lines only break after a `-`.
    pub fn encode_lines(&self, width: usize) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        for token in self.tokens() {
            if !line.is_empty() && line.len() + token.len() > width {
                lines.push(std::mem::take(&mut line));
            }
            line.push_str(&token);
        }
        if !line.is_empty() {
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Parses a header produced by `encode`/`encode_lines`.
    ///
    /// A trailing `DDHHMM-` purge stamp is accepted and ignored.
    pub fn decode(header: &str) -> Result<ZoneSet, ZoneHeaderError> {
        let invalid = |reason: String| ZoneHeaderError {
            raw: header.to_string(),
            reason,
        };
        let compact: String = header.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(invalid("empty header".into()));
        }
        if !compact.ends_with('-') {
            return Err(invalid("header must end with `-`".into()));
        }
        let mut tokens: Vec<&str> = compact.split('-').filter(|t| !t.is_empty()).collect();
        if tokens
            .last()
            .is_some_and(|t| t.len() == 6 && t.bytes().all(|b| b.is_ascii_digit()))
        {
            tokens.pop();
        }

        let mut zones = ZoneSet::new();
        let mut prefix: Option<&str> = None;
        for token in tokens {
            let numbers = match token.get(..3) {
                Some(head) if head.bytes().all(|b| b.is_ascii_uppercase()) => {
                    prefix = Some(head);
                    &token[3..]
                }
                _ => token,
            };
            let current = prefix.ok_or_else(|| invalid(format!("`{token}` has no prefix")))?;
            let (first, last) = match numbers.split_once('>') {
                Some((a, b)) => (parse_number(a), parse_number(b)),
                None => (parse_number(numbers), parse_number(numbers)),
            };
            let (Some(first), Some(last)) = (first, last) else {
                return Err(invalid(format!("`{token}` is not a zone number or range")));
            };
            if last < first {
                return Err(invalid(format!("range `{token}` runs backwards")));
            }
            for number in first..=last {
                let zone = ZoneId::from_parts(current, number)
                    .map_err(|e| invalid(e.to_string()))?;
                zones.insert(zone);
            }
        }
        Ok(zones)
    }

    /// One `-`-terminated token per id or compressed range.
    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        let zones: Vec<&ZoneId> = self.0.iter().collect();
        let mut last_prefix: Option<&str> = None;
        let mut i = 0;
        while i < zones.len() {
            let prefix = zones[i].prefix();
            let mut j = i;
            while j + 1 < zones.len()
                && zones[j + 1].prefix() == prefix
                && zones[j + 1].number() == zones[j].number() + 1
            {
                j += 1;
            }
            let head = if last_prefix == Some(prefix) { "" } else { prefix };
            last_prefix = Some(prefix);
            if j + 1 - i >= MIN_RANGE_RUN {
                tokens.push(format!(
                    "{head}{:03}>{:03}-",
                    zones[i].number(),
                    zones[j].number()
                ));
                i = j + 1;
            } else {
                tokens.push(format!("{head}{:03}-", zones[i].number()));
                i += 1;
            }
        }
        tokens
    }
}

fn parse_number(raw: &str) -> Option<u16> {
    if raw.len() == 3 && raw.bytes().all(|b| b.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}

impl fmt::Debug for ZoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(ZoneId::as_str)).finish()
    }
}

impl fmt::Display for ZoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromIterator<ZoneId> for ZoneSet {
    fn from_iter<T: IntoIterator<Item = ZoneId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a ZoneId;
    type IntoIter = std::collections::btree_set::Iter<'a, ZoneId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
