//! Layer 1: Identity atoms
//!
//! Office: 4-character issuing office (`KTBW`)
//! ZoneId: UGC zone/county id (`FLZ049`, `FLC057`, `GMZ850`)
//! Etn: event tracking number, 1..=9999 (0 reserved for ROU)
//! EventId: caller-supplied identifier separating simultaneous events

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidId;

/// Issuing office identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Office(String);

impl Office {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidId> {
        let raw = raw.into();
        let valid = raw.len() == 4
            && raw
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidId::Office {
                reason: "expected 4 uppercase alphanumerics".into(),
                raw,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Office({})", self.0)
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Office {
    type Error = InvalidId;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Office::new(s)
    }
}

impl From<Office> for String {
    fn from(office: Office) -> String {
        office.0
    }
}

/// UGC identifier: two-letter state/area, `Z` (zone) or `C` (county), three digits.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidId> {
        let raw = raw.into();
        let bytes = raw.as_bytes();
        let reason = if bytes.len() != 6 {
            Some("expected 6 characters (SSFNNN)")
        } else if !bytes[..2].iter().all(u8::is_ascii_uppercase) {
            Some("state/area prefix must be two uppercase letters")
        } else if bytes[2] != b'Z' && bytes[2] != b'C' {
            Some("format letter must be Z or C")
        } else if !bytes[3..].iter().all(u8::is_ascii_digit) {
            Some("number must be three digits")
        } else {
            None
        };
        match reason {
            None => Ok(Self(raw)),
            Some(reason) => Err(InvalidId::Zone {
                raw,
                reason: reason.into(),
            }),
        }
    }

    pub fn from_parts(prefix: &str, number: u16) -> Result<Self, InvalidId> {
        Self::new(format!("{prefix}{number:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `SSF` part: state/area letters plus format letter.
    pub fn prefix(&self) -> &str {
        &self.0[..3]
    }

    pub fn number(&self) -> u16 {
        self.0.as_bytes()[3..]
            .iter()
            .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'))
    }

    pub fn is_county(&self) -> bool {
        self.0.as_bytes()[2] == b'C'
    }
}

impl fmt::Debug for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneId({})", self.0)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ZoneId {
    type Error = InvalidId;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        ZoneId::new(s)
    }
}

impl From<ZoneId> for String {
    fn from(id: ZoneId) -> String {
        id.0
    }
}

/// Event tracking number.
///
/// Issued values are 1..=9999. `Etn::ROUTINE` (0) only ever appears on ROU
/// lines and is never stored in an active table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Etn(u16);

impl Etn {
    pub const ROUTINE: Etn = Etn(0);
    pub const FIRST: Etn = Etn(1);
    pub const MAX: Etn = Etn(9999);

    pub fn new(n: u16) -> Result<Self, InvalidId> {
        if (1..=Self::MAX.0).contains(&n) {
            Ok(Self(n))
        } else {
            Err(InvalidId::Etn {
                raw: n.to_string(),
                reason: "must be within 1..=9999".into(),
            })
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn is_routine(self) -> bool {
        self.0 == 0
    }

    /// Next number in sequence, `None` past 9999.
    pub fn next(self) -> Option<Etn> {
        (self.0 < Self::MAX.0).then(|| Etn(self.0 + 1))
    }
}

impl fmt::Debug for Etn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Etn({:04})", self.0)
    }
}

impl fmt::Display for Etn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl TryFrom<u16> for Etn {
    type Error = InvalidId;
    fn try_from(n: u16) -> Result<Self, Self::Error> {
        if n == 0 { Ok(Etn::ROUTINE) } else { Etn::new(n) }
    }
}

impl From<Etn> for u16 {
    fn from(etn: Etn) -> u16 {
        etn.0
    }
}

/// Caller-supplied event identifier (storm-based warnings).
///
/// Two proposed hazards with the same phen/sig and zones but different event
/// ids are distinct events and never share an ETN.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Err(InvalidId::EventId {
                raw,
                reason: "empty".into(),
            })
        } else {
            Ok(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({:?})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventId {
    type Error = InvalidId;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        EventId::new(s)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> String {
        id.0
    }
}
