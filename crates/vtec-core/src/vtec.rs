//! P-VTEC line codec: `/K.ACT.OFF.PP.S.NNNN.yymmddTHHMMZ-yymmddTHHMMZ/`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Action, PhenSig, ProductClass};
use crate::error::VtecParseError;
use crate::identity::{Etn, Office};
use crate::time::Timestamp;

/// Structured form of one VTEC line.
///
/// `start == None` renders `000000T0000Z` (event in progress); `end == None`
/// renders the same zeros (until further notice).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VtecLine {
    pub class: ProductClass,
    pub action: Action,
    pub office: Office,
    pub phen_sig: PhenSig,
    pub etn: Etn,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl VtecLine {
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn is_ufn(&self) -> bool {
        self.end.is_none()
    }

    pub fn parse(raw: &str) -> Result<Self, VtecParseError> {
        let invalid = |reason: String| VtecParseError {
            raw: raw.to_string(),
            reason,
        };
        let body = raw
            .trim()
            .strip_prefix('/')
            .and_then(|s| s.strip_suffix('/'))
            .ok_or_else(|| invalid("must be enclosed in `/`".into()))?;
        let fields: Vec<&str> = body.split('.').collect();
        let [class, action, office, phen, sig, etn, times] = fields.as_slice() else {
            return Err(invalid(format!("expected 7 fields, found {}", fields.len())));
        };
        let class = ProductClass::parse_str(class)
            .filter(|c| c.as_str() == *class)
            .ok_or_else(|| invalid(format!("unknown product class `{class}`")))?;
        let action = Action::parse_str(action)
            .ok_or_else(|| invalid(format!("unknown action `{action}`")))?;
        let office = Office::new(*office).map_err(|e| invalid(e.to_string()))?;
        let phen_sig = PhenSig::new(phen, sig).map_err(|e| invalid(e.to_string()))?;
        if etn.len() != 4 || !etn.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("etn `{etn}` must be four digits")));
        }
        let number: u16 = etn
            .parse()
            .map_err(|_| invalid(format!("etn `{etn}` is not a number")))?;
        let etn = Etn::try_from(number).map_err(|e| invalid(e.to_string()))?;
        if etn.is_routine() != (action == Action::Rou) {
            return Err(invalid("etn 0000 is only valid on ROU lines".into()));
        }
        let (start, end) = times
            .split_once('-')
            .ok_or_else(|| invalid("time range must be start-end".into()))?;
        let start = Timestamp::parse_vtec(start).map_err(|e| invalid(e.to_string()))?;
        let end = Timestamp::parse_vtec(end).map_err(|e| invalid(e.to_string()))?;
        if matches!((start, end), (Some(s), Some(e)) if s > e) {
            return Err(invalid("start is after end".into()));
        }
        Ok(Self {
            class,
            action,
            office,
            phen_sig,
            etn,
            start,
            end,
        })
    }
}

fn render_time(ts: Option<Timestamp>) -> String {
    ts.map(Timestamp::to_vtec)
        .unwrap_or_else(|| Timestamp::MAX.to_vtec())
}

impl fmt::Display for VtecLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}.{}.{}.{}.{}.{}.{}-{}/",
            self.class,
            self.action,
            self.office,
            self.phen_sig.phen(),
            self.phen_sig.sig(),
            self.etn,
            render_time(self.start),
            render_time(self.end)
        )
    }
}

impl std::str::FromStr for VtecLine {
    type Err = VtecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
