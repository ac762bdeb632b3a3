//! Layer 2: Domain codes
//!
//! Significance: W, A, Y, S, F, O, N
//! PhenSig: (phenomenon, significance) drawn from the static hazard table
//! Action: NEW, CON, EXT, EXA, EXB, UPG, CAN, EXP, COR, ROU
//! HazardStatus: forecaster-supplied lifecycle hint
//! ProductClass: O / T / E / X

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvalidId;

/// VTEC significance letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Significance {
    Warning,
    Watch,
    Advisory,
    Statement,
    Forecast,
    Outlook,
    Synopsis,
}

crate::enum_str! {
    impl Significance {
        pub fn as_str(&self) -> &'static str;
        pub fn parse_str(raw: &str) -> Option<Self>;
        variants {
            Warning => ["W"],
            Watch => ["A"],
            Advisory => ["Y"],
            Statement => ["S"],
            Forecast => ["F"],
            Outlook => ["O"],
            Synopsis => ["N"],
        }
    }
}

impl Significance {
    /// Severity rank used by the same-phenomenon upgrade rule.
    fn rank(self) -> u8 {
        match self {
            Significance::Warning => 3,
            Significance::Watch | Significance::Advisory => 2,
            Significance::Statement
            | Significance::Forecast
            | Significance::Outlook
            | Significance::Synopsis => 0,
        }
    }
}

impl Ord for Significance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for Significance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<String> for Significance {
    type Error = InvalidId;
    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Significance::parse_str(&raw).ok_or(InvalidId::PhenSig {
            raw,
            reason: "unknown significance".into(),
        })
    }
}

impl From<Significance> for String {
    fn from(sig: Significance) -> String {
        sig.as_str().to_string()
    }
}

/// Recognised phen/sig pairs.
const HAZARD_TABLE: &[&str] = &[
    // winter
    "BZ.W", "BZ.A", "WS.W", "WS.A", "WW.Y", "IS.W", "LE.W", "LE.A", "LE.Y", "ZR.Y", "WC.W",
    "WC.A", "WC.Y", "EC.W", "EC.A",
    // heat
    "EH.W", "EH.A", "HT.Y", "XH.W", "XH.A",
    // non-precipitation
    "HW.W", "HW.A", "WI.Y", "LW.Y", "DS.W", "DU.Y", "DS.Y", "FG.Y", "ZF.Y", "SM.Y", "AS.Y", "AS.O",
    "AF.W", "AF.Y", "AQ.Y", "FZ.W", "FZ.A", "FR.Y", "HZ.W", "HZ.A", "EW.W",
    // fire weather
    "FW.W", "FW.A",
    // marine
    "SC.Y", "SW.Y", "RB.Y", "SI.Y", "GL.W", "GL.A", "SR.W", "SR.A", "HF.W", "HF.A", "SE.W", "SE.A",
    "UP.W", "UP.A", "UP.Y", "MF.Y", "MS.Y", "MH.W", "MH.Y", "LO.Y", "BW.Y", "MA.W", "MA.S",
    // coastal and lakeshore
    "CF.W", "CF.A", "CF.Y", "CF.S", "LS.W", "LS.A", "LS.Y", "LS.S", "SU.W", "SU.Y", "RP.S",
    "BH.S",
    // tropical
    "HU.W", "HU.A", "HU.S", "TR.W", "TR.A", "TY.W", "TY.A", "SS.W", "SS.A", "HI.W", "HI.A",
    "TI.W", "TI.A",
    // hydrologic
    "FA.W", "FA.A", "FA.Y", "FF.W", "FF.A", "FF.S", "FL.W", "FL.A", "FL.Y", "FL.S", "HY.Y",
    "HY.S", "HY.O",
    // convective
    "TO.W", "TO.A", "SV.W", "SV.A", "SV.S",
    // tsunami
    "TS.W", "TS.A", "TS.Y",
];

/// Cross-phenomenon upgrades: `(upgraded-to, [replaced...])`.
///
/// Same-phenomenon upgrades (a `W` replacing the `A` or `Y` of the same
/// phenomenon) are implied and not listed.
const UPGRADE_TABLE: &[(&str, &[&str])] = &[
    ("BZ.W", &["WS.A", "WW.Y", "ZR.Y", "LE.A", "WS.W"]),
    ("WS.W", &["BZ.A", "WW.Y", "ZR.Y", "LE.A", "LE.Y"]),
    ("IS.W", &["WS.A", "BZ.A", "WW.Y", "ZR.Y"]),
    ("LE.W", &["WS.A", "WW.Y", "LE.Y"]),
    ("EC.W", &["EC.A", "WC.Y", "WC.A"]),
    ("WC.W", &["EC.A"]),
    ("EH.W", &["HT.Y"]),
    ("XH.W", &["EH.A", "HT.Y"]),
    ("HW.W", &["WI.Y", "LW.Y"]),
    ("DS.W", &["DU.Y", "DS.Y"]),
    ("HZ.W", &["FZ.A", "FR.Y"]),
    ("FZ.W", &["FR.Y", "HZ.A"]),
    ("AF.W", &["AF.Y"]),
    ("GL.W", &["SC.Y", "SW.Y", "RB.Y", "SI.Y"]),
    ("SE.W", &["SC.Y", "SW.Y", "RB.Y"]),
    ("SR.W", &["GL.W", "GL.A", "SC.Y", "SE.A"]),
    ("HF.W", &["SR.W", "SR.A", "GL.W", "GL.A"]),
    ("UP.W", &["UP.Y", "FZ.A"]),
    ("MH.W", &["MH.Y"]),
    ("SU.W", &["SU.Y"]),
    ("TR.W", &["HU.A", "TY.A"]),
    ("HU.W", &["TR.W", "TR.A", "TY.A"]),
    ("TY.W", &["TR.W", "TR.A", "HU.A"]),
    ("SS.W", &["SS.A"]),
    ("FF.W", &["FA.Y", "FA.A"]),
    ("FA.W", &["FF.A"]),
    ("FL.W", &["FL.Y"]),
    ("TO.W", &["SV.W"]),
    ("TS.W", &["TS.Y"]),
];

/// A recognised (phenomenon, significance) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct PhenSig {
    phen: &'static str,
    sig: Significance,
}

impl PhenSig {
    /// Looks up `phen` + `sig` in the hazard table.
    pub fn new(phen: &str, sig: &str) -> Result<Self, InvalidId> {
        let raw = format!("{phen}.{sig}");
        let significance = Significance::parse_str(sig).ok_or_else(|| InvalidId::PhenSig {
            raw: raw.clone(),
            reason: "unknown significance".into(),
        })?;
        HAZARD_TABLE
            .iter()
            .copied()
            .find(|entry| *entry == raw)
            .map(|entry| Self {
                phen: &entry[..2],
                sig: significance,
            })
            .ok_or(InvalidId::PhenSig {
                raw,
                reason: "not in the hazard table".into(),
            })
    }

    /// Parses the dotted form (`WS.A`).
    pub fn parse(raw: &str) -> Result<Self, InvalidId> {
        match raw.trim().split_once('.') {
            Some((phen, sig)) => Self::new(phen, sig),
            None => Err(InvalidId::PhenSig {
                raw: raw.to_string(),
                reason: "expected PP.S".into(),
            }),
        }
    }

    pub fn phen(&self) -> &'static str {
        self.phen
    }

    pub fn sig(&self) -> Significance {
        self.sig
    }

    /// Every pair in the hazard table, in table order.
    pub fn all() -> impl Iterator<Item = PhenSig> {
        HAZARD_TABLE.iter().filter_map(|raw| PhenSig::parse(raw).ok())
    }

    /// True when `self` replacing `older` in the same zone is an upgrade.
    pub fn upgrades(&self, older: &PhenSig) -> bool {
        if self == older {
            return false;
        }
        if self.phen == older.phen && self.sig.rank() > older.sig.rank() {
            return true;
        }
        let this = self.to_string();
        let older = older.to_string();
        UPGRADE_TABLE
            .iter()
            .any(|(to, from)| *to == this && from.iter().any(|f| *f == older))
    }
}

impl Ord for PhenSig {
    fn cmp(&self, other: &Self) -> Ordering {
        self.phen
            .cmp(other.phen)
            .then_with(|| self.sig.cmp(&other.sig))
    }
}

impl PartialOrd for PhenSig {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PhenSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhenSig({self})")
    }
}

impl fmt::Display for PhenSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.phen, self.sig.as_str())
    }
}

impl std::str::FromStr for PhenSig {
    type Err = InvalidId;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhenSig::parse(s)
    }
}

// `phen` points into the static table; read an owned string and look it up.
impl<'de> Deserialize<'de> for PhenSig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PhenSig::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl From<PhenSig> for String {
    fn from(ps: PhenSig) -> String {
        ps.to_string()
    }
}

/// VTEC action code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    New,
    Con,
    Ext,
    Exa,
    Exb,
    Upg,
    Can,
    Exp,
    Cor,
    Rou,
}

crate::enum_str! {
    impl Action {
        pub fn as_str(&self) -> &'static str;
        pub fn parse_str(raw: &str) -> Option<Self>;
        variants {
            New => ["NEW"],
            Con => ["CON"],
            Ext => ["EXT"],
            Exa => ["EXA"],
            Exb => ["EXB"],
            Upg => ["UPG"],
            Can => ["CAN"],
            Exp => ["EXP"],
            Cor => ["COR"],
            Rou => ["ROU"],
        }
    }
}

impl Action {
    /// CAN, EXP and UPG end an event in the zones they name.
    pub fn is_closing(self) -> bool {
        matches!(self, Action::Can | Action::Exp | Action::Upg)
    }

    /// Actions that bring a zone into an event in this product.
    pub fn is_issuing(self) -> bool {
        matches!(self, Action::New | Action::Exa | Action::Exb)
    }

    /// Whether a segment with this action is written back to the active table.
    pub fn is_recorded(self) -> bool {
        !matches!(self, Action::Rou)
    }
}

impl TryFrom<String> for Action {
    type Error = InvalidId;
    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Action::parse_str(&raw).ok_or(InvalidId::Action {
            raw,
            reason: "unknown action code".into(),
        })
    }
}

impl From<Action> for String {
    fn from(action: Action) -> String {
        action.as_str().to_string()
    }
}

/// Forecaster-supplied lifecycle hint on a proposed hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardStatus {
    Pending,
    Issued,
    Ending,
    Ended,
    Elapsed,
}

crate::enum_str! {
    impl HazardStatus {
        pub fn as_str(&self) -> &'static str;
        pub fn parse_str(raw: &str) -> Option<Self>;
        variants {
            Pending => ["pending"],
            Issued => ["issued"],
            Ending => ["ending"],
            Ended => ["ended"],
            Elapsed => ["elapsed"],
        }
    }
}

impl HazardStatus {
    /// Ended/elapsed hazards take no further part in classification.
    pub fn is_withdrawn(self) -> bool {
        matches!(self, HazardStatus::Ended | HazardStatus::Elapsed)
    }
}

/// First character of a VTEC line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductClass {
    #[default]
    Operational,
    Test,
    Experimental,
    ExperimentalInOperational,
}

crate::enum_str! {
    impl ProductClass {
        pub fn as_str(&self) -> &'static str;
        pub fn parse_str(raw: &str) -> Option<Self>;
        variants {
            Operational => ["O", "operational"],
            Test => ["T", "test"],
            Experimental => ["E", "experimental"],
            ExperimentalInOperational => ["X", "experimental_in_operational"],
        }
    }
}
