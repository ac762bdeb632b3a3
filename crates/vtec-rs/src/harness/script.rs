//! Test-drive scripts: a base time plus a sequence of issuances.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{
    Etn, EventId, HOUR_MS, Hazard, HazardStatus, Office, PhenSig, ProductClass, Timestamp,
    ZoneSet,
};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Falls back to the configured default office.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office: Option<Office>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_class: Option<ProductClass>,
    /// Hazard offsets are hours from here.
    #[serde(with = "rfc3339")]
    pub base_time: Timestamp,
    pub steps: Vec<Step>,
}

/// One simulated issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absolute wall clock; wins over `offset_hours`.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "rfc3339::option")]
    pub time: Option<Timestamp>,
    /// Wall clock relative to the script base time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_hours: Option<f64>,
    #[serde(default)]
    pub hazards: Vec<ScriptHazard>,
    #[serde(default = "default_commit")]
    pub commit: bool,
    #[serde(default)]
    pub correction: bool,
    #[serde(default)]
    pub routine: bool,
    /// Substrings that must appear, in this order, in the rendered product.
    #[serde(default)]
    pub expect: Vec<String>,
    /// Substrings that must not appear anywhere in the rendered product.
    #[serde(default)]
    pub reject: Vec<String>,
}

fn default_commit() -> bool {
    true
}

/// A proposed hazard with times as hour offsets from the script base time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptHazard {
    pub phen_sig: PhenSig,
    pub zones: ZoneSet,
    pub start: f64,
    /// Required unless `ufn` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default)]
    pub ufn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HazardStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etn: Option<Etn>,
}

impl Script {
    /// Reads a script; `.toml` files are TOML, anything else JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Script {
            reason: e.to_string(),
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Script {
            reason: e.to_string(),
        })
    }
}

impl Step {
    pub fn issue_time(&self, base: Timestamp) -> Timestamp {
        match (self.time, self.offset_hours) {
            (Some(at), _) => at,
            (None, Some(hours)) => base.saturating_add_ms(hours_to_ms(hours)),
            (None, None) => base,
        }
    }

    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("{} ({name})", index + 1),
            None => (index + 1).to_string(),
        }
    }
}

impl ScriptHazard {
    pub fn to_hazard(&self, base: Timestamp) -> Result<Hazard> {
        let start = base.saturating_add_ms(hours_to_ms(self.start));
        let mut hazard = match (self.ufn, self.end) {
            (true, _) => Hazard::until_further_notice(self.phen_sig, self.zones.clone(), start),
            (false, Some(end)) => Hazard::new(
                self.phen_sig,
                self.zones.clone(),
                start,
                base.saturating_add_ms(hours_to_ms(end)),
            ),
            (false, None) => {
                return Err(Error::Script {
                    reason: format!("{} hazard has no end and is not ufn", self.phen_sig),
                });
            }
        };
        hazard.event_id = self.event_id.clone();
        hazard.status = self.status;
        hazard.segment_tag = self.segment;
        hazard.etn = self.etn;
        Ok(hazard)
    }
}

fn hours_to_ms(hours: f64) -> i64 {
    (hours * HOUR_MS as f64).round() as i64
}

mod rfc3339 {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(ts)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse_rfc3339(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use crate::core::Timestamp;

        pub fn serialize<S: Serializer>(
            ts: &Option<Timestamp>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.collect_str(ts),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| Timestamp::parse_rfc3339(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
