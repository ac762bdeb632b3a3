//! VTEC engine proper: classification and commit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{PhenSig, ProductClass};
use crate::windows::Windows;

mod canonical;
mod classify;
mod commit;
mod segment;

pub use classify::classify;
pub use commit::commit;
pub use segment::Segment;

/// Per-issuance knobs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyOptions {
    pub product_class: ProductClass,
    pub windows: Windows,
    /// Phen/sigs this product is responsible for closing. `None` means every
    /// phen/sig with a live record.
    pub hazard_filter: Option<BTreeSet<PhenSig>>,
    /// Correction issuance: CON is emitted as COR.
    pub correction: bool,
    /// Routine issuance: every segment is ROU with ETN 0000.
    pub routine: bool,
}

#[cfg(test)]
mod props;
