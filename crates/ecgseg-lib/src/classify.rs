use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-record or interval label for rhythms other than atrial fibrillation.
pub const NON_AF_LABEL: &str = "non-AF";
/// Label for atrial fibrillation records and intervals.
pub const AF_LABEL: &str = "AF";

/// Ectopic share at or above which a window counts as PAC/PVC dominated.
pub const ECTOPY_THRESHOLD_PERCENT: f64 = 20.0;

/// Categorical class assigned to every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeatClass {
    #[serde(rename = "Pure_NSR")]
    PureNsr,
    #[serde(rename = "NSR")]
    Nsr,
    #[serde(rename = "PAC")]
    Pac,
    #[serde(rename = "PVC")]
    Pvc,
    #[serde(rename = "AF")]
    Af,
    #[serde(rename = "Others")]
    Others,
}

impl BeatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeatClass::PureNsr => "Pure_NSR",
            BeatClass::Nsr => "NSR",
            BeatClass::Pac => "PAC",
            BeatClass::Pvc => "PVC",
            BeatClass::Af => "AF",
            BeatClass::Others => "Others",
        }
    }
}

impl fmt::Display for BeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a label and ectopic-beat percentages to a class.
///
/// Rules are checked in order: NSR (refined to Pure_NSR when both shares are
/// zero), PAC, PVC, AF, then Others. An absent label is treated like any
/// label other than [`NON_AF_LABEL`].
pub fn classify(label: Option<&str>, pac_percent: f64, pvc_percent: f64) -> BeatClass {
    let non_af = label == Some(NON_AF_LABEL);
    if non_af && pac_percent < ECTOPY_THRESHOLD_PERCENT && pvc_percent < ECTOPY_THRESHOLD_PERCENT {
        if pac_percent == 0.0 && pvc_percent == 0.0 {
            BeatClass::PureNsr
        } else {
            BeatClass::Nsr
        }
    } else if non_af && pac_percent >= ECTOPY_THRESHOLD_PERCENT && pvc_percent == 0.0 {
        BeatClass::Pac
    } else if non_af && pvc_percent >= ECTOPY_THRESHOLD_PERCENT && pac_percent == 0.0 {
        BeatClass::Pvc
    } else if !non_af && pac_percent == 0.0 && pvc_percent == 0.0 {
        BeatClass::Af
    } else {
        BeatClass::Others
    }
}
