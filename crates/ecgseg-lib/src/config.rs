use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How far the fixed-tiling scan advances between windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Advance by one window width (non-overlapping tiles).
    #[default]
    Window,
    /// Advance by `beats` estimated cardiac cycles.
    HeartCycle { beats: usize },
}

/// Settings for a windowed segmentation run, loadable from TOML.
///
/// ```toml
/// window_width_s = 5.0
/// tiling_step = { heart_cycle = { beats = 2 } }
/// af_rhythm_notes = ["(AFIB", "(AFL"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Window width in seconds; also the minimum length of a usable rhythm interval.
    pub window_width_s: f64,
    /// Step used when the record has no rhythm markers.
    pub tiling_step: StepMode,
    /// Aux notes that open an AF rhythm interval.
    pub af_rhythm_notes: Vec<String>,
    /// Aux notes that open a non-AF rhythm interval.
    pub non_af_rhythm_notes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_width_s: 2.0,
            tiling_step: StepMode::Window,
            af_rhythm_notes: vec!["(AFIB".into()],
            non_af_rhythm_notes: vec!["(N".into()],
        }
    }
}

impl ScanConfig {
    pub fn with_window_width(mut self, seconds: f64) -> Self {
        self.window_width_s = seconds;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing scan config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }
}
