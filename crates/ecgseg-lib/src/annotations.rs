use crate::error::ScanError;
use serde::{Deserialize, Serialize};

/// Beat symbol for a premature atrial contraction.
pub const PAC_SYMBOL: &str = "A";
/// Beat symbol for a premature ventricular contraction.
pub const PVC_SYMBOL: &str = "V";
/// Beat symbol the MIT-BIH convention uses for unclassifiable beats.
pub const UNKNOWN_BEAT_SYMBOL: &str = "Q";
/// Beat symbol for a beat missed by the reference detector.
pub const MISSED_BEAT_SYMBOL: &str = "\"";

/// Expert annotations as three parallel channels of equal length.
///
/// Sample positions are non-decreasing. The invariants are checked once in
/// [`AnnotationSet::new`], so every query below can assume them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnnotationSet")]
pub struct AnnotationSet {
    symbols: Vec<String>,
    samples: Vec<usize>,
    aux: Vec<String>,
}

#[derive(Deserialize)]
struct RawAnnotationSet {
    symbols: Vec<String>,
    samples: Vec<usize>,
    aux: Vec<String>,
}

impl TryFrom<RawAnnotationSet> for AnnotationSet {
    type Error = ScanError;

    fn try_from(raw: RawAnnotationSet) -> Result<Self, Self::Error> {
        Self::new(raw.symbols, raw.samples, raw.aux)
    }
}

impl AnnotationSet {
    pub fn new(
        symbols: Vec<String>,
        samples: Vec<usize>,
        aux: Vec<String>,
    ) -> Result<Self, ScanError> {
        if symbols.len() != samples.len() || samples.len() != aux.len() {
            return Err(ScanError::MismatchedAnnotations {
                symbols: symbols.len(),
                samples: samples.len(),
                aux: aux.len(),
            });
        }
        if let Some(index) = samples.windows(2).position(|w| w[1] < w[0]) {
            return Err(ScanError::UnsortedAnnotations {
                index: index + 1,
                sample: samples[index + 1],
                previous: samples[index],
            });
        }
        Ok(Self {
            symbols,
            samples,
            aux,
        })
    }

    /// Beat annotations without rhythm notes.
    pub fn from_beats<S: Into<String>>(
        beats: impl IntoIterator<Item = (usize, S)>,
    ) -> Result<Self, ScanError> {
        let (samples, symbols): (Vec<usize>, Vec<String>) =
            beats.into_iter().map(|(s, sym)| (s, sym.into())).unzip();
        let aux = vec![String::new(); symbols.len()];
        Self::new(symbols, samples, aux)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
    pub fn samples(&self) -> &[usize] {
        &self.samples
    }
    pub fn aux(&self) -> &[String] {
        &self.aux
    }

    /// True when at least one entry carries a non-blank auxiliary note.
    pub fn has_rhythm_markers(&self) -> bool {
        self.aux.iter().any(|note| is_rhythm_marker(note))
    }

    /// Annotations with `left <= sample <= right`, positions rebased to `left`.
    pub fn query(&self, left: usize, right: usize) -> WindowAnnotations {
        if left > right {
            return WindowAnnotations::default();
        }
        let start = self.samples.partition_point(|&s| s < left);
        let end = self.samples.partition_point(|&s| s <= right);
        WindowAnnotations {
            symbols: self.symbols[start..end].to_vec(),
            positions: self.samples[start..end].iter().map(|s| s - left).collect(),
        }
    }

    pub fn count_symbol(&self, symbol: &str) -> usize {
        self.symbols.iter().filter(|s| s.as_str() == symbol).count()
    }

    /// Record-wide PAC/PVC summary over every annotation.
    pub fn ectopy(&self) -> Ectopy {
        Ectopy::from_symbols(&self.symbols)
    }

    pub fn has_unknown_beat(&self) -> bool {
        self.count_symbol(UNKNOWN_BEAT_SYMBOL) > 0
    }

    pub fn has_missed_beat(&self) -> bool {
        self.count_symbol(MISSED_BEAT_SYMBOL) > 0
    }

    /// Intervals opened by a rhythm marker whose note is in `notes`.
    ///
    /// Each marker runs until the next rhythm marker of any kind, or to
    /// `signal_len` for the last one. Empty or inverted spans are dropped.
    pub fn rhythm_intervals<S: AsRef<str>>(
        &self,
        notes: &[S],
        signal_len: usize,
    ) -> Vec<RhythmInterval> {
        let markers: Vec<usize> = (0..self.len())
            .filter(|&i| is_rhythm_marker(&self.aux[i]))
            .collect();
        let mut intervals = Vec::new();
        for (pos, &i) in markers.iter().enumerate() {
            let note = self.aux[i].trim();
            if !notes.iter().any(|n| n.as_ref() == note) {
                continue;
            }
            let start = self.samples[i];
            let end = markers
                .get(pos + 1)
                .map(|&next| self.samples[next])
                .unwrap_or(signal_len)
                .min(signal_len);
            if end > start {
                intervals.push(RhythmInterval { start, end });
            }
        }
        intervals
    }
}

fn is_rhythm_marker(note: &str) -> bool {
    !note.trim().is_empty()
}

/// Result of an [`AnnotationSet::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowAnnotations {
    pub symbols: Vec<String>,
    /// Positions relative to the window's left edge.
    pub positions: Vec<usize>,
}

impl WindowAnnotations {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
    pub fn ectopy(&self) -> Ectopy {
        Ectopy::from_symbols(&self.symbols)
    }
}

/// Ectopic-beat share of a set of annotations, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ectopy {
    pub total: usize,
    pub pac_count: usize,
    pub pvc_count: usize,
    pub pac_percent: f64,
    pub pvc_percent: f64,
}

impl Ectopy {
    /// Percentages are 0 when there is nothing to count.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        let total = symbols.len();
        let pac_count = symbols.iter().filter(|s| s.as_ref() == PAC_SYMBOL).count();
        let pvc_count = symbols.iter().filter(|s| s.as_ref() == PVC_SYMBOL).count();
        let percent = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        };
        Self {
            total,
            pac_count,
            pvc_count,
            pac_percent: percent(pac_count),
            pvc_percent: percent(pvc_count),
        }
    }
}

/// Span `[start, end)` of samples believed to carry one rhythm label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmInterval {
    pub start: usize,
    pub end: usize,
}

impl RhythmInterval {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Long enough to hold a window of `window` samples.
    pub fn is_valid(&self, window: usize) -> bool {
        self.end > self.start && self.len() >= window
    }
}

/// Keep the intervals that can hold at least one window of `window` samples.
pub fn valid_intervals(intervals: &[RhythmInterval], window: usize) -> Vec<RhythmInterval> {
    intervals
        .iter()
        .copied()
        .filter(|interval| interval.is_valid(window))
        .collect()
}
