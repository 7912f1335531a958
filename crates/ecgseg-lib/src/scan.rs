use crate::{
    annotations::{valid_intervals, AnnotationSet, RhythmInterval},
    classify::{classify, BeatClass, AF_LABEL, NON_AF_LABEL},
    config::{ScanConfig, StepMode},
    detectors::ecg::{estimate_heart_rate, HeartRate},
    error::{check_sampling_frequency, ScanError},
    signal::TimeSeries,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The four inputs a scan needs from the record loader, borrowed read-only.
#[derive(Debug, Clone, Copy)]
pub struct RecordInput<'a> {
    pub record_id: &'a str,
    pub signal: &'a TimeSeries,
    pub annotations: &'a AnnotationSet,
    /// Whole-record rhythm label, e.g. `"AF"` or `"non-AF"`.
    pub label: Option<&'a str>,
}

/// How windows are laid over a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStrategy {
    /// Tile the whole signal; every window carries the record label.
    FixedTiling,
    /// Walk annotated AF and non-AF rhythm intervals one cardiac cycle at a time.
    RhythmIntervalWalk,
}

impl ScanStrategy {
    /// Records with any rhythm note in their aux channel are walked by interval.
    pub fn select(annotations: &AnnotationSet) -> Self {
        if annotations.has_rhythm_markers() {
            ScanStrategy::RhythmIntervalWalk
        } else {
            ScanStrategy::FixedTiling
        }
    }
}

/// One labelled window of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub record_id: String,
    /// First sample of the window.
    pub left: usize,
    /// One past the last sample of the window.
    pub right: usize,
    pub samples: Vec<f64>,
    pub symbols: Vec<String>,
    /// Annotation positions relative to `left`.
    pub positions: Vec<usize>,
    pub pac_percent: f64,
    pub pvc_percent: f64,
    pub heart_rate_bpm: u32,
    pub label: Option<String>,
    pub class: BeatClass,
}

struct ScanContext<'a> {
    input: &'a RecordInput<'a>,
    width: usize,
    heart_rate: HeartRate,
}

impl ScanContext<'_> {
    fn window(&self, left: usize, label: Option<&str>) -> WindowRecord {
        let right = left + self.width;
        let hits = self.input.annotations.query(left, right);
        let ectopy = hits.ectopy();
        WindowRecord {
            record_id: self.input.record_id.to_string(),
            left,
            right,
            samples: self.input.signal.data[left..right].to_vec(),
            symbols: hits.symbols,
            positions: hits.positions,
            pac_percent: ectopy.pac_percent,
            pvc_percent: ectopy.pvc_percent,
            heart_rate_bpm: self.heart_rate.bpm,
            label: label.map(str::to_string),
            class: classify(label, ectopy.pac_percent, ectopy.pvc_percent),
        }
    }

    /// Windows starting at `start`, advancing by `step`, while they end by `end`.
    fn walk(
        &self,
        start: usize,
        end: usize,
        step: usize,
        label: Option<&str>,
        skip_unannotated: bool,
        out: &mut Vec<WindowRecord>,
    ) {
        let mut left = start;
        while left + self.width <= end {
            let window = self.window(left, label);
            if !(skip_unannotated && window.symbols.is_empty()) {
                out.push(window);
            }
            left += step;
        }
    }

    fn cycle_step(&self, beats: usize) -> usize {
        match self.heart_rate.cycle_samples(self.input.signal.fs) {
            Some(cycle) => (cycle * beats.max(1)).max(1),
            None => {
                warn!(
                    "record {}: heart rate estimate is 0 bpm, stepping by window width",
                    self.input.record_id
                );
                self.width
            }
        }
    }
}

/// Window width in samples, rejecting widths that cannot produce a window.
pub fn window_samples(signal: &TimeSeries, window_width_s: f64) -> Result<usize, ScanError> {
    check_sampling_frequency(signal.fs)?;
    if window_width_s.is_nan() || window_width_s <= 0.0 {
        return Err(ScanError::NonPositiveWindow(window_width_s));
    }
    let width = signal.samples_for(window_width_s);
    if width == 0 {
        return Err(ScanError::NonPositiveWindow(window_width_s));
    }
    if width > signal.len() {
        return Err(ScanError::WindowExceedsSignal {
            window: width,
            signal_len: signal.len(),
        });
    }
    Ok(width)
}

/// Segment one record into labelled windows.
///
/// The strategy follows [`ScanStrategy::select`]. Window order within the
/// record is deterministic; identical inputs yield identical output.
pub fn scan_record(
    input: &RecordInput<'_>,
    cfg: &ScanConfig,
) -> Result<Vec<WindowRecord>, ScanError> {
    let width = window_samples(input.signal, cfg.window_width_s)?;
    let ctx = ScanContext {
        input,
        width,
        heart_rate: estimate_heart_rate(input.signal),
    };
    let strategy = ScanStrategy::select(input.annotations);
    debug!(
        "record {}: {:?}, {} samples/window, {} bpm",
        input.record_id, strategy, width, ctx.heart_rate.bpm
    );

    let windows = match strategy {
        ScanStrategy::FixedTiling => scan_fixed_tiling(&ctx, cfg),
        ScanStrategy::RhythmIntervalWalk => scan_rhythm_intervals(&ctx, cfg),
    };
    info!("record {}: {} segments", input.record_id, windows.len());
    Ok(windows)
}

fn scan_fixed_tiling(ctx: &ScanContext<'_>, cfg: &ScanConfig) -> Vec<WindowRecord> {
    let step = match cfg.tiling_step {
        StepMode::Window => ctx.width,
        StepMode::HeartCycle { beats } => ctx.cycle_step(beats),
    };
    let mut out = Vec::new();
    ctx.walk(0, ctx.input.signal.len(), step, ctx.input.label, false, &mut out);
    out
}

fn scan_rhythm_intervals(ctx: &ScanContext<'_>, cfg: &ScanConfig) -> Vec<WindowRecord> {
    let input = ctx.input;
    let len = input.signal.len();
    let af = valid_intervals(
        &input.annotations.rhythm_intervals(&cfg.af_rhythm_notes, len),
        ctx.width,
    );
    let non_af = valid_intervals(
        &input.annotations.rhythm_intervals(&cfg.non_af_rhythm_notes, len),
        ctx.width,
    );
    if af.is_empty() && non_af.is_empty() {
        warn!(
            "record {}: no AF or non-AF rhythm interval of at least {} s",
            input.record_id, cfg.window_width_s
        );
        return Vec::new();
    }

    let step = ctx.cycle_step(1);
    let mut out = Vec::new();
    walk_intervals(ctx, &af, step, AF_LABEL, &mut out);
    walk_intervals(ctx, &non_af, step, NON_AF_LABEL, &mut out);
    out
}

fn walk_intervals(
    ctx: &ScanContext<'_>,
    intervals: &[RhythmInterval],
    step: usize,
    label: &str,
    out: &mut Vec<WindowRecord>,
) {
    for interval in intervals {
        debug!(
            "record {}: {} interval {}..{}",
            ctx.input.record_id, label, interval.start, interval.end
        );
        ctx.walk(interval.start, interval.end, step, Some(label), true, out);
    }
}

/// Scan independent records in parallel.
///
/// Windows keep their per-record order; records are concatenated in input order.
pub fn scan_records(
    inputs: &[RecordInput<'_>],
    cfg: &ScanConfig,
) -> Result<Vec<WindowRecord>, ScanError> {
    let per_record = inputs
        .par_iter()
        .map(|input| scan_record(input, cfg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(per_record.into_iter().flatten().collect())
}
