use crate::signal::{Events, TimeSeries};
use serde::{Deserialize, Serialize};

/// Parameters for the Pan–Tompkins style beat detector behind the heart-rate estimate.
#[derive(Debug, Clone, Copy)]
pub struct BeatDetectorConfig {
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Refractory period between detections (seconds).
    pub min_rr_s: f64,
    /// Scale between noise and signal envelopes for the adaptive threshold.
    pub threshold_scale: f64,
    /// How far back to search (seconds) for the precise R-peak after a detection.
    pub search_back_s: f64,
}

impl Default for BeatDetectorConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            integration_window_s: 0.150,
            min_rr_s: 0.120,
            threshold_scale: 0.6,
            search_back_s: 0.150,
        }
    }
}

/// Whole-record heart rate estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRate {
    pub bpm: u32,
    pub beats: usize,
}

impl HeartRate {
    /// Length of one cardiac cycle in samples, or `None` at 0 bpm.
    pub fn cycle_samples(&self, fs: f64) -> Option<usize> {
        if self.bpm == 0 {
            return None;
        }
        let samples = (fs * 60.0 / self.bpm as f64) as usize;
        Some(samples.max(1))
    }
}

/// Count dominant beats over the whole signal and divide by its length in minutes.
///
/// Coarse single-pass figure; a flat or empty signal yields 0 bpm.
pub fn estimate_heart_rate(ts: &TimeSeries) -> HeartRate {
    estimate_heart_rate_with_config(ts, &BeatDetectorConfig::default())
}

pub fn estimate_heart_rate_with_config(ts: &TimeSeries, cfg: &BeatDetectorConfig) -> HeartRate {
    let duration = ts.duration();
    if duration <= 0.0 {
        return HeartRate { bpm: 0, beats: 0 };
    }
    let beats = detect_beats(ts, cfg).len();
    let bpm = (beats as f64 * 60.0 / duration) as u32;
    HeartRate { bpm, beats }
}

/// Beat positions from the band-pass / derivative / squaring / integration chain.
pub fn detect_beats(ts: &TimeSeries, cfg: &BeatDetectorConfig) -> Events {
    if ts.is_empty() || ts.fs <= 0.0 {
        return Events::default();
    }

    let bandpassed = bandpass(&ts.data, ts.fs, cfg.lowcut_hz, cfg.highcut_hz);
    let envelope = integrate(&square(&derivative(&bandpassed)), ts.fs, cfg);
    let peaks = adaptive_threshold_peaks(&bandpassed, &envelope, ts.fs, cfg);

    if peaks.len() < 2 {
        // adaptive thresholding can starve on very short or low-amplitude input
        return Events::from_indices(baseline_crossing_peaks(ts, cfg));
    }
    Events::from_indices(peaks)
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    let hp = if low > 0.0 {
        highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        lowpass(&hp, fs, high)
    }
}

fn rc_constant(cutoff: f64) -> f64 {
    1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01))
}

fn highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let rc = rc_constant(cutoff);
    let alpha = rc / (rc + 1.0 / fs);
    let (mut prev_x, mut prev_y) = (first, first);
    data.iter()
        .map(|&x| {
            prev_y = alpha * (prev_y + x - prev_x);
            prev_x = x;
            prev_y
        })
        .collect()
}

fn lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let dt = 1.0 / fs;
    let alpha = dt / (rc_constant(cutoff) + dt);
    let mut prev = first;
    data.iter()
        .map(|&x| {
            prev += alpha * (x - prev);
            prev
        })
        .collect()
}

fn derivative(data: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    if !data.is_empty() {
        out.push(0.0);
        out.extend(data.windows(2).map(|w| w[1] - w[0]));
    }
    out
}

fn square(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x * x).collect()
}

fn integrate(data: &[f64], fs: f64, cfg: &BeatDetectorConfig) -> Vec<f64> {
    let win = ((cfg.integration_window_s * fs).round() as usize).max(1);
    trailing_mean(data, win)
}

fn trailing_mean(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 {
        return data.to_vec();
    }
    let mut acc = 0.0;
    data.iter()
        .enumerate()
        .map(|(i, &sample)| {
            acc += sample;
            if i >= win {
                acc -= data[i - win];
            }
            acc / win as f64
        })
        .collect()
}

fn adaptive_threshold_peaks(
    bandpassed: &[f64],
    envelope: &[f64],
    fs: f64,
    cfg: &BeatDetectorConfig,
) -> Vec<usize> {
    if bandpassed.is_empty() || envelope.is_empty() {
        return Vec::new();
    }

    let refractory = ((cfg.min_rr_s * fs).round() as usize).max(1);
    let search = ((cfg.search_back_s * fs).round() as usize).max(1);

    let init = envelope.len().min((fs as usize).max(1));
    let avg = envelope[..init].iter().sum::<f64>() / init as f64;
    let mut signal_level = avg;
    let mut noise_level = avg * 0.5;
    let mut threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    let mut last_detection: Option<usize> = None;
    let mut peaks = Vec::new();

    for (i, &sample) in envelope.iter().enumerate() {
        let refractory_ok = last_detection.map_or(true, |last| i - last >= refractory);
        if sample > 0.0 && sample >= threshold && refractory_ok {
            let start = i.saturating_sub(search);
            let end = i.min(bandpassed.len() - 1);
            let idx = (start..=end)
                .max_by(|&a, &b| bandpassed[a].total_cmp(&bandpassed[b]))
                .unwrap_or(i);
            peaks.push(idx);
            last_detection = Some(i);
            signal_level = 0.125 * sample + 0.875 * signal_level;
        } else {
            noise_level = 0.125 * sample + 0.875 * noise_level;
        }
        threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

fn baseline_crossing_peaks(ts: &TimeSeries, cfg: &BeatDetectorConfig) -> Vec<usize> {
    let data = &ts.data;
    if data.len() < 3 {
        return Vec::new();
    }
    let min_gap = ((cfg.min_rr_s * ts.fs) as usize).max(1);
    let baseline = trailing_mean(data, ((0.150 * ts.fs) as usize).max(1));
    let detrended: Vec<f64> = data.iter().zip(&baseline).map(|(x, b)| x - b).collect();

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..detrended.len() - 1 {
        let y = detrended[i];
        let is_peak = y > 0.0 && y > detrended[i - 1] && y > detrended[i + 1];
        let spaced = peaks.last().map_or(true, |&last| i - last >= min_gap);
        if is_peak && spaced {
            peaks.push(i);
        }
    }
    peaks
}
