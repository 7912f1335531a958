use crate::{
    detectors::peaks::{find_peaks, local_maxima},
    error::{check_sampling_frequency, ScanError},
    metrics::rr::{rr_irregularity, RrIrregularity},
    signal::{seconds_to_samples, Events, RRSeries, TimeSeries},
};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Parameters for the peak-based AF episode detector.
#[derive(Debug, Clone, Copy)]
pub struct AfDetectorConfig {
    /// Minimum spacing between R-peaks (seconds); 0.6 s caps detection at 100 bpm.
    pub r_peak_distance_s: f64,
    /// Span before each R-peak searched for a P-wave (seconds).
    pub p_search_window_s: f64,
}

impl Default for AfDetectorConfig {
    fn default() -> Self {
        Self {
            r_peak_distance_s: 0.6,
            p_search_window_s: 0.2,
        }
    }
}

/// Candidate AF episode in absolute sample positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfEpisode {
    pub onset: usize,
    pub offset: usize,
}

/// Everything one detector invocation produced for a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfDetection {
    /// Absolute sample position of the segment's first sample.
    pub window_start: usize,
    /// R-peak positions relative to the segment.
    pub r_peaks: Events,
    /// RR intervals in samples.
    pub rr_intervals: Vec<usize>,
    pub irregularity: Option<RrIrregularity>,
    /// Number of beats with no P-wave in their search window.
    pub beats_without_p: usize,
    pub episode: Option<AfEpisode>,
}

impl AfDetection {
    pub fn onset_offset(&self) -> (Option<usize>, Option<usize>) {
        match self.episode {
            Some(ep) => (Some(ep.onset), Some(ep.offset)),
            None => (None, None),
        }
    }
}

/// Local maxima separated by the configured refractory distance.
pub fn find_r_peaks(segment: &[f64], fs: f64, cfg: &AfDetectorConfig) -> Events {
    let distance = seconds_to_samples(cfg.r_peak_distance_s, fs).max(1);
    Events::from_indices(find_peaks(segment, distance))
}

/// Successive R-peak differences in samples; empty with fewer than two peaks.
pub fn calculate_rr_intervals(r_peaks: &Events) -> Vec<usize> {
    r_peaks.intervals()
}

/// P-wave candidates in the tail of a beat segment running from one R-peak
/// up to (not including) the next.
///
/// Positions are relative to `beat_segment`.
pub fn find_p_peaks(beat_segment: &[f64], fs: f64, cfg: &AfDetectorConfig) -> Vec<usize> {
    let window = seconds_to_samples(cfg.p_search_window_s, fs);
    let start = beat_segment.len().saturating_sub(window);
    local_maxima(&beat_segment[start..])
        .into_iter()
        .map(|p| p + start)
        .collect()
}

/// Scan one segment for beats lacking a preceding P-wave.
///
/// The first such beat sets the onset and every later one moves the offset,
/// so at most one episode is reported per call. `window_start` is the
/// absolute position of `segment[0]` and is added to both ends.
pub fn detect_af_episode(
    segment: &[f64],
    fs: f64,
    window_start: usize,
    cfg: &AfDetectorConfig,
) -> Result<AfDetection, ScanError> {
    check_sampling_frequency(fs)?;

    let r_peaks = find_r_peaks(segment, fs, cfg);
    let rr_intervals = calculate_rr_intervals(&r_peaks);
    let irregularity = rr_irregularity(&RRSeries::from_events(&r_peaks, fs));

    let mut episode: Option<AfEpisode> = None;
    let mut beats_without_p = 0;
    for pair in r_peaks.indices.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if !find_p_peaks(&segment[prev..next], fs, cfg).is_empty() {
            continue;
        }
        beats_without_p += 1;
        let position = window_start + next;
        match episode.as_mut() {
            Some(ep) => ep.offset = position,
            None => {
                episode = Some(AfEpisode {
                    onset: position,
                    offset: position,
                })
            }
        }
    }

    debug!(
        "segment at {}: {} R-peaks, {} beats without P-wave",
        window_start,
        r_peaks.len(),
        beats_without_p
    );

    Ok(AfDetection {
        window_start,
        r_peaks,
        rr_intervals,
        irregularity,
        beats_without_p,
        episode,
    })
}

/// Number of whole segments of `segment_s` seconds that fit in the signal.
pub fn segment_count(signal_len: usize, fs: f64, segment_s: f64) -> Result<usize, ScanError> {
    let width = segment_width(signal_len, fs, segment_s)?;
    Ok(signal_len / width)
}

/// Sample range of segment `index`, or `None` past the last whole segment.
pub fn segment_bounds(
    signal_len: usize,
    fs: f64,
    segment_s: f64,
    index: usize,
) -> Result<Option<Range<usize>>, ScanError> {
    let width = segment_width(signal_len, fs, segment_s)?;
    let start = index.saturating_mul(width);
    let end = start.saturating_add(width);
    Ok((end <= signal_len).then_some(start..end))
}

fn segment_width(signal_len: usize, fs: f64, segment_s: f64) -> Result<usize, ScanError> {
    check_sampling_frequency(fs)?;
    if segment_s.is_nan() || segment_s <= 0.0 {
        return Err(ScanError::NonPositiveWindow(segment_s));
    }
    let width = seconds_to_samples(segment_s, fs);
    if width == 0 {
        return Err(ScanError::NonPositiveWindow(segment_s));
    }
    if width > signal_len {
        return Err(ScanError::WindowExceedsSignal {
            window: width,
            signal_len,
        });
    }
    Ok(width)
}

/// Run the detector on `index`-th segment of a recording.
pub fn detect_af_in_segment(
    ts: &TimeSeries,
    segment_s: f64,
    index: usize,
    cfg: &AfDetectorConfig,
) -> Result<Option<AfDetection>, ScanError> {
    match segment_bounds(ts.len(), ts.fs, segment_s, index)? {
        Some(range) => {
            let start = range.start;
            detect_af_episode(&ts.data[range], ts.fs, start, cfg).map(Some)
        }
        None => Ok(None),
    }
}

/// Run the detector on every whole segment, in order.
pub fn detect_af_episodes(
    ts: &TimeSeries,
    segment_s: f64,
    cfg: &AfDetectorConfig,
) -> Result<Vec<AfDetection>, ScanError> {
    let width = segment_width(ts.len(), ts.fs, segment_s)?;
    let count = ts.len() / width;
    (0..count)
        .into_par_iter()
        .map(|i| {
            let start = i * width;
            detect_af_episode(&ts.data[start..start + width], ts.fs, start, cfg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::beats_with_p_waves;

    const FS: f64 = 360.0;

    #[test]
    fn p_wave_missing_before_last_beat() {
        let r = [180, 648, 1116];
        let p = [180 - 43, 648 - 43];
        let segment = beats_with_p_waves(FS, 1300, &r, &p);
        let cfg = AfDetectorConfig::default();

        let detection = detect_af_episode(&segment, FS, 0, &cfg).unwrap();
        assert_eq!(detection.r_peaks.indices, r.to_vec());
        assert_eq!(detection.rr_intervals, vec![468, 468]);
        assert_eq!(detection.beats_without_p, 1);
        assert_eq!(detection.onset_offset(), (Some(1116), Some(1116)));
    }

    #[test]
    fn onset_and_offset_are_absolute() {
        let r = [180, 648, 1116, 1584];
        let p = [180 - 43, 648 - 43];
        let segment = beats_with_p_waves(FS, 1800, &r, &p);
        let detection = detect_af_episode(&segment, FS, 7200, &AfDetectorConfig::default()).unwrap();
        assert_eq!(
            detection.episode,
            Some(AfEpisode {
                onset: 7200 + 1116,
                offset: 7200 + 1584
            })
        );
    }

    #[test]
    fn organised_rhythm_has_no_episode() {
        let r = [180, 648, 1116];
        let p = [180 - 43, 648 - 43, 1116 - 43];
        let segment = beats_with_p_waves(FS, 1300, &r, &p);
        let detection = detect_af_episode(&segment, FS, 0, &AfDetectorConfig::default()).unwrap();
        assert_eq!(detection.beats_without_p, 0);
        assert_eq!(detection.onset_offset(), (None, None));
    }

    #[test]
    fn fewer_than_two_peaks_reports_nothing() {
        let single = beats_with_p_waves(FS, 720, &[360], &[]);
        let detection = detect_af_episode(&single, FS, 0, &AfDetectorConfig::default()).unwrap();
        assert_eq!(detection.r_peaks.len(), 1);
        assert!(detection.rr_intervals.is_empty());
        assert!(detection.irregularity.is_none());
        assert_eq!(detection.onset_offset(), (None, None));

        let flat = vec![0.0; 720];
        let detection = detect_af_episode(&flat, FS, 0, &AfDetectorConfig::default()).unwrap();
        assert!(detection.r_peaks.is_empty());
        assert_eq!(detection.onset_offset(), (None, None));

        let empty: Vec<f64> = Vec::new();
        assert!(detect_af_episode(&empty, FS, 0, &AfDetectorConfig::default())
            .unwrap()
            .episode
            .is_none());
    }

    #[test]
    fn rejects_bad_sampling_frequency() {
        let err = detect_af_episode(&[0.0; 10], 0.0, 0, &AfDetectorConfig::default()).unwrap_err();
        assert_eq!(err, ScanError::InvalidSamplingFrequency(0.0));
    }

    #[test]
    fn refractory_distance_merges_close_peaks() {
        // two spikes 100 samples apart at 360 Hz are inside the 216-sample refractory span
        let segment = beats_with_p_waves(FS, 1000, &[300, 400], &[]);
        let peaks = find_r_peaks(&segment, FS, &AfDetectorConfig::default());
        assert_eq!(peaks.len(), 1);
    }

    #[test]
    fn p_search_window_limited_to_tail() {
        let mut beat = vec![0.0; 300];
        beat[50] = 0.2; // early bump outside the 72-sample tail
        assert!(find_p_peaks(&beat, FS, &AfDetectorConfig::default()).is_empty());
        beat[260] = 0.2;
        assert_eq!(find_p_peaks(&beat, FS, &AfDetectorConfig::default()), vec![260]);
    }

    #[test]
    fn segment_paging_uses_explicit_index() {
        let len = 3600;
        assert_eq!(segment_count(len, FS, 2.0).unwrap(), 5);
        assert_eq!(segment_bounds(len, FS, 2.0, 0).unwrap(), Some(0..720));
        assert_eq!(segment_bounds(len, FS, 2.0, 4).unwrap(), Some(2880..3600));
        assert_eq!(segment_bounds(len, FS, 2.0, 5).unwrap(), None);
        assert!(segment_bounds(len, FS, 0.0, 0).is_err());
        assert_eq!(
            segment_bounds(100, FS, 2.0, 0).unwrap_err(),
            ScanError::WindowExceedsSignal {
                window: 720,
                signal_len: 100
            }
        );
    }

    #[test]
    fn every_segment_is_scanned_in_order() {
        let r: Vec<usize> = (0..8).map(|i| 180 + i * 468).collect();
        let ts = TimeSeries::new(FS, beats_with_p_waves(FS, 3960, &r, &[]));
        let detections = detect_af_episodes(&ts, 5.0, &AfDetectorConfig::default()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].window_start, 0);
        assert_eq!(detections[1].window_start, 1800);
        assert!(detections.iter().all(|d| d.episode.is_some()));

        let second = detect_af_in_segment(&ts, 5.0, 1, &AfDetectorConfig::default()).unwrap();
        assert_eq!(second.map(|d| d.window_start), Some(1800));
        assert!(detect_af_in_segment(&ts, 5.0, 2, &AfDetectorConfig::default())
            .unwrap()
            .is_none());
    }
}
