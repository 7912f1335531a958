//! Synthetic ECG traces for unit tests.

use crate::signal::TimeSeries;

/// Gaussian QRS complexes at the given RR spacing on a slow baseline wander.
pub(crate) fn synthetic_timeseries(fs: f64, rr: &[f64]) -> TimeSeries {
    use std::f64::consts::PI;
    let mut beats = Vec::with_capacity(rr.len() + 1);
    let mut t = 0.5;
    beats.push(t);
    for &interval in rr {
        t += interval;
        beats.push(t);
    }
    let duration = beats.last().copied().unwrap_or(1.0) + 1.0;
    let samples = (duration * fs) as usize;
    let data = (0..samples)
        .map(|i| {
            let time = i as f64 / fs;
            let wander = 0.05 * (2.0 * PI * time).sin();
            let qrs: f64 = beats
                .iter()
                .map(|&bt| 1.2 * (-0.5 * ((time - bt) / 0.02).powi(2)).exp())
                .sum();
            wander + qrs
        })
        .collect();
    TimeSeries { fs, data }
}

/// Baseline-free trace with R-peaks and P-waves centred on exact samples.
pub(crate) fn beats_with_p_waves(fs: f64, len: usize, r_peaks: &[usize], p_waves: &[usize]) -> Vec<f64> {
    let width = 0.02 * fs;
    let bump = |i: usize, centre: usize, amp: f64| {
        let z = (i as f64 - centre as f64) / width;
        amp * (-0.5 * z * z).exp()
    };
    (0..len)
        .map(|i| {
            let r: f64 = r_peaks.iter().map(|&c| bump(i, c, 1.2)).sum();
            let p: f64 = p_waves.iter().map(|&c| bump(i, c, 0.15)).sum();
            r + p
        })
        .collect()
}
