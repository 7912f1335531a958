use serde::{Deserialize, Serialize};

/// Uniformly sampled single-lead recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Recording length in seconds.
    pub fn duration(&self) -> f64 {
        if self.fs <= 0.0 {
            return 0.0;
        }
        self.data.len() as f64 / self.fs
    }
    /// Number of samples covered by `seconds` (truncated).
    pub fn samples_for(&self, seconds: f64) -> usize {
        seconds_to_samples(seconds, self.fs)
    }
}

pub(crate) fn seconds_to_samples(seconds: f64, fs: f64) -> usize {
    let n = seconds * fs;
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
    /// Successive differences in samples. Empty with fewer than two events.
    pub fn intervals(&self) -> Vec<usize> {
        self.indices
            .windows(2)
            .map(|w| w[1].saturating_sub(w[0]))
            .collect()
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn from_events(events: &Events, fs: f64) -> Self {
        let rr = events
            .intervals()
            .into_iter()
            .map(|dt| dt as f64 / fs)
            .collect();
        Self { rr }
    }
    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_need_two_events() {
        assert!(Events::from_indices(vec![42]).intervals().is_empty());
        assert_eq!(
            Events::from_indices(vec![10, 370, 720]).intervals(),
            vec![360, 350]
        );
    }

    #[test]
    fn rr_series_in_seconds() {
        let events = Events::from_indices(vec![0, 360, 900]);
        let rr = RRSeries::from_events(&events, 360.0);
        assert_eq!(rr.rr, vec![1.0, 1.5]);
    }

    #[test]
    fn samples_for_truncates() {
        let ts = TimeSeries::new(360.0, vec![0.0; 10]);
        assert_eq!(ts.samples_for(2.0), 720);
        assert_eq!(ts.samples_for(0.2), 72);
        assert_eq!(ts.samples_for(-1.0), 0);
    }
}
