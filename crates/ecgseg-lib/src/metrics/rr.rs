use crate::signal::RRSeries;
use serde::{Deserialize, Serialize};

/// Beat-to-beat irregularity of an RR series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrIrregularity {
    pub n: usize,
    /// Mean RR interval (seconds).
    pub mean_rr: f64,
    /// `|RR[i+1] - RR[i]| / mean_rr` for each successive pair.
    pub successive_diffs: Vec<f64>,
    /// Mean of `successive_diffs`, 0 with fewer than two intervals.
    pub mean_successive_diff: f64,
    /// Coefficient of variation (population SD / mean).
    pub rr_cv: f64,
}

/// `None` when the series is empty or its mean is zero.
pub fn rr_irregularity(rr: &RRSeries) -> Option<RrIrregularity> {
    let n = rr.rr.len();
    if n == 0 {
        return None;
    }
    let mean_rr = rr.rr.iter().sum::<f64>() / n as f64;
    if mean_rr <= 0.0 {
        return None;
    }
    let successive_diffs: Vec<f64> = rr
        .rr
        .windows(2)
        .map(|w| (w[1] - w[0]).abs() / mean_rr)
        .collect();
    let mean_successive_diff = if successive_diffs.is_empty() {
        0.0
    } else {
        successive_diffs.iter().sum::<f64>() / successive_diffs.len() as f64
    };
    let sd = (rr.rr.iter().map(|x| (x - mean_rr).powi(2)).sum::<f64>() / n as f64).sqrt();
    Some(RrIrregularity {
        n,
        mean_rr,
        successive_diffs,
        mean_successive_diff,
        rr_cv: sd / mean_rr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_has_no_summary() {
        assert!(rr_irregularity(&RRSeries::default()).is_none());
    }

    #[test]
    fn constant_rhythm_is_regular() {
        let rr = RRSeries {
            rr: vec![0.8, 0.8, 0.8],
        };
        let summary = rr_irregularity(&rr).unwrap();
        assert_eq!(summary.n, 3);
        assert!((summary.mean_rr - 0.8).abs() < 1e-12);
        assert!(summary.rr_cv.abs() < 1e-9);
        assert!(summary.mean_successive_diff.abs() < 1e-12);
    }

    #[test]
    fn irregular_rhythm_scores_higher() {
        let rr = RRSeries {
            rr: vec![0.5, 1.0, 0.6, 0.9],
        };
        let summary = rr_irregularity(&rr).unwrap();
        assert_eq!(summary.successive_diffs.len(), 3);
        assert!((summary.mean_rr - 0.75).abs() < 1e-12);
        assert!((summary.successive_diffs[0] - 0.5 / 0.75).abs() < 1e-12);
        assert!(summary.rr_cv > 0.2);
    }
}
