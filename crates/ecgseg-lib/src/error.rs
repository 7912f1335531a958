use thiserror::Error;

/// Broad category of a rejected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed annotation data supplied by the loader.
    InvalidInput,
    /// Window or sampling parameters that cannot produce a meaningful scan.
    DegenerateConfiguration,
}

/// Errors raised by boundary validation before a scan or detection starts.
///
/// "Nothing found" outcomes (no annotations in a window, no valid rhythm
/// intervals, no R-peaks) are never errors; they come back as empty results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error(
        "annotation channels have mismatched lengths (symbol={symbols}, sample={samples}, aux={aux})"
    )]
    MismatchedAnnotations {
        symbols: usize,
        samples: usize,
        aux: usize,
    },
    #[error("annotation sample positions must be non-decreasing (entry {index}: {sample} < {previous})")]
    UnsortedAnnotations {
        index: usize,
        sample: usize,
        previous: usize,
    },
    #[error("sampling frequency must be positive and finite, got {0}")]
    InvalidSamplingFrequency(f64),
    #[error("window width must be positive, got {0} s")]
    NonPositiveWindow(f64),
    #[error("window of {window} samples exceeds signal length of {signal_len} samples")]
    WindowExceedsSignal { window: usize, signal_len: usize },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::MismatchedAnnotations { .. } | ScanError::UnsortedAnnotations { .. } => {
                ErrorKind::InvalidInput
            }
            ScanError::InvalidSamplingFrequency(_)
            | ScanError::NonPositiveWindow(_)
            | ScanError::WindowExceedsSignal { .. } => ErrorKind::DegenerateConfiguration,
        }
    }
}

pub(crate) fn check_sampling_frequency(fs: f64) -> Result<(), ScanError> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(ScanError::InvalidSamplingFrequency(fs))
    }
}
