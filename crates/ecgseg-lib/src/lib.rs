//! Windowed segmentation and labelling of annotated ECG recordings, plus a
//! peak-based atrial fibrillation episode detector.

pub mod annotations;
pub mod classify;
pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod scan;
pub mod signal;

#[cfg(test)]
mod synth;

pub use annotations::*;
pub use classify::*;
pub use config::*;
pub use error::*;
pub use scan::*;
pub use signal::*;
