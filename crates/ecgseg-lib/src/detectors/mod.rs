pub mod af;
pub mod ecg;
pub mod peaks;
