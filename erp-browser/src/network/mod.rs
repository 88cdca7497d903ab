//! Network response capture.

pub mod monitor;

pub use monitor::{CaptureFilter, CapturedResponse, ResponseCapture};
