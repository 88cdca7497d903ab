//! erp-browser - Scoped headless browser with session restore and response capture.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod browser;
pub mod error;
pub mod network;

pub use browser::{with_browser, BrowserScope, SessionConfig, StorageState, Viewport};
pub use error::BrowserError;
pub use network::{CaptureFilter, CapturedResponse, ResponseCapture};

/// Re-exported so callers can hold pages without naming the CDP crate.
pub use chromiumoxide::Page;
