//! Browser control module.

pub mod session;
pub mod storage_state;

pub use session::{with_browser, BrowserScope, SessionConfig, Viewport};
pub use storage_state::StorageState;
