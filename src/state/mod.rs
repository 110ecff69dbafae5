//! State module for tracking scan progress
//!
//! `ScanState` is the lifecycle of one scan session:
//! `Starting -> Running <-> Paused -> (Completed | Stopped | Failed)`.

mod scan_state;

pub use scan_state::ScanState;
