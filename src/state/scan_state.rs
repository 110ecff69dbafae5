/// Scan state definitions for the crawl loop
///
/// This module defines the lifecycle states a scan session moves through.
use std::fmt;

/// Represents the current state of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    // ===== Active States =====
    /// Session record is being created; nothing fetched yet
    Starting,

    /// The loop is dispatching fetches
    Running,

    /// The loop idles between iterations; in-flight fetches may still finish
    Paused,

    // ===== Terminal States =====
    /// Frontier exhausted or page cap reached
    Completed,

    /// Cancellation was observed
    Stopped,

    /// A fatal error (persistence failure) aborted the scan
    Failed,
}

impl ScanState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Starting -> Running
    /// Running  -> Paused | Completed | Stopped | Failed
    /// Paused   -> Running | Stopped | Failed
    /// ```
    ///
    /// `Starting -> Failed` is also allowed for aborts before the first fetch.
    pub fn can_transition_to(&self, next: ScanState) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Running)
                | (Self::Starting, Self::Failed)
                | (Self::Running, Self::Paused)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Stopped)
                | (Self::Running, Self::Failed)
                | (Self::Paused, Self::Running)
                | (Self::Paused, Self::Stopped)
                | (Self::Paused, Self::Failed)
        )
    }

    /// Converts the scan state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    /// Parses a scan state from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(Self::Starting),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "stopped" => Some(Self::Stopped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible scan states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Starting,
            Self::Running,
            Self::Paused,
            Self::Completed,
            Self::Stopped,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
