//! Status classification
//!
//! Pure mapping from a raw detection outcome to the presentation status shown
//! on the camera grid and detection feed. Fail-open: anything unrecognized is
//! "unknown", never an error.

use serde::{Deserialize, Serialize};

/// UI-facing classification, distinct from the raw backend outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationStatus {
    Monitoring,
    Allowed,
    Blocked,
    Unknown,
    Stopped,
}

/// Classify a raw outcome.
///
/// `outcome` is the wire status of the most recent detection, or `None` when
/// no detection applies (feed inactive / nothing seen yet). `live` reflects
/// whether the camera's stream is up.
pub fn classify(outcome: Option<&str>, live: bool) -> PresentationStatus {
    match outcome {
        Some("allowed") => PresentationStatus::Allowed,
        Some("blocked") => PresentationStatus::Blocked,
        Some("unknown") => PresentationStatus::Unknown,
        Some(_) => PresentationStatus::Unknown,
        None if live => PresentationStatus::Monitoring,
        None => PresentationStatus::Stopped,
    }
}

/// Stable ordering for display grouping only. Feed ordering is strictly by
/// timestamp and never consults this.
pub fn display_priority(status: PresentationStatus) -> u8 {
    match status {
        PresentationStatus::Blocked => 0,
        PresentationStatus::Unknown => 1,
        PresentationStatus::Allowed => 2,
        PresentationStatus::Monitoring => 3,
        PresentationStatus::Stopped => 4,
    }
}
