//! Behavioural events classified from the sample stream.
//!
//! Events are produced at most once per qualifying sample and never mutated
//! afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;
use crate::sample::TimestampMs;

/// Stable identity of a target within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Why a target counted as a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissCause {
    /// Lifetime elapsed before the target was clicked.
    Expired,
    /// Run ended with the target still active.
    RunEnded,
}

/// A classified behavioural event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    /// Session clock time of the triggering sample.
    #[serde(rename = "t")]
    pub timestamp_ms: TimestampMs,

    /// Pointer position of the triggering sample.
    pub position: Point2D,

    /// Target the event refers to, if any.
    pub target: Option<TargetId>,

    /// The event payload.
    #[serde(flatten)]
    pub kind: ClassifiedKind,
}

/// Discriminated union of classified events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifiedKind {
    /// Time accumulated on target since the previous observation.
    DwellTick { dwell_ms: f64 },

    /// On-target identity changed between two live targets.
    TargetSwitch { from: TargetId },

    /// Pointer approached then receded past the target.
    Overshoot { distance: f64, window_min: f64 },

    /// Pointer decelerated before reaching the target.
    Undershoot { distance: f64, velocity_px_s: f64 },

    /// Sudden velocity change relative to the recent window.
    Correction {
        velocity_px_s: f64,
        delta_px_s: f64,
        window_mean_px_s: f64,
    },

    /// Target clicked.
    Hit { reaction_ms: f64 },

    /// Target lost without being clicked.
    Miss { cause: MissCause },
}

impl ClassifiedEvent {
    pub fn new(
        timestamp_ms: TimestampMs,
        position: Point2D,
        target: Option<TargetId>,
        kind: ClassifiedKind,
    ) -> Self {
        Self {
            timestamp_ms,
            position,
            target,
            kind,
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, ClassifiedKind::TargetSwitch { .. })
    }

    pub fn is_overshoot(&self) -> bool {
        matches!(self.kind, ClassifiedKind::Overshoot { .. })
    }

    pub fn is_undershoot(&self) -> bool {
        matches!(self.kind, ClassifiedKind::Undershoot { .. })
    }

    pub fn is_correction(&self) -> bool {
        matches!(self.kind, ClassifiedKind::Correction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ClassifiedEvent::new(
            250.0,
            Point2D::new(10.0, 20.0),
            Some(TargetId(3)),
            ClassifiedKind::TargetSwitch { from: TargetId(1) },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"target_switch\""));
        assert!(json.contains("\"from\":1"));
        assert!(json.contains("\"target\":3"));
        assert!(event.is_switch());
        assert!(!event.is_overshoot());
    }

    #[test]
    fn test_target_id_display() {
        assert_eq!(TargetId(7).to_string(), "T7");
    }
}
