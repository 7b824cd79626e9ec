//! Per-frame readout handed to pointer sources and the display layer.

use serde::{Deserialize, Serialize};

use crate::event::TargetId;
use crate::geometry::{Playfield, Point2D};

/// Hit zone of a target, relative to its centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TargetShape {
    /// Disc of the given radius.
    Circle { radius: f64 },
    /// Axis-aligned rectangle, used for head-level bands.
    Band { half_width: f64, half_height: f64 },
}

impl TargetShape {
    /// Whether `point` lies inside the zone centred at `center`.
    pub fn contains(&self, center: &Point2D, point: &Point2D) -> bool {
        match self {
            TargetShape::Circle { radius } => center.distance_to(point) <= *radius,
            TargetShape::Band {
                half_width,
                half_height,
            } => {
                (point.x - center.x).abs() <= *half_width
                    && (point.y - center.y).abs() <= *half_height
            }
        }
    }

    /// Characteristic size used for "far from target" checks: the radius
    /// of a circle or the half-height of a band.
    pub fn reach(&self) -> f64 {
        match self {
            TargetShape::Circle { radius } => *radius,
            TargetShape::Band { half_height, .. } => *half_height,
        }
    }

    /// Half extents along x and y, for boundary containment.
    pub fn half_extents(&self) -> (f64, f64) {
        match self {
            TargetShape::Circle { radius } => (*radius, *radius),
            TargetShape::Band {
                half_width,
                half_height,
            } => (*half_width, *half_height),
        }
    }
}

/// Snapshot of one active target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub id: TargetId,
    pub position: Point2D,
    #[serde(flatten)]
    pub shape: TargetShape,
    /// Velocity in pixels per second.
    pub velocity: Point2D,
}

/// Everything a player (or a synthetic player) can observe after a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    pub run_index: usize,
    pub now_ms: f64,
    pub elapsed_ms: f64,
    pub remaining_ms: f64,
    pub playfield: Playfield,
    pub targets: Vec<TargetView>,
    /// Target the scenario currently expects to be clicked, if it restricts
    /// the choice.
    pub objective: Option<TargetId>,
    /// Whether targets are cleared by clicking rather than by dwelling.
    pub requires_click: bool,
    /// Target under the pointer after classification.
    pub on_target: Option<TargetId>,
    pub hits: u32,
    /// Running accuracy estimate for display.
    pub live_accuracy: f64,
    pub completed: bool,
}

impl FrameView {
    /// An empty readout for a run that has not produced a frame yet.
    pub fn idle(run_index: usize, playfield: Playfield) -> Self {
        Self {
            run_index,
            now_ms: 0.0,
            elapsed_ms: 0.0,
            remaining_ms: 0.0,
            playfield,
            targets: Vec::new(),
            objective: None,
            requires_click: false,
            on_target: None,
            hits: 0,
            live_accuracy: 0.0,
            completed: false,
        }
    }

    pub fn target(&self, id: TargetId) -> Option<&TargetView> {
        self.targets.iter().find(|t| t.id == id)
    }
}
