//! Playfield geometry.
//!
//! Coordinates are pixels with `(0, 0)` at the top-left of the playfield.

use serde::{Deserialize, Serialize};

/// A point in playfield pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Offset by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Point2D {
        Point2D::new(self.x + dx, self.y + dy)
    }
}

/// Canvas bounds supplied by the hosting surface at run start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
}

impl Playfield {
    /// Create a playfield. Non-finite or negative sizes collapse to zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
        }
    }

    /// Clamp a point into the playfield. Non-finite coordinates land on 0.
    pub fn clamp(&self, point: Point2D) -> Point2D {
        Point2D::new(
            clamp_axis(point.x, 0.0, self.width),
            clamp_axis(point.y, 0.0, self.height),
        )
    }

    /// Clamp a point so that a shape extending `margin_x`/`margin_y` around
    /// it stays inside. Falls back to the centre line when the shape is wider
    /// than the playfield.
    pub fn clamp_with_margin(&self, point: Point2D, margin_x: f64, margin_y: f64) -> Point2D {
        let x = if 2.0 * margin_x >= self.width {
            self.width / 2.0
        } else {
            clamp_axis(point.x, margin_x, self.width - margin_x)
        };
        let y = if 2.0 * margin_y >= self.height {
            self.height / 2.0
        } else {
            clamp_axis(point.y, margin_y, self.height - margin_y)
        };
        Point2D::new(x, y)
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

fn sanitize_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}
