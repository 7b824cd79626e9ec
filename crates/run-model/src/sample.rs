//! Pointer samples and raw input events.
//!
//! Samples are recorded in insertion order for the lifetime of one run and
//! can be exported as JSONL (one JSON object per line) for offline analysis.

use serde::{Deserialize, Serialize};

use crate::geometry::{Playfield, Point2D};

/// Milliseconds on the session clock.
pub type TimestampMs = f64;

/// One pointer observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Pointer position after clamping to the playfield.
    #[serde(flatten)]
    pub position: Point2D,

    /// Session clock time of the observation.
    #[serde(rename = "t")]
    pub timestamp_ms: TimestampMs,

    /// Milliseconds since the run started.
    #[serde(rename = "dt")]
    pub elapsed_ms: f64,
}

/// Instantaneous pointer speed derived from two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    /// Speed in pixels per second. Always finite and non-negative.
    pub velocity_px_s: f64,

    /// Milliseconds since the run started.
    pub timestamp_ms: f64,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Raw input delivered by the hosting surface, queued until the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer moved to an absolute playfield position.
    PointerMove {
        x: f64,
        y: f64,
        #[serde(rename = "t")]
        timestamp_ms: TimestampMs,
    },

    /// Button pressed at a playfield position.
    Click {
        button: MouseButton,
        x: f64,
        y: f64,
        #[serde(rename = "t")]
        timestamp_ms: TimestampMs,
    },
}

impl InputEvent {
    /// Create a pointer-move event.
    pub fn pointer(timestamp_ms: TimestampMs, x: f64, y: f64) -> Self {
        Self::PointerMove { x, y, timestamp_ms }
    }

    /// Create a left-click event.
    pub fn click(timestamp_ms: TimestampMs, x: f64, y: f64) -> Self {
        Self::Click {
            button: MouseButton::Left,
            x,
            y,
            timestamp_ms,
        }
    }

    pub fn timestamp_ms(&self) -> TimestampMs {
        match self {
            Self::PointerMove { timestamp_ms, .. } | Self::Click { timestamp_ms, .. } => {
                *timestamp_ms
            }
        }
    }

    pub fn position(&self) -> Point2D {
        match self {
            Self::PointerMove { x, y, .. } | Self::Click { x, y, .. } => Point2D::new(*x, *y),
        }
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Self::PointerMove { .. })
    }
}

/// Header written as the first (comment) line of a telemetry export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Scenario test type (e.g., "tracking").
    pub test_type: String,

    /// Index of the run within its battery.
    pub run_index: usize,

    /// Wall-clock time at run start (ISO 8601).
    pub started_at: String,

    /// Playfield dimensions in pixels.
    pub playfield: Playfield,

    /// DPI and sensitivity in effect for the run.
    pub dpi: f64,
    pub sensitivity: f64,
}

/// Parse samples from JSONL content, skipping blank and `#` comment lines.
pub fn parse_samples(jsonl: &str) -> Result<Vec<Sample>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize samples to JSONL format.
pub fn serialize_samples(samples: &[Sample]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for sample in samples {
        output.push_str(&serde_json::to_string(sample)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_json_format() {
        let sample = Sample {
            position: Point2D::new(120.5, 64.0),
            timestamp_ms: 1016.0,
            elapsed_ms: 16.0,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"x\":120.5"));
        assert!(json.contains("\"y\":64.0"));
        assert!(json.contains("\"t\":1016.0"));
        assert!(json.contains("\"dt\":16.0"));
    }

    #[test]
    fn test_parse_samples_skips_header_comment() {
        let jsonl = "# {\"schema_version\":\"1.0\"}\n{\"x\":1.0,\"y\":2.0,\"t\":3.0,\"dt\":0.0}\n\n";
        let parsed = parse_samples(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].position, Point2D::new(1.0, 2.0));
    }

    #[test]
    fn test_input_event_tagging() {
        let event = InputEvent::click(10.0, 5.0, 6.0);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"click\""));
        assert!(json.contains("\"button\":\"left\""));

        let parsed: InputEvent =
            serde_json::from_str(r#"{"type":"pointer_move","x":1.0,"y":2.0,"t":3.0}"#).unwrap();
        assert_eq!(parsed, InputEvent::pointer(3.0, 1.0, 2.0));
        assert!(parsed.is_move());
        assert_eq!(parsed.position(), Point2D::new(1.0, 2.0));
    }
}
