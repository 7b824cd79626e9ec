//! AimForge Input Tracker
//!
//! Turns raw pointer input into the run's sample stream:
//!
//! - **Sampler:** clamps positions, timestamps samples, derives velocity
//! - **Queue:** buffers input between frames with a fixed drain order
//! - **Sources:** pluggable producers of input (synthetic player, replay)
//! - **Writer:** append-only JSONL telemetry export
//!
//! The hosting surface adapts its native pointer events into
//! [`InputEvent`]s; nothing here touches a window system.

pub mod queue;
pub mod sampler;
pub mod sources;
pub mod writer;

use aimforge_run_model::frame::FrameView;
use aimforge_run_model::sample::InputEvent;

pub use queue::{FrameInput, InputQueue};
pub use sampler::PointerSampler;

/// Parameters a pointer source needs when a new run begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunContext {
    /// Position of the run within its battery.
    pub run_index: usize,
    /// Effective sensitivity relative to the base configuration.
    pub gain: f64,
}

/// Trait for producers of pointer input.
pub trait PointerSource: Send {
    /// Input produced since the previous frame, given the latest readout.
    fn poll(&mut self, view: &FrameView) -> Vec<InputEvent>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Prepare for a new run.
    fn begin_run(&mut self, _context: RunContext) {}
}
