//! AimForge Run Model
//!
//! Defines the core data contracts shared by every stage of a run:
//! - **Geometry:** Playfield bounds and pixel-space points
//! - **Samples:** Timestamped pointer observations and derived velocities
//! - **Events:** Behavioural events classified from the sample stream
//! - **Frames:** Per-frame readout of targets and run progress
//! - **Results:** Per-run aggregates and the submission payload
//! - **Setup:** The persisted record that seeds a battery
//! - **Conversion:** Sensitivity to distance-per-360 lookups
//!
//! All coordinates are playfield pixels, all times are milliseconds.

pub mod conversion;
pub mod event;
pub mod frame;
pub mod geometry;
pub mod result;
pub mod sample;
pub mod setup;

pub use conversion::*;
pub use event::*;
pub use frame::*;
pub use geometry::*;
pub use result::*;
pub use sample::*;
pub use setup::*;
