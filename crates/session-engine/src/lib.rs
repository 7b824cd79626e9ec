//! AimForge Session Engine
//!
//! Runs scenarios and sequences them into batteries. Each configuration
//! gets a fresh [`Run`]; the [`Battery`] drives runs one at a time on the
//! async runtime and hands results to a [`ResultSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Battery                     │
//! │  countdown ─► Run ─► aggregate ─► submit ─►  │
//! │               │                     pause     │
//! │  ┌────────────┴───────────────────────────┐  │
//! │  │ Run                                    │  │
//! │  │  Sampler ─► Targets ─► Classifier ─►   │  │
//! │  │                          Aggregator    │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod battery;
pub mod run;
pub mod scenario;
pub mod submit;

pub use battery::{Battery, BatteryPlan, BatteryReport};
pub use run::{FlickPhase, Run, RunConfiguration};
pub use scenario::{RunBound, ScenarioDescriptor, ScenarioKind};
pub use submit::{sink_for, HttpResultSink, NullSink, ResultSink};
