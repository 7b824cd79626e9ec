//! AimForge Scoring Core
//!
//! Turns a run's sample stream into behavioural events and scores:
//! - **Targets:** Bouncing, sweeping, grid-spawned and flick-pair targets
//! - **Classifier:** Dwell, switches, overshoot, undershoot, corrections
//! - **Metrics:** Accuracy, consistency, smoothness and rate reductions
//! - **Weights:** Per-scenario composite score tables
//!
//! This crate is pure computation: no I/O, no timers. All inputs are data;
//! all outputs are data.

pub mod classifier;
pub mod metrics;
pub mod targets;
pub mod weights;

pub use classifier::{Classification, ClassifierConfig, EventClassifier, Observation};
pub use metrics::{MetricAggregator, MetricSummary, ScoringMode, SummaryContext};
pub use targets::{Target, TargetField, TargetLayout, TargetRole};
pub use weights::{ScoreFactor, WeightTable};
