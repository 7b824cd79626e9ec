//! Clock and frame-driving utilities for timed runs.
//!
//! Every run is anchored to a monotonic epoch recorded when the session
//! clock starts. This module provides:
//! - The session clock (milliseconds since epoch)
//! - The frame driver that owns start/stop/expiry transitions
//! - A pacer converting a target refresh rate into a frame interval

use std::time::Duration;

use tokio::time::Instant;

/// A session clock that provides monotonic milliseconds relative to
/// a fixed epoch.
///
/// Built on `tokio::time::Instant` so that paused test runtimes advance it.
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the clock started.
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// The instant corresponding to a millisecond offset from the epoch.
    pub fn instant_at(&self, ms: f64) -> Instant {
        self.epoch + Duration::from_secs_f64(ms.max(0.0) / 1000.0)
    }
}

/// Lifecycle of a frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Created but not started.
    Idle,
    /// Delivering frames.
    Running,
    /// Duration elapsed or the run reached its attempt bound.
    Completed,
    /// Halted externally before completion.
    Stopped,
}

/// Readout for one delivered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// 1-based frame counter.
    pub frame: u64,
    /// Milliseconds since `start`.
    pub elapsed_ms: f64,
    /// Milliseconds until the duration expires, never negative.
    pub remaining_ms: f64,
    /// True on the single frame that observed completion.
    pub completed: bool,
}

/// Drives a best-effort frame loop for one run.
///
/// Frame intervals may vary freely. Completion is signalled exactly once,
/// either by the frame that observes `remaining_ms <= 0` or by the deadline
/// timer calling [`FrameDriver::complete`], whichever comes first.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    start_ms: f64,
    duration_ms: f64,
    frame: u64,
    completed_at_ms: Option<f64>,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Idle,
            start_ms: 0.0,
            duration_ms: 0.0,
            frame: 0,
            completed_at_ms: None,
        }
    }

    /// Begin delivering frames. The terminal transition is due at
    /// `now_ms + duration_ms`.
    pub fn start(&mut self, duration_ms: f64, now_ms: f64) {
        self.state = DriverState::Running;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms.max(0.0);
        self.frame = 0;
        self.completed_at_ms = None;
    }

    /// Advance one frame. Returns `None` once the driver is not running.
    pub fn tick(&mut self, now_ms: f64) -> Option<FrameTick> {
        if self.state != DriverState::Running {
            return None;
        }

        self.frame += 1;
        let elapsed_ms = self.elapsed_ms(now_ms);
        let remaining_ms = (self.duration_ms - elapsed_ms).max(0.0);
        let completed = remaining_ms <= 0.0 && self.complete(now_ms);

        Some(FrameTick {
            frame: self.frame,
            elapsed_ms,
            remaining_ms,
            completed,
        })
    }

    /// Mark the run complete. Returns true only for the call that performed
    /// the transition.
    pub fn complete(&mut self, now_ms: f64) -> bool {
        if self.state != DriverState::Running {
            return false;
        }
        self.state = DriverState::Completed;
        self.completed_at_ms = Some(now_ms);
        true
    }

    /// Halt further frames. Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.state == DriverState::Running || self.state == DriverState::Idle {
            self.state = DriverState::Stopped;
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Milliseconds since start, never negative.
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.start_ms).max(0.0)
    }

    /// Absolute time (clock milliseconds) at which the duration expires.
    pub fn deadline_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    pub fn completed_at_ms(&self) -> Option<f64> {
        self.completed_at_ms
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }
}

/// Frame pacing for a target refresh rate.
#[derive(Debug)]
pub struct FramePacer {
    target_interval_ms: f64,
    last_tick_ms: Option<f64>,
}

impl FramePacer {
    /// Create a pacer targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ms: 1000.0 / target_hz.max(1) as f64,
            last_tick_ms: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now_ms: f64) -> bool {
        match self.last_tick_ms {
            None => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            Some(last) if now_ms >= last + self.target_interval_ms => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Target interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.target_interval_ms
    }

    /// Target interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.target_interval_ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_clock_advances_with_runtime_time() {
        let clock = SessionClock::start();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!((clock.now_ms() - 250.0).abs() < 1.0);
    }

    #[test]
    fn test_driver_reports_elapsed_and_remaining() {
        let mut driver = FrameDriver::new();
        driver.start(1000.0, 500.0);

        let tick = driver.tick(516.0).unwrap();
        assert_eq!(tick.frame, 1);
        assert!((tick.elapsed_ms - 16.0).abs() < 1e-9);
        assert!((tick.remaining_ms - 984.0).abs() < 1e-9);
        assert!(!tick.completed);
    }

    #[test]
    fn test_driver_tolerates_irregular_frames() {
        let mut driver = FrameDriver::new();
        driver.start(100.0, 0.0);
        assert!(!driver.tick(5.0).unwrap().completed);
        assert!(!driver.tick(71.0).unwrap().completed);
        let last = driver.tick(140.0).unwrap();
        assert!(last.completed);
        assert_eq!(last.remaining_ms, 0.0);
    }

    #[test]
    fn test_driver_completes_exactly_once() {
        let mut driver = FrameDriver::new();
        driver.start(50.0, 0.0);

        let tick = driver.tick(60.0).unwrap();
        assert!(tick.completed);
        assert_eq!(driver.state(), DriverState::Completed);
        assert!(driver.tick(70.0).is_none());
        assert!(!driver.complete(80.0));
        assert_eq!(driver.completed_at_ms(), Some(60.0));
    }

    #[test]
    fn test_timer_completion_beats_missed_frames() {
        let mut driver = FrameDriver::new();
        driver.start(50.0, 0.0);
        // No frame was delivered near the deadline; the timer fires instead.
        assert!(driver.complete(50.0));
        assert!(driver.tick(200.0).is_none());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut driver = FrameDriver::new();
        driver.start(1000.0, 0.0);
        driver.stop();
        driver.stop();
        assert_eq!(driver.state(), DriverState::Stopped);
        assert!(driver.tick(10.0).is_none());
        assert!(!driver.complete(10.0));
    }

    #[test]
    fn test_stop_after_completion_keeps_completed() {
        let mut driver = FrameDriver::new();
        driver.start(10.0, 0.0);
        assert!(driver.tick(20.0).unwrap().completed);
        driver.stop();
        assert_eq!(driver.state(), DriverState::Completed);
    }

    #[test]
    fn test_frame_pacer() {
        let mut pacer = FramePacer::new(60);
        assert!(pacer.should_tick(0.0)); // first tick always fires
        assert!(!pacer.should_tick(1.0)); // 1ms later, too soon
        assert!(pacer.should_tick(17.0)); // ~17ms later, should fire (60Hz ~ 16.67ms)
        assert_eq!(pacer.interval().as_millis(), 16);
    }
}
