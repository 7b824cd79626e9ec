//! Pointer source implementations.
//!
//! Each source produces [`InputEvent`]s for the frame loop. Real surfaces
//! adapt their native events; these sources drive runs without one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use aimforge_run_model::event::TargetId;
use aimforge_run_model::frame::{FrameView, TargetView};
use aimforge_run_model::geometry::Point2D;
use aimforge_run_model::sample::InputEvent;

use crate::{PointerSource, RunContext};

/// Frame length the per-frame gains below are expressed against.
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Tuning for the synthetic player.
#[derive(Debug, Clone)]
pub struct AimBotConfig {
    pub seed: u64,
    /// Delay between a new objective appearing and the first movement.
    pub reaction_ms: f64,
    pub reaction_jitter_ms: f64,
    /// Share of the distance the ballistic flick covers at gain 1.0.
    pub flick_fraction: f64,
    /// Frames the ballistic flick is spread over.
    pub flick_frames: u32,
    /// Share of the remaining error removed per reference frame afterwards.
    pub correction_gain: f64,
    /// Seconds of target velocity to lead while tracking.
    pub tracking_lead_secs: f64,
    /// Hand tremor in pixels at gain 1.0.
    pub noise_px: f64,
    /// Pointer moves emitted per frame.
    pub moves_per_frame: u32,
}

impl Default for AimBotConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            reaction_ms: 180.0,
            reaction_jitter_ms: 60.0,
            flick_fraction: 0.97,
            flick_frames: 4,
            correction_gain: 0.3,
            tracking_lead_secs: 0.05,
            noise_px: 1.2,
            moves_per_frame: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FlickPlan {
    destination: Point2D,
    frames_left: u32,
}

/// Synthetic player that aims at the scenario's objective (or the nearest
/// target) with a human-like reaction delay, a ballistic flick and
/// proportional corrections.
///
/// The per-run gain models a sensitivity change: gains above 1.0 overshoot
/// the flick and jitter more, gains below 1.0 fall short.
pub struct AimBot {
    config: AimBotConfig,
    rng: StdRng,
    gain: f64,
    position: Option<Point2D>,
    last_now_ms: Option<f64>,
    objective: Option<TargetId>,
    acquire_at_ms: f64,
    flick: Option<FlickPlan>,
    flicked: bool,
    clicked: Option<TargetId>,
}

impl AimBot {
    pub fn new(config: AimBotConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            gain: 1.0,
            position: None,
            last_now_ms: None,
            objective: None,
            acquire_at_ms: 0.0,
            flick: None,
            flicked: false,
            clicked: None,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(AimBotConfig {
            seed,
            ..AimBotConfig::default()
        })
    }

    fn pick_goal<'a>(&self, view: &'a FrameView, position: Point2D) -> Option<&'a TargetView> {
        if let Some(id) = view.objective {
            return view.target(id);
        }
        view.targets.iter().min_by(|a, b| {
            position
                .distance_to(&a.position)
                .total_cmp(&position.distance_to(&b.position))
        })
    }

    fn jitter(&mut self) -> (f64, f64) {
        let amplitude = self.config.noise_px * (1.0 + (self.gain - 1.0).abs() * 3.0);
        if amplitude <= 0.0 {
            return (0.0, 0.0);
        }
        (
            self.rng.gen_range(-amplitude..=amplitude),
            self.rng.gen_range(-amplitude..=amplitude),
        )
    }

    fn next_position(&mut self, view: &FrameView, goal: &TargetView, from: Point2D, dt: f64) -> Point2D {
        let frames = (dt / REFERENCE_FRAME_MS).max(0.0);

        if view.requires_click {
            if !self.flicked {
                let fraction = self.config.flick_fraction * self.gain;
                self.flick = Some(FlickPlan {
                    destination: Point2D::new(
                        from.x + (goal.position.x - from.x) * fraction,
                        from.y + (goal.position.y - from.y) * fraction,
                    ),
                    frames_left: self.config.flick_frames.max(1),
                });
                self.flicked = true;
            }

            if let Some(mut plan) = self.flick.take() {
                let share = 1.0 / plan.frames_left as f64;
                let next = Point2D::new(
                    from.x + (plan.destination.x - from.x) * share,
                    from.y + (plan.destination.y - from.y) * share,
                );
                plan.frames_left -= 1;
                if plan.frames_left > 0 {
                    self.flick = Some(plan);
                }
                return next;
            }

            let k = (self.config.correction_gain * frames).min(1.0);
            let (nx, ny) = self.jitter();
            return Point2D::new(
                from.x + (goal.position.x - from.x) * k + nx * 0.25,
                from.y + (goal.position.y - from.y) * k + ny * 0.25,
            );
        }

        let aim = goal.position.offset(
            goal.velocity.x * self.config.tracking_lead_secs,
            goal.velocity.y * self.config.tracking_lead_secs,
        );
        let k = (self.config.correction_gain * self.gain * frames).min(1.6);
        let (nx, ny) = self.jitter();
        Point2D::new(
            from.x + (aim.x - from.x) * k + nx,
            from.y + (aim.y - from.y) * k + ny,
        )
    }
}

impl PointerSource for AimBot {
    fn poll(&mut self, view: &FrameView) -> Vec<InputEvent> {
        if view.completed {
            return Vec::new();
        }

        let now = view.now_ms;
        let previous_now = self.last_now_ms.replace(now).unwrap_or(now);
        let from = *self
            .position
            .get_or_insert_with(|| view.playfield.center());

        let Some(goal) = self.pick_goal(view, from).copied() else {
            return Vec::new();
        };

        if self.objective != Some(goal.id) {
            self.objective = Some(goal.id);
            let jitter = self.config.reaction_jitter_ms;
            let delay = self.config.reaction_ms
                + if jitter > 0.0 {
                    self.rng.gen_range(-jitter..=jitter)
                } else {
                    0.0
                };
            self.acquire_at_ms = now + delay.max(0.0);
            self.flick = None;
            self.flicked = false;
        }

        if now < self.acquire_at_ms {
            return Vec::new();
        }

        let target = view
            .playfield
            .clamp(self.next_position(view, &goal, from, now - previous_now));
        self.position = Some(target);

        let steps = self.config.moves_per_frame.max(1);
        let mut events = Vec::with_capacity(steps as usize + 1);
        for step in 1..=steps {
            let share = step as f64 / steps as f64;
            events.push(InputEvent::pointer(
                previous_now + (now - previous_now) * share,
                from.x + (target.x - from.x) * share,
                from.y + (target.y - from.y) * share,
            ));
        }

        if view.requires_click
            && self.clicked != Some(goal.id)
            && goal.shape.contains(&goal.position, &target)
        {
            self.clicked = Some(goal.id);
            events.push(InputEvent::click(now, target.x, target.y));
        }

        events
    }

    fn name(&self) -> &str {
        "aim-bot"
    }

    fn begin_run(&mut self, context: RunContext) {
        self.gain = if context.gain.is_finite() && context.gain > 0.0 {
            context.gain
        } else {
            1.0
        };
        self.position = None;
        self.last_now_ms = None;
        self.objective = None;
        self.flick = None;
        self.flicked = false;
        self.clicked = None;
        tracing::debug!(run = context.run_index, gain = self.gain, "Aim bot reset");
    }
}

/// Replays a fixed list of input events by timestamp.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    events: Vec<InputEvent>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(mut events: Vec<InputEvent>) -> Self {
        events.sort_by(|a, b| a.timestamp_ms().total_cmp(&b.timestamp_ms()));
        Self { events, cursor: 0 }
    }

    /// Events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }
}

impl PointerSource for ScriptedSource {
    fn poll(&mut self, view: &FrameView) -> Vec<InputEvent> {
        let start = self.cursor;
        while self.cursor < self.events.len()
            && self.events[self.cursor].timestamp_ms() <= view.now_ms
        {
            self.cursor += 1;
        }
        self.events[start..self.cursor].to_vec()
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn begin_run(&mut self, _context: RunContext) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimforge_run_model::frame::TargetShape;
    use aimforge_run_model::geometry::Playfield;

    fn view_with_target(now_ms: f64, position: Point2D, requires_click: bool) -> FrameView {
        let mut view = FrameView::idle(0, Playfield::new(800.0, 600.0));
        view.now_ms = now_ms;
        view.requires_click = requires_click;
        view.targets.push(TargetView {
            id: TargetId(1),
            position,
            shape: TargetShape::Circle { radius: 20.0 },
            velocity: Point2D::ORIGIN,
        });
        view
    }

    #[test]
    fn test_scripted_source_releases_by_time() {
        let mut source = ScriptedSource::new(vec![
            InputEvent::pointer(30.0, 3.0, 3.0),
            InputEvent::pointer(10.0, 1.0, 1.0),
            InputEvent::click(20.0, 2.0, 2.0),
        ]);
        let mut view = FrameView::idle(0, Playfield::default());

        view.now_ms = 20.0;
        let first = source.poll(&view);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].timestamp_ms(), 10.0);
        assert_eq!(source.remaining(), 1);

        view.now_ms = 100.0;
        assert_eq!(source.poll(&view).len(), 1);
        assert!(source.poll(&view).is_empty());

        source.begin_run(RunContext {
            run_index: 1,
            gain: 1.0,
        });
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_bot_waits_for_reaction_then_clicks_target() {
        let mut bot = AimBot::new(AimBotConfig {
            reaction_jitter_ms: 0.0,
            noise_px: 0.0,
            ..AimBotConfig::default()
        });
        bot.begin_run(RunContext {
            run_index: 0,
            gain: 1.0,
        });

        let target = Point2D::new(600.0, 300.0);
        assert!(bot.poll(&view_with_target(0.0, target, true)).is_empty());
        assert!(bot.poll(&view_with_target(100.0, target, true)).is_empty());

        let mut clicks = 0;
        let mut now = 200.0;
        while now < 2000.0 {
            let events = bot.poll(&view_with_target(now, target, true));
            for event in &events {
                assert!(event.timestamp_ms() <= now);
            }
            clicks += events.iter().filter(|e| !e.is_move()).count();
            now += REFERENCE_FRAME_MS;
        }
        assert_eq!(clicks, 1, "bot should click the target exactly once");
    }

    #[test]
    fn test_bot_follows_moving_target_without_clicking() {
        let mut bot = AimBot::with_seed(3);
        bot.begin_run(RunContext {
            run_index: 0,
            gain: 1.0,
        });

        let mut last = None;
        let mut now = 0.0;
        while now < 1500.0 {
            let events = bot.poll(&view_with_target(now, Point2D::new(500.0, 200.0), false));
            assert!(events.iter().all(InputEvent::is_move));
            if let Some(event) = events.last() {
                last = Some(event.position());
            }
            now += REFERENCE_FRAME_MS;
        }
        let last = last.unwrap();
        assert!(last.distance_to(&Point2D::new(500.0, 200.0)) < 20.0);
    }
}
