//! Input buffering between frames.
//!
//! Events arriving between two frames are drained together. Within a frame
//! all pointer moves are handled before any click, each class keeping its
//! arrival order, so a click always sees the pointer position the player
//! had reached.

use std::collections::VecDeque;

use aimforge_run_model::sample::InputEvent;

/// Input collected for one frame, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    pub moves: Vec<InputEvent>,
    pub clicks: Vec<InputEvent>,
}

impl FrameInput {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.clicks.is_empty()
    }
}

/// FIFO of raw input awaiting the next frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    moves: VecDeque<InputEvent>,
    clicks: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        if event.is_move() {
            self.moves.push_back(event);
        } else {
            self.clicks.push_back(event);
        }
    }

    /// Take everything queued since the previous frame.
    pub fn drain_frame(&mut self) -> FrameInput {
        FrameInput {
            moves: self.moves.drain(..).collect(),
            clicks: self.clicks.drain(..).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len() + self.clicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.clicks.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.clicks.clear();
    }
}

impl Extend<InputEvent> for InputQueue {
    fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_drain_before_clicks() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::click(5.0, 1.0, 1.0));
        queue.push(InputEvent::pointer(6.0, 2.0, 2.0));
        queue.push(InputEvent::click(7.0, 3.0, 3.0));
        queue.push(InputEvent::pointer(8.0, 4.0, 4.0));
        assert_eq!(queue.len(), 4);

        let frame = queue.drain_frame();
        assert_eq!(
            frame.moves,
            vec![
                InputEvent::pointer(6.0, 2.0, 2.0),
                InputEvent::pointer(8.0, 4.0, 4.0)
            ]
        );
        assert_eq!(
            frame.clicks,
            vec![
                InputEvent::click(5.0, 1.0, 1.0),
                InputEvent::click(7.0, 3.0, 3.0)
            ]
        );
        assert!(queue.is_empty());
        assert!(queue.drain_frame().is_empty());
    }

    #[test]
    fn test_clear_discards_pending_input() {
        let mut queue = InputQueue::new();
        queue.extend([InputEvent::pointer(1.0, 0.0, 0.0), InputEvent::click(2.0, 0.0, 0.0)]);
        queue.clear();
        assert!(queue.is_empty());
    }
}
